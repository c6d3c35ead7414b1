use indexmap::IndexMap;

use crate::{frame::Frame, value::Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// Infers the narrowest type every non-empty raw field fits into.
    #[must_use]
    pub fn infer_raw<'a>(raws: impl IntoIterator<Item = &'a str>) -> Self {
        let mut out = Self::Integer;
        for raw in raws {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            if out == Self::Integer && raw.parse::<i64>().is_ok() {
                continue;
            }
            if raw.parse::<f64>().is_ok() {
                out = Self::Real;
            } else {
                return Self::Text;
            }
        }
        out
    }

    /// Same as `infer_raw` but over loaded values, which may have changed
    /// type since loading (normalisation turns text into integers).
    #[must_use]
    pub fn of_values(values: &[Value]) -> Self {
        let mut out = Self::Integer;
        for value in values {
            match value {
                Value::Null | Value::Integer(_) => {}
                Value::Real(_) => out = Self::Real,
                Value::Text(_) => return Self::Text,
            }
        }
        out
    }

    #[must_use]
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }
}

#[derive(Debug)]
pub struct TableSchema {
    pub name: String,
    pub index_label: String,
    pub fields: IndexMap<String, ColumnType>,
}

impl TableSchema {
    /// Schema of an indexed frame. The index column comes first.
    #[must_use]
    pub fn from_frame(name: &str, frame: &Frame) -> Option<Self> {
        let (index_label, index_values) = frame.index()?;

        let mut fields = IndexMap::with_capacity(frame.column_count() + 1);
        fields.insert(index_label.to_string(), ColumnType::of_values(index_values));
        for (column, values) in frame.columns() {
            fields.insert(column.clone(), ColumnType::of_values(values));
        }

        Some(Self {
            name: name.to_string(),
            index_label: index_label.to_string(),
            fields,
        })
    }

    #[must_use]
    pub fn drop_table_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {};", quote_identifier(&self.name))
    }

    #[must_use]
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .fields
            .iter()
            .map(|(field_name, field_type)| {
                let mut column =
                    format!("{} {}", quote_identifier(field_name), field_type.sql_name());
                if field_name == &self.index_label {
                    column.push_str(" PRIMARY KEY");
                }
                column
            })
            .collect();

        format!(
            "CREATE TABLE {} ({});",
            quote_identifier(&self.name),
            columns.join(", ")
        )
    }

    #[must_use]
    pub fn insert_sql(&self) -> String {
        let columns: Vec<String> = self.fields.keys().map(|f| quote_identifier(f)).collect();
        let placeholders = vec!["?"; self.fields.len()];

        format!(
            "INSERT INTO {} ({}) VALUES ({});",
            quote_identifier(&self.name),
            columns.join(", "),
            placeholders.join(", ")
        )
    }
}

#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_infer_raw() {
        assert_eq!(ColumnType::Integer, ColumnType::infer_raw(["1", "", "-3"]));
        assert_eq!(ColumnType::Real, ColumnType::infer_raw(["1", "2.5"]));
        assert_eq!(ColumnType::Real, ColumnType::infer_raw(["2.5", "1"]));
        assert_eq!(ColumnType::Text, ColumnType::infer_raw(["1", "GP", "2.5"]));
        assert_eq!(ColumnType::Integer, ColumnType::infer_raw([""]));
    }

    #[test]
    fn test_of_values() {
        assert_eq!(
            ColumnType::Integer,
            ColumnType::of_values(&[Value::Integer(1), Value::Null])
        );
        assert_eq!(
            ColumnType::Real,
            ColumnType::of_values(&[Value::Integer(1), Value::Real(0.5)])
        );
        assert_eq!(
            ColumnType::Text,
            ColumnType::of_values(&[Value::Integer(1), Value::from("x")])
        );
    }

    #[test]
    fn test_sql() {
        let schema = TableSchema {
            name: "math".into(),
            index_label: "MUID".into(),
            fields: IndexMap::from([
                ("MUID".into(), ColumnType::Integer),
                ("school".into(), ColumnType::Text),
                ("G\"1".into(), ColumnType::Real),
            ]),
        };

        assert_eq!("DROP TABLE IF EXISTS \"math\";", schema.drop_table_sql());
        assert_eq!(
            "CREATE TABLE \"math\" (\"MUID\" INTEGER PRIMARY KEY, \"school\" TEXT, \"G\"\"1\" REAL);",
            schema.create_table_sql()
        );
        assert_eq!(
            "INSERT INTO \"math\" (\"MUID\", \"school\", \"G\"\"1\") VALUES (?, ?, ?);",
            schema.insert_sql()
        );
    }
}
