use std::fmt;

use crate::schema::ColumnType;

#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Converts a raw CSV field into a value of the column's inferred type.
    /// Empty fields are `Null` regardless of the column type.
    #[must_use]
    pub fn from_raw(raw: &str, column_type: ColumnType) -> Self {
        if raw.is_empty() {
            return Self::Null;
        }

        match column_type {
            ColumnType::Integer => raw
                .trim()
                .parse()
                .map_or_else(|_| Self::Text(raw.to_string()), Self::Integer),
            ColumnType::Real => raw
                .trim()
                .parse()
                .map_or_else(|_| Self::Text(raw.to_string()), Self::Real),
            ColumnType::Text => Self::Text(raw.to_string()),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Binds the value at the 1-based parameter `pos` of `statement`.
    ///
    /// # Errors
    ///
    /// When `pos` is out of range for the statement.
    pub fn bind_to(&self, statement: &mut sqlite::Statement, pos: usize) -> sqlite::Result<()> {
        match self {
            Self::Null => statement.bind((pos, ())),
            Self::Integer(v) => statement.bind((pos, *v)),
            Self::Real(v) => statement.bind((pos, *v)),
            Self::Text(v) => statement.bind((pos, v.as_str())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(v) => write!(f, "{v}"),
            // Debug keeps the fraction ("1.0"), so the column reloads as real.
            Self::Real(v) => write!(f, "{v:?}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_raw() {
        assert_eq!(Value::Integer(42), Value::from_raw("42", ColumnType::Integer));
        assert_eq!(Value::Real(2.5), Value::from_raw("2.5", ColumnType::Real));
        assert_eq!(Value::Real(3.0), Value::from_raw("3", ColumnType::Real));
        assert_eq!(
            Value::Text("42".into()),
            Value::from_raw("42", ColumnType::Text)
        );
        assert_eq!(Value::Null, Value::from_raw("", ColumnType::Integer));
        assert_eq!(Value::Null, Value::from_raw("", ColumnType::Text));
    }

    #[test]
    fn test_display() {
        assert_eq!("", Value::Null.to_string());
        assert_eq!("-7", Value::Integer(-7).to_string());
        assert_eq!("1.0", Value::Real(1.0).to_string());
        assert_eq!("0.25", Value::Real(0.25).to_string());
        assert_eq!("GP", Value::Text("GP".into()).to_string());
    }

    #[test]
    fn test_bind_to() {
        let connection = sqlite::open(":memory:").unwrap();
        let mut statement = connection.prepare("SELECT typeof(?), typeof(?);").unwrap();
        Value::Real(0.5).bind_to(&mut statement, 1).unwrap();
        Value::Null.bind_to(&mut statement, 2).unwrap();
        assert!(Value::Integer(1).bind_to(&mut statement, 3).is_err());

        statement.next().unwrap();
        assert_eq!("real", statement.read::<String, usize>(0).unwrap());
        assert_eq!("null", statement.read::<String, usize>(1).unwrap());
    }

    #[test]
    fn test_as_text() {
        assert_eq!(Some("yes"), Value::from("yes").as_text());
        assert_eq!(None, Value::Integer(1).as_text());
        assert!(Value::Null.is_null());
    }
}
