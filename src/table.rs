use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{
    common::{CsvDbError, Error, DEFAULT_SEPARATOR},
    database::{Database, DatabaseRef},
    frame::Frame,
    normalize::NormaliseMap,
    value::Value,
};

/// What the pipeline needs from a CSV backed table.
pub trait DbTable {
    /// (Re)reads the source CSV, dropping any assigned index.
    ///
    /// # Errors
    ///
    /// `CsvDbError::Parse` on a missing or malformed file.
    fn load(&mut self, separator: u8) -> Result<(), Error>;

    /// Promotes the index label column to the row identifier, or creates it.
    ///
    /// # Errors
    ///
    /// When no label is set or the identifiers are not unique.
    fn assign_index(&mut self) -> Result<(), Error>;

    /// Writes the table, index included, back to its source CSV.
    ///
    /// # Errors
    ///
    /// On file operations.
    fn save(&self, separator: u8) -> Result<(), Error>;

    /// Hands the table over to `database`, which stores it.
    ///
    /// # Errors
    ///
    /// On store failures.
    fn register_with(self, database: &mut Database) -> Result<(), Error>;
}

#[derive(Debug)]
pub struct Table {
    pub(crate) name: String,
    pub(crate) database_name: String,
    pub(crate) database: Option<DatabaseRef>,
    source_path: PathBuf,
    index_label: Option<String>,
    assigned_index: Option<Vec<Value>>,
    frame: Frame,
}

impl Table {
    /// Creates the table and loads its CSV right away.
    ///
    /// # Errors
    ///
    /// `CsvDbError::Parse` on a missing or malformed file.
    pub fn new(
        name: &str,
        database_name: &str,
        source_path: &Path,
        separator: u8,
    ) -> Result<Self, Error> {
        let mut table = Self {
            name: name.to_string(),
            database_name: database_name.to_string(),
            database: None,
            source_path: source_path.to_path_buf(),
            index_label: None,
            assigned_index: None,
            frame: Frame::default(),
        };
        table.load(separator)?;
        Ok(table)
    }

    /// # Errors
    ///
    /// `CsvDbError::Parse` on a missing or malformed file.
    pub fn open(name: &str, database_name: &str, source_path: &Path) -> Result<Self, Error> {
        Self::new(name, database_name, source_path, DEFAULT_SEPARATOR)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Composite `{database}_{table}` key, as in the file name.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}_{}", self.database_name, self.name)
    }

    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    #[must_use]
    pub const fn database(&self) -> Option<&DatabaseRef> {
        self.database.as_ref()
    }

    #[must_use]
    pub const fn frame(&self) -> &Frame {
        &self.frame
    }

    #[must_use]
    pub fn index_label(&self) -> Option<&str> {
        self.index_label.as_deref()
    }

    pub fn set_index_label(&mut self, label: &str) -> &mut Self {
        self.index_label = Some(label.to_string());
        self
    }

    /// Identifiers used by `assign_index` when the label is not a column.
    ///
    /// # Errors
    ///
    /// When the length differs from the row count.
    pub fn with_assigned_index(&mut self, index: Vec<Value>) -> Result<&mut Self, CsvDbError> {
        if index.len() != self.frame.row_count() {
            return Err(CsvDbError::IndexLengthMismatch {
                table: self.name.clone(),
                expected: self.frame.row_count(),
                actual: index.len(),
            });
        }
        self.assigned_index = Some(index);
        Ok(self)
    }

    #[must_use]
    pub fn assigned_index(&self) -> Option<&[Value]> {
        self.assigned_index.as_deref()
    }

    /// # Errors
    ///
    /// On file operations.
    pub fn save_to(&self, path: &Path, separator: u8) -> Result<(), Error> {
        self.frame.write_csv(path, separator)?;
        info!("Saved table {} to {}", self.name, path.display());
        Ok(())
    }

    pub fn normalize(&mut self, map: &impl NormaliseMap) -> &mut Self {
        self.frame
            .map_values(|value, column| map.normalise(value, column));
        debug!("Normalised table {}", self.name);
        self
    }

    fn check_index_values(&self, label: &str) -> Result<(), CsvDbError> {
        let Some((_, values)) = self.frame.index() else {
            return Err(CsvDbError::MissingIndex(self.name.clone()));
        };

        let mut seen = HashSet::with_capacity(values.len());
        for value in values {
            if value.is_null() {
                return Err(CsvDbError::NullIndexValue {
                    table: self.name.clone(),
                    label: label.to_string(),
                });
            }
            let key = value.to_string();
            if !seen.insert(key.clone()) {
                return Err(CsvDbError::DuplicateIndexValue {
                    table: self.name.clone(),
                    label: label.to_string(),
                    value: key,
                });
            }
        }
        Ok(())
    }
}

impl DbTable for Table {
    fn load(&mut self, separator: u8) -> Result<(), Error> {
        self.frame = Frame::read_csv(&self.source_path, separator)?;
        debug!(
            "Loaded table {} ({} rows) from {}",
            self.name,
            self.frame.row_count(),
            self.source_path.display()
        );
        Ok(())
    }

    fn assign_index(&mut self) -> Result<(), Error> {
        let label = self
            .index_label
            .clone()
            .ok_or_else(|| CsvDbError::MissingIndexLabel(self.name.clone()))?;

        // Column names compare the way SQLite compares them.
        if self
            .frame
            .index_label()
            .is_some_and(|current| current.eq_ignore_ascii_case(&label))
        {
            debug!("Table {} is already indexed by {}", self.name, label);
            return Ok(());
        }

        if let Some(existing) = self.frame.find_column(&label).map(str::to_string) {
            self.frame.set_index(&existing);
            debug!("Table {} indexed by existing column {}", self.name, existing);
        } else {
            let row_count = self.frame.row_count();
            let index = self
                .assigned_index
                .get_or_insert_with(|| (0i64..).take(row_count).map(Value::Integer).collect())
                .clone();
            if index.len() != row_count {
                return Err(CsvDbError::IndexLengthMismatch {
                    table: self.name.clone(),
                    expected: row_count,
                    actual: index.len(),
                }
                .into());
            }

            self.frame.insert_column(0, &label, index)?;
            self.frame.set_index(&label);
            debug!("Table {} got new index column {}", self.name, label);
        }

        self.check_index_values(&label)?;
        Ok(())
    }

    fn save(&self, separator: u8) -> Result<(), Error> {
        self.save_to(&self.source_path, separator)
    }

    fn register_with(self, database: &mut Database) -> Result<(), Error> {
        database.register_table(self)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Table(name='{}', db_name='{}')", self.name, self.database_name)
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    fn table_from(dir: &Path, content: &str) -> Table {
        let path = dir.join("school_math.csv");
        fs::write(&path, content).unwrap();
        Table::open("math", "school", &path).unwrap()
    }

    #[test]
    fn test_new_loads_csv() {
        let dir = tempfile::tempdir().unwrap();
        let table = table_from(dir.path(), "a;b\n1;2\n3;4\n");

        assert_eq!("math", table.name());
        assert_eq!("school", table.database_name());
        assert_eq!("school_math", table.key());
        assert_eq!(2, table.frame().row_count());
        assert!(table.database().is_none());
        assert_eq!("Table(name='math', db_name='school')", table.to_string());
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Table::open("math", "school", &dir.path().join("school_math.csv")).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CsvDbError>(),
            Some(CsvDbError::Parse { .. })
        ));
    }

    #[test]
    fn test_assign_index_requires_label() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = table_from(dir.path(), "a\n1\n");

        let err = table.assign_index().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CsvDbError>(),
            Some(CsvDbError::MissingIndexLabel(_))
        ));
    }

    #[test]
    fn test_assign_index_synthesizes_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = table_from(dir.path(), "a;b\nx;1\ny;2\nz;3\n");
        table.set_index_label("MUID");

        table.assign_index().unwrap();
        table.assign_index().unwrap();

        let (label, values) = table.frame().index().unwrap();
        assert_eq!("MUID", label);
        assert_eq!(
            &[Value::Integer(0), Value::Integer(1), Value::Integer(2)][..],
            values
        );
        assert_eq!(vec!["a", "b"], table.frame().column_names().collect::<Vec<_>>());
        assert_eq!(
            vec!["MUID", "a", "b"],
            table.frame().header().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_assign_index_promotes_existing_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = table_from(dir.path(), "a;DID\nx;10\ny;20\n");
        table.set_index_label("DID");

        table.assign_index().unwrap();

        assert_eq!(
            Some(("DID", &[Value::Integer(10), Value::Integer(20)][..])),
            table.frame().index()
        );
        assert_eq!(vec!["a"], table.frame().column_names().collect::<Vec<_>>());
        assert_eq!(None, table.assigned_index());
    }

    #[test]
    fn test_assign_index_matches_column_ignoring_case() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = table_from(dir.path(), "ID;name\n7;ann\n9;bob\n");
        table.set_index_label("id");

        table.assign_index().unwrap();

        assert_eq!(
            Some(("ID", &[Value::Integer(7), Value::Integer(9)][..])),
            table.frame().index()
        );
        assert_eq!(vec!["ID", "name"], table.frame().header().collect::<Vec<_>>());

        // Already indexed under another casing.
        table.assign_index().unwrap();
        assert_eq!(2, table.frame().header().count());
    }

    #[test]
    fn test_assign_index_uses_preassigned_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = table_from(dir.path(), "a\nx\ny\n");
        table.set_index_label("id");

        assert!(table.with_assigned_index(vec![Value::Integer(7)]).is_err());
        table
            .with_assigned_index(vec![Value::Integer(7), Value::Integer(9)])
            .unwrap();
        table.assign_index().unwrap();

        assert_eq!(
            Some(("id", &[Value::Integer(7), Value::Integer(9)][..])),
            table.frame().index()
        );
    }

    #[test]
    fn test_assign_index_rejects_repeated_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = table_from(dir.path(), "a;k\nx;1\ny;1\n");
        table.set_index_label("k");

        let err = table.assign_index().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CsvDbError>(),
            Some(CsvDbError::DuplicateIndexValue { value, .. }) if value == "1"
        ));

        let mut table = table_from(dir.path(), "a;k\nx;1\ny;\n");
        table.set_index_label("k");
        let err = table.assign_index().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CsvDbError>(),
            Some(CsvDbError::NullIndexValue { .. })
        ));
    }

    #[test]
    fn test_save_then_rerun_keeps_single_index_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = table_from(dir.path(), "a;b\nx;1\ny;2\n");
        table.set_index_label("PUID");
        table.assign_index().unwrap();
        table.save(b';').unwrap();

        let written = fs::read_to_string(table.source_path()).unwrap();
        assert_eq!("PUID;a;b\n0;x;1\n1;y;2\n", written);

        // A second run finds the label as a regular column.
        table.load(b';').unwrap();
        assert_eq!(None, table.frame().index_label());
        table.assign_index().unwrap();
        assert_eq!(vec!["a", "b"], table.frame().column_names().collect::<Vec<_>>());
        assert_eq!(2, table.frame().row_count());
    }

    #[test]
    fn test_normalize() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = table_from(dir.path(), "school;paid\nGP;yes\nMS;no\n");

        table.normalize(&crate::normalize::CodeTable::student_codes());

        assert_eq!(
            Some(&[Value::Integer(0), Value::Integer(1)][..]),
            table.frame().column("school")
        );
        assert_eq!(
            Some(&[Value::Integer(1), Value::Integer(0)][..]),
            table.frame().column("paid")
        );
    }
}
