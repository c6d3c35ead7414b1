use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::{
    common::{store_file_name, CsvDbError, Error},
    frame::Frame,
    schema::TableSchema,
    table::Table,
};

/// Identifies the database a table was registered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRef {
    pub name: String,
    pub path: PathBuf,
}

/// A named set of tables stored in `<folder>/<name>.db`.
pub struct Database {
    name: String,
    folder: PathBuf,
    path: PathBuf,
    tables: IndexMap<String, Table>,
    connection: Option<sqlite::Connection>,
}

impl Database {
    /// Creates `folder` when needed and opens (or creates) the store file.
    ///
    /// # Errors
    ///
    /// On file operations other than a concurrent folder creation.
    pub fn new(name: &str, folder: &Path) -> Result<Self, Error> {
        if !folder.is_dir() {
            match fs::create_dir_all(folder) {
                Ok(()) => info!("Created storage folder {}", folder.display()),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(err) => return Err(err.into()),
            }
        }

        let mut database = Self {
            name: name.to_string(),
            folder: folder.to_path_buf(),
            path: Self::store_path(folder, name),
            tables: IndexMap::new(),
            connection: None,
        };
        database.connect()?;
        Ok(database)
    }

    #[must_use]
    pub fn store_path(folder: &Path, name: &str) -> PathBuf {
        store_file_name(folder, name)
    }

    /// # Errors
    ///
    /// When SQLite cannot open the store file.
    pub fn connect(&mut self) -> Result<&mut Self, Error> {
        if self.connection.is_none() {
            self.connection = Some(sqlite::open(&self.path)?);
            debug!("Connected to {}", self.path.display());
        }
        Ok(self)
    }

    pub fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            debug!("Disconnected from {}", self.path.display());
        }
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn reference(&self) -> DatabaseRef {
        DatabaseRef {
            name: self.name.clone(),
            path: self.path.clone(),
        }
    }

    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    #[must_use]
    pub fn list_table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Takes ownership of `table` and rewrites its contents in the store.
    /// A table with the same name, compared ignoring ASCII case, is
    /// replaced. A failed write leaves the owned tables unchanged.
    ///
    /// # Errors
    ///
    /// When disconnected, when the table has no index, or on SQLite errors.
    pub fn register_table(&mut self, mut table: Table) -> Result<(), Error> {
        self.connection()?;
        if table.frame().index().is_none() {
            return Err(CsvDbError::MissingIndex(table.name).into());
        }

        if let Some(previous) = &table.database {
            if previous.path != self.path {
                warn!(
                    "Moving table {} from database {} to {}",
                    table.name, previous.name, self.name
                );
            }
        }
        table.database = Some(self.reference());
        table.database_name.clone_from(&self.name);

        // The owned list only changes once the store holds the new rows.
        self.write_table(&table)?;

        // SQLite table names ignore case: `Math` and `math` are one table.
        let replaced = self
            .tables
            .keys()
            .find(|name| name.eq_ignore_ascii_case(&table.name))
            .cloned();
        if let Some(replaced) = replaced {
            warn!(
                "Replacing table {} in database {} with new value",
                replaced, self.name
            );
            self.tables.shift_remove(&replaced);
        }
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    /// # Errors
    ///
    /// Stops at the first table that fails to register.
    pub fn register_tables(&mut self, tables: impl IntoIterator<Item = Table>) -> Result<(), Error> {
        for table in tables {
            self.register_table(table)?;
        }
        Ok(())
    }

    /// User tables present in the store file.
    ///
    /// # Errors
    ///
    /// When disconnected or on SQLite errors.
    pub fn list_stored_tables(&self) -> Result<Vec<String>, Error> {
        let connection = self.connection()?;
        let mut statement = connection.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name;",
        )?;

        let mut out = vec![];
        while let sqlite::State::Row = statement.next()? {
            out.push(statement.read::<String, usize>(0)?);
        }
        Ok(out)
    }

    fn connection(&self) -> Result<&sqlite::Connection, CsvDbError> {
        self.connection
            .as_ref()
            .ok_or_else(|| CsvDbError::Disconnected(self.name.clone()))
    }

    fn write_table(&self, table: &Table) -> Result<(), Error> {
        let connection = self.connection()?;
        let schema = TableSchema::from_frame(&table.name, table.frame())
            .ok_or_else(|| CsvDbError::MissingIndex(table.name.clone()))?;

        connection.execute("BEGIN;")?;
        if let Err(err) = replace_table_contents(connection, &schema, table.frame()) {
            if let Err(rollback_err) = connection.execute("ROLLBACK;") {
                warn!("Rollback of table {} failed: {}", table.name, rollback_err);
            }
            return Err(err);
        }
        connection.execute("COMMIT;")?;

        info!(
            "Stored {} rows of table {} in {}",
            table.frame().row_count(),
            table.name,
            self.path.display()
        );
        Ok(())
    }
}

fn replace_table_contents(
    connection: &sqlite::Connection,
    schema: &TableSchema,
    frame: &Frame,
) -> Result<(), Error> {
    connection.execute(schema.drop_table_sql())?;
    connection.execute(schema.create_table_sql())?;

    let mut statement = connection.prepare(schema.insert_sql())?;
    for row_idx in 0..frame.row_count() {
        statement.reset()?;
        for (pos, value) in frame.row(row_idx).enumerate() {
            value.bind_to(&mut statement, pos + 1)?;
        }
        statement.next()?;
    }
    Ok(())
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.tables.keys().map(|name| format!("'{name}'")).collect();
        write!(f, "Database(name='{}', tables=[{}])", self.name, names.join(", "))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("tables", &self.list_table_names())
            .field("connected", &self.is_connected())
            .finish()
    }
}
