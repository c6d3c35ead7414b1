use std::path::{Path, PathBuf};

pub type Error = Box<dyn std::error::Error + Send + Sync>;

pub const DEFAULT_SEPARATOR: u8 = b';';

#[derive(Debug, thiserror::Error)]
pub enum CsvDbError {
    #[error("Cannot parse CSV {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Input folder {0} does not exist or is not a folder")]
    MissingInputDir(PathBuf),

    #[error("File name {0} does not follow <database>_<table>.csv")]
    InvalidFileName(PathBuf),

    #[error("Table {0} has no index label")]
    MissingIndexLabel(String),

    #[error("Table {0} has no index assigned")]
    MissingIndex(String),

    #[error("Column {0} already exists")]
    DuplicateColumn(String),

    #[error("Index of table {table} has {actual} values, table has {expected} rows")]
    IndexLengthMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Column {column} has {actual} values, frame has {expected} rows")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Index {label} of table {table} repeats value {value}")]
    DuplicateIndexValue {
        table: String,
        label: String,
        value: String,
    },

    #[error("Index {label} of table {table} contains an empty value")]
    NullIndexValue { table: String, label: String },

    #[error("Tables of database {database} live in {expected} and {found}")]
    FolderDivergence {
        database: String,
        expected: PathBuf,
        found: PathBuf,
    },

    #[error("Database {0} is disconnected")]
    Disconnected(String),

    #[error("Separator must be a single ASCII character, got {0:?}")]
    InvalidSeparator(String),
}

impl CsvDbError {
    #[must_use]
    pub fn parse(path: &Path, message: impl ToString) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

#[must_use]
pub fn store_file_name(dir: &Path, database_name: &str) -> PathBuf {
    let mut out = dir.to_path_buf();
    out.push(format!("{database_name}.db"));
    out
}
