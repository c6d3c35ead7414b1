//! Finds `<database>_<table>.csv` files and loads them as tables.
//!
//! Both fields must be non-empty and neither may contain another underscore,
//! so `school_math.csv` is accepted while `school_math_2023.csv` and
//! `_math.csv` are rejected with `CsvDbError::InvalidFileName`. Files that
//! do not match `*_*.csv` at all are ignored.

use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::{
    common::{CsvDbError, Error},
    table::Table,
};

const TABLE_FILE_PATTERN: &str = "*_*.csv";

/// Loads every table file of `dir`, keyed by `<database>_<table>`, in file
/// name order.
///
/// # Errors
///
/// `CsvDbError::MissingInputDir` when `dir` is not a folder, otherwise on
/// an invalid file name or a CSV that cannot be parsed.
pub fn gather_csv_tables(dir: &Path, separator: u8) -> Result<IndexMap<String, Table>, Error> {
    if !dir.is_dir() {
        return Err(CsvDbError::MissingInputDir(dir.to_path_buf()).into());
    }

    let escaped_dir = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = Path::new(&escaped_dir).join(TABLE_FILE_PATTERN);

    let mut out = IndexMap::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        let path = entry?;
        if !path.is_file() {
            debug!("Skipping {}, not a file", path.display());
            continue;
        }

        let (database_name, table_name) = split_table_file_name(&path)?;
        let table = Table::new(table_name, database_name, &path, separator)?;
        debug!("Found {} at {}", table, path.display());

        if let Some(previous) = out.insert(table.key(), table) {
            warn!("Table {} read twice, keeping the later file", previous.key());
        }
    }

    info!("Gathered {} tables from {}", out.len(), dir.display());
    Ok(out)
}

/// Splits `<database>_<table>.csv` into its two names.
///
/// # Errors
///
/// `CsvDbError::InvalidFileName` when the stem has no, more than one, or an
/// edge underscore.
pub fn split_table_file_name(path: &Path) -> Result<(&str, &str), CsvDbError> {
    let invalid = || CsvDbError::InvalidFileName(path.to_path_buf());

    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(invalid)?;
    let mut parts = stem.split('_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(database_name), Some(table_name), None)
            if !database_name.is_empty() && !table_name.is_empty() =>
        {
            Ok((database_name, table_name))
        }
        _ => Err(invalid()),
    }
}
