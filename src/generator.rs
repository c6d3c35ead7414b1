use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::info;

use crate::{
    common::{CsvDbError, Error},
    database::Database,
    table::{DbTable, Table},
};

/// Builds one `Database` per distinct database name of a set of tables.
pub struct DatabaseGenerator {
    storage_dir: Option<PathBuf>,
}

impl DatabaseGenerator {
    /// With no `storage_dir` each database is stored next to its CSVs.
    #[must_use]
    pub const fn new(storage_dir: Option<PathBuf>) -> Self {
        Self { storage_dir }
    }

    /// Groups `tables` by database name and registers every table with the
    /// database of its group, in input order.
    ///
    /// # Errors
    ///
    /// `CsvDbError::FolderDivergence` when the CSVs of one group sit in
    /// different folders (only checked without a storage folder), and any
    /// database creation or registration error.
    pub fn create_from_map(
        &self,
        tables: IndexMap<String, Table>,
    ) -> Result<IndexMap<String, Database>, Error> {
        if self.storage_dir.is_none() {
            check_group_folders(tables.values())?;
        }

        let mut out: IndexMap<String, Database> = IndexMap::new();
        for table in tables.into_values() {
            let database_name = table.database_name().to_string();
            if !out.contains_key(&database_name) {
                let folder = match &self.storage_dir {
                    Some(storage_dir) => storage_dir.clone(),
                    None => source_folder(table.source_path())?,
                };
                let database = Database::new(&database_name, &folder)?;
                info!("Created database {} at {}", database_name, database.path().display());
                out.insert(database_name.clone(), database);
            }

            table.register_with(&mut out[&database_name])?;
        }

        Ok(out)
    }
}

/// All CSVs of one database group must sit in the same folder.
fn check_group_folders<'a>(tables: impl Iterator<Item = &'a Table>) -> Result<(), Error> {
    let mut out: IndexMap<String, PathBuf> = IndexMap::new();
    for table in tables {
        let folder = source_folder(table.source_path())?;
        match out.get(table.database_name()) {
            Some(expected) if expected != &folder => {
                return Err(CsvDbError::FolderDivergence {
                    database: table.database_name().to_string(),
                    expected: expected.clone(),
                    found: folder,
                }
                .into());
            }
            Some(_) => {}
            None => {
                out.insert(table.database_name().to_string(), folder);
            }
        }
    }
    Ok(())
}

fn source_folder(source_path: &Path) -> Result<PathBuf, Error> {
    let source_path = fs::canonicalize(source_path)?;
    Ok(source_path
        .parent()
        .map_or_else(PathBuf::new, Path::to_path_buf))
}
