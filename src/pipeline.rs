use indexmap::IndexMap;
use log::info;

use crate::{
    common::Error,
    config::Config,
    database::Database,
    generator::DatabaseGenerator,
    normalize::CodeTable,
    scanner::gather_csv_tables,
    table::{DbTable, Table},
};

/// Scans the input folder, prepares every table and stores them.
///
/// # Errors
///
/// Any error aborts the whole run; databases written before it stay.
pub fn run(config: &Config) -> Result<IndexMap<String, Database>, Error> {
    let mut tables = gather_csv_tables(&config.input_dir, config.separator)?;
    prepare_tables(&mut tables, config)?;

    let databases =
        DatabaseGenerator::new(config.storage_dir.clone()).create_from_map(tables)?;
    info!("Stored {} databases", databases.len());
    Ok(databases)
}

/// Assigns indices, rewrites the CSVs and optionally normalises values.
/// The CSVs keep the original values; only the stores see the codes.
///
/// # Errors
///
/// On index assignment, file writing or code table loading.
pub fn prepare_tables(tables: &mut IndexMap<String, Table>, config: &Config) -> Result<(), Error> {
    let code_table = if config.normalize {
        Some(match &config.normalization_map {
            Some(path) => CodeTable::from_json_file(path)?,
            None => CodeTable::student_codes(),
        })
    } else {
        None
    };

    for (key, table) in tables.iter_mut() {
        table.set_index_label(config.index_label_for(key));
        table.assign_index()?;

        if !config.skip_csv_write {
            table.save(config.separator)?;
        }

        if let Some(code_table) = &code_table {
            table.normalize(code_table);
        }
    }

    Ok(())
}
