use std::{fs, path::PathBuf};

use anyhow::Context;
use csvdb::{common::Error, database::Database};

fn main() -> Result<(), Error> {
    env_logger::init();

    let folder = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("data"), PathBuf::from);

    let mut store_files: Vec<PathBuf> = fs::read_dir(&folder)
        .with_context(|| format!("Cannot read folder {}", folder.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "db"))
        .collect();
    store_files.sort();

    for store_file in store_files {
        let Some(name) = store_file.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        let database = Database::new(name, &folder)?;
        println!("{}:", database.path().display());
        for table_name in database.list_stored_tables()? {
            println!("\t{table_name}");
        }
    }

    Ok(())
}
