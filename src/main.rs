use clap::Parser;
use log::info;

use csvdb::{common::Error, config::Config, pipeline};

fn main() -> Result<(), Error> {
    let config = Config::parse();

    env_logger::Builder::new()
        .filter_level(config.log_level())
        .parse_default_env()
        .init();

    let mut databases = pipeline::run(&config)?;
    for database in databases.values_mut() {
        info!("{} stores {:?}", database, database.list_stored_tables()?);
        database.disconnect();
    }

    Ok(())
}
