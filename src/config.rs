use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::LevelFilter;

use crate::common::{CsvDbError, DEFAULT_SEPARATOR};

pub const DEFAULT_INPUT_DIR: &str = "data";
pub const DEFAULT_INDEX_LABEL: &str = "id";

/// Loads `<database>_<table>.csv` files into one SQLite file per database.
#[derive(Debug, Clone, Parser)]
#[command(name = "csvdb", version, about)]
pub struct Config {
    /// Folder scanned for `<database>_<table>.csv` files.
    #[arg(short, long, default_value = DEFAULT_INPUT_DIR)]
    pub input_dir: PathBuf,

    /// Folder for the `.db` files. Defaults to the folder of the CSVs.
    #[arg(short, long)]
    pub storage_dir: Option<PathBuf>,

    /// CSV field separator.
    #[arg(long, default_value = ";", value_parser = parse_separator)]
    pub separator: u8,

    /// Index column of one table, as `<database>_<table>=<label>`.
    #[arg(long = "index-label", value_parser = parse_index_label)]
    pub index_labels: Vec<(String, String)>,

    /// Index column of tables without an explicit `--index-label`.
    #[arg(long, default_value = DEFAULT_INDEX_LABEL)]
    pub default_index_label: String,

    /// Replace categorical text values by integer codes before storing.
    #[arg(long)]
    pub normalize: bool,

    /// JSON code table used by `--normalize` instead of the built-in one.
    #[arg(long, requires = "normalize")]
    pub normalization_map: Option<PathBuf>,

    /// Leave the source CSVs untouched.
    #[arg(long)]
    pub skip_csv_write: bool,

    /// More output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    #[must_use]
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            storage_dir: None,
            separator: DEFAULT_SEPARATOR,
            index_labels: vec![],
            default_index_label: DEFAULT_INDEX_LABEL.to_string(),
            normalize: false,
            normalization_map: None,
            skip_csv_write: false,
            verbose: 0,
        }
    }

    #[must_use]
    pub fn with_index_label(mut self, key: &str, label: &str) -> Self {
        self.index_labels.push((key.to_string(), label.to_string()));
        self
    }

    /// Label for the table with composite key `key`; the last matching
    /// `--index-label` wins.
    #[must_use]
    pub fn index_label_for(&self, key: &str) -> &str {
        self.index_labels
            .iter()
            .rev()
            .find(|(table_key, _)| table_key == key)
            .map_or(self.default_index_label.as_str(), |(_, label)| label.as_str())
    }

    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn parse_separator(raw: &str) -> Result<u8, CsvDbError> {
    match raw.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ if raw == "\\t" => Ok(b'\t'),
        _ => Err(CsvDbError::InvalidSeparator(raw.to_string())),
    }
}

fn parse_index_label(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, label)) if !key.is_empty() && !label.is_empty() => {
            Ok((key.to_string(), label.to_string()))
        }
        _ => Err(format!("expected <database>_<table>=<label>, got {raw:?}")),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["csvdb"]).unwrap();

        assert_eq!(PathBuf::from("data"), config.input_dir);
        assert_eq!(None, config.storage_dir);
        assert_eq!(b';', config.separator);
        assert_eq!("id", config.index_label_for("students_math"));
        assert!(!config.normalize);
        assert!(!config.skip_csv_write);
        assert_eq!(LevelFilter::Info, config.log_level());
    }

    #[test]
    fn test_parse_arguments() {
        let config = Config::try_parse_from([
            "csvdb",
            "--input-dir",
            "in",
            "--storage-dir",
            "out",
            "--separator",
            ",",
            "--index-label",
            "students_math=MUID",
            "--index-label",
            "students_description=DID",
            "--normalize",
            "-vv",
        ])
        .unwrap();

        assert_eq!(PathBuf::from("in"), config.input_dir);
        assert_eq!(Some(PathBuf::from("out")), config.storage_dir);
        assert_eq!(b',', config.separator);
        assert_eq!("MUID", config.index_label_for("students_math"));
        assert_eq!("DID", config.index_label_for("students_description"));
        assert_eq!("id", config.index_label_for("students_portuguese"));
        assert!(config.normalize);
        assert_eq!(LevelFilter::Trace, config.log_level());
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(Config::try_parse_from(["csvdb", "--separator", ";;"]).is_err());
        assert!(Config::try_parse_from(["csvdb", "--index-label", "students_math"]).is_err());
        assert!(Config::try_parse_from(["csvdb", "--normalization-map", "m.json"]).is_err());
    }

    #[test]
    fn test_tab_separator() {
        assert_eq!(b'\t', parse_separator("\\t").unwrap());
        assert_eq!(b'\t', parse_separator("\t").unwrap());
    }

    #[test]
    fn test_new_matches_cli_defaults() {
        let built = Config::new("data").with_index_label("a_b", "X");
        assert_eq!("X", built.index_label_for("a_b"));
        assert_eq!("id", built.index_label_for("a_c"));
        assert_eq!(b';', built.separator);
    }
}
