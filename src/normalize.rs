//! Categorical value codes.
//!
//! A [`NormaliseMap`] rewrites a single cell given its column name. The
//! stock implementation is [`CodeTable`], a case-insensitive lookup from
//! text to integer code that can be loaded from JSON:
//!
//! ```json
//! { "YES": 1, "NO": 0, "OTHER": { "reason": 3, "guardian": 2 } }
//! ```

use std::{fs::File, io::BufReader, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{common::Error, value::Value};

pub trait NormaliseMap {
    fn normalise(&self, value: &Value, column: &str) -> Value;
}

impl<F> NormaliseMap for F
where
    F: Fn(&Value, &str) -> Value,
{
    fn normalise(&self, value: &Value, column: &str) -> Value {
        self(value, column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeRule {
    Fixed(i64),
    PerColumn(IndexMap<String, i64>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: IndexMap<String, CodeRule>,
}

impl CodeTable {
    #[must_use]
    pub fn new(codes: IndexMap<String, CodeRule>) -> Self {
        Self {
            codes: codes
                .into_iter()
                .map(|(key, rule)| (key.to_uppercase(), rule))
                .collect(),
        }
    }

    /// Codes for the student performance data set.
    #[must_use]
    pub fn student_codes() -> Self {
        let fixed = [
            ("YES", 1),
            ("NO", 0),
            ("GP", 0),
            ("MS", 1),
            ("F", 0),
            ("M", 1),
            ("U", 0),
            ("R", 1),
            ("LE3", 0),
            ("GT3", 1),
            ("T", 0),
            ("A", 1),
            ("TEACHER", 0),
            ("HEALTH", 1),
            ("SERVICES", 2),
            ("AT_HOME", 3),
            ("HOME", 0),
            ("REPUTATION", 1),
            ("COURSE", 2),
            ("MOTHER", 0),
            ("FATHER", 1),
        ];

        let mut codes: IndexMap<String, CodeRule> = fixed
            .into_iter()
            .map(|(key, code)| (key.to_string(), CodeRule::Fixed(code)))
            .collect();
        codes.insert(
            "OTHER".into(),
            CodeRule::PerColumn(IndexMap::from([
                ("reason".to_string(), 3),
                ("guardian".to_string(), 2),
                ("Mjob".to_string(), 4),
                ("Fjob".to_string(), 4),
            ])),
        );

        Self::new(codes)
    }

    /// # Errors
    ///
    /// When the text is not a JSON object of codes.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// # Errors
    ///
    /// On file operations or malformed JSON.
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let reader = BufReader::new(File::open(path)?);
        Ok(Self::new(serde_json::from_reader(reader)?))
    }

    #[must_use]
    pub fn code(&self, value: &str, column: &str) -> Option<i64> {
        match self.codes.get(&value.to_uppercase())? {
            CodeRule::Fixed(code) => Some(*code),
            CodeRule::PerColumn(per_column) => per_column.get(column).copied(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl NormaliseMap for CodeTable {
    fn normalise(&self, value: &Value, column: &str) -> Value {
        value
            .as_text()
            .and_then(|text| self.code(text, column))
            .map_or_else(|| value.clone(), Value::Integer)
    }
}
