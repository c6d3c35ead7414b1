//! In-memory table: ordered named columns of typed values plus an optional
//! index column holding the row identifiers.

use std::path::Path;

use indexmap::IndexMap;
use log::debug;

use crate::{
    common::{CsvDbError, Error},
    schema::ColumnType,
    value::Value,
};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Frame {
    index: Option<(String, Vec<Value>)>,
    columns: IndexMap<String, Vec<Value>>,
    row_count: usize,
}

impl Frame {
    /// Reads a CSV with a header row. Column types are inferred per column.
    ///
    /// # Errors
    ///
    /// `CsvDbError::Parse` when the file is missing, empty, ragged or has
    /// repeated header names.
    pub fn read_csv(path: &Path, separator: u8) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(separator)
            .has_headers(true)
            .from_path(path)
            .map_err(|err| CsvDbError::parse(path, err))?;

        let headers = reader
            .headers()
            .map_err(|err| CsvDbError::parse(path, err))?
            .clone();
        if headers.is_empty() || headers.iter().all(str::is_empty) {
            return Err(CsvDbError::parse(path, "missing header row").into());
        }

        // SQLite column names are case-insensitive, so `a` and `A` collide.
        let mut raw_columns: IndexMap<String, Vec<String>> = IndexMap::new();
        for header in &headers {
            if let Some(previous) = raw_columns.keys().find(|k| k.eq_ignore_ascii_case(header)) {
                return Err(CsvDbError::parse(
                    path,
                    format!("repeated column {header} (as {previous})"),
                )
                .into());
            }
            raw_columns.insert(header.to_string(), vec![]);
        }

        let mut row_count = 0usize;
        for record in reader.records() {
            let record = record.map_err(|err| CsvDbError::parse(path, err))?;
            for (raw_column, field) in raw_columns.values_mut().zip(record.iter()) {
                raw_column.push(field.to_string());
            }
            row_count += 1;
        }

        let columns: IndexMap<String, Vec<Value>> = raw_columns
            .into_iter()
            .map(|(name, raws)| {
                let column_type = ColumnType::infer_raw(raws.iter().map(String::as_str));
                let values: Vec<Value> = raws
                    .iter()
                    .map(|raw| Value::from_raw(raw, column_type))
                    .collect();
                (name, values)
            })
            .collect();

        debug!("Read {} rows from {}", row_count, path.display());

        Ok(Self {
            index: None,
            columns,
            row_count,
        })
    }

    /// Writes the frame as CSV, index column first, overwriting `path`.
    ///
    /// # Errors
    ///
    /// On file operations.
    pub fn write_csv(&self, path: &Path, separator: u8) -> Result<(), Error> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(separator)
            .from_path(path)?;

        writer.write_record(self.header())?;
        for row_idx in 0..self.row_count {
            writer.write_record(self.row(row_idx).map(ToString::to_string))?;
        }
        writer.flush()?;

        debug!("Wrote {} rows to {}", self.row_count, path.display());
        Ok(())
    }

    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Name of the regular column equal to `name` ignoring ASCII case.
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&str> {
        self.column_names()
            .find(|column| column.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&String, &Vec<Value>)> {
        self.columns.iter()
    }

    #[must_use]
    pub fn index(&self) -> Option<(&str, &[Value])> {
        self.index
            .as_ref()
            .map(|(label, values)| (label.as_str(), values.as_slice()))
    }

    #[must_use]
    pub fn index_label(&self) -> Option<&str> {
        self.index.as_ref().map(|(label, _)| label.as_str())
    }

    /// Index label followed by the column names.
    pub fn header(&self) -> impl Iterator<Item = &str> {
        self.index_label().into_iter().chain(self.column_names())
    }

    /// Index value followed by the column values of one row.
    pub fn row(&self, row_idx: usize) -> impl Iterator<Item = &Value> {
        self.index
            .iter()
            .map(move |(_, values)| &values[row_idx])
            .chain(self.columns.values().map(move |values| &values[row_idx]))
    }

    /// Inserts a column at `position` among the regular columns.
    ///
    /// # Errors
    ///
    /// When the name is taken or the length differs from the row count.
    pub fn insert_column(
        &mut self,
        position: usize,
        name: &str,
        values: Vec<Value>,
    ) -> Result<(), CsvDbError> {
        let index_taken = self
            .index_label()
            .is_some_and(|label| label.eq_ignore_ascii_case(name));
        if index_taken || self.find_column(name).is_some() {
            return Err(CsvDbError::DuplicateColumn(name.to_string()));
        }
        if values.len() != self.row_count {
            return Err(CsvDbError::ColumnLengthMismatch {
                column: name.to_string(),
                expected: self.row_count,
                actual: values.len(),
            });
        }

        let position = position.min(self.columns.len());
        self.columns.shift_insert(position, name.to_string(), values);
        Ok(())
    }

    /// Moves column `name` into the index role. A previous index with a
    /// different label goes back to the front of the regular columns.
    /// Returns false when no such column exists.
    pub fn set_index(&mut self, name: &str) -> bool {
        let Some(values) = self.columns.shift_remove(name) else {
            return false;
        };
        self.reset_index();
        self.index = Some((name.to_string(), values));
        true
    }

    /// Moves the index back to the first regular column.
    pub fn reset_index(&mut self) {
        if let Some((label, values)) = self.index.take() {
            self.columns.shift_insert(0, label, values);
        }
    }

    /// Rewrites every regular column value through `f(value, column_name)`.
    pub fn map_values<F>(&mut self, f: F)
    where
        F: Fn(&Value, &str) -> Value,
    {
        for (column, values) in &mut self.columns {
            for value in values.iter_mut() {
                *value = f(&*value, column.as_str());
            }
        }
    }
}
