//! CSV dataset held fully in memory.
//!
//! Every column is kept as an opaque string so that values the driver does
//! not touch are written back exactly as read.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::DatasetError;

/// A CSV file: header plus rows, all padded to the header width.
#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Load `path`. Rows shorter than the header are padded with empty fields.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(DatasetError::NotFound(path));
        }

        let read_err = |source| DatasetError::Read {
            path: path.clone(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(read_err)?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(read_err)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(read_err)?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            if row.len() < headers.len() {
                row.resize(headers.len(), String::new());
            }
            rows.push(row);
        }

        debug!(path = %path.display(), rows = rows.len(), columns = headers.len(), "loaded dataset");
        Ok(Self {
            path,
            headers,
            rows,
        })
    }

    /// Column names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of `name` in the header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of column `name`, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&str>, DatasetError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).map_or("", String::as_str))
            .collect())
    }

    /// Replace column `name` with `values`, appending it if absent.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<(), DatasetError> {
        if values.len() != self.rows.len() {
            return Err(DatasetError::LengthMismatch {
                expected: self.rows.len(),
                got: values.len(),
            });
        }

        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        };

        for (row, value) in self.rows.iter_mut().zip(values) {
            if row.len() <= idx {
                row.resize(idx + 1, String::new());
            }
            row[idx] = value;
        }
        Ok(())
    }

    /// Write the dataset back to the path it was loaded from.
    pub fn save(&self) -> Result<(), DatasetError> {
        self.save_to(&self.path)
    }

    /// Write the dataset to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), DatasetError> {
        let write_err = |source| DatasetError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(write_err)?;

        writer.write_record(&self.headers).map_err(write_err)?;
        for row in &self.rows {
            writer.write_record(row).map_err(write_err)?;
        }
        writer
            .flush()
            .map_err(|e| write_err(csv::Error::from(e)))?;

        debug!(path = %path.display(), rows = self.rows.len(), "saved dataset");
        Ok(())
    }
}
