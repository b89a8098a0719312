//! Dataset-level failures. Per-row failures are [`crate::BatchOutcome`]s instead.

use std::path::PathBuf;

use thiserror::Error;

/// Reading or writing the CSV dataset failed.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset file does not exist.
    #[error("'{}' not found", .0.display())]
    NotFound(PathBuf),
    /// The file could not be read or parsed as CSV.
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        /// Dataset path.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },
    /// A required column is absent from the header.
    #[error("dataset has no '{0}' column")]
    MissingColumn(String),
    /// A replacement column has the wrong number of values.
    #[error("column has {got} values but dataset has {expected} rows")]
    LengthMismatch {
        /// Row count.
        expected: usize,
        /// Values supplied.
        got: usize,
    },
    /// The file could not be written.
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        /// Dataset path.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },
}

/// A batch run could not start or could not save its results.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Dataset load or save failed.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
