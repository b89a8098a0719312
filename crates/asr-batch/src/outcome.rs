//! Per-row results and the run summary.

use std::fmt;
use std::path::PathBuf;

/// What happened to one dataset row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The service returned a transcription (possibly empty).
    Success(String),
    /// The audio file does not exist.
    MissingFile,
    /// Connecting or reading the response exceeded its budget.
    Timeout,
    /// The service answered with a non-200 status.
    ServiceError(u16),
    /// Any other transport or response-parsing failure.
    NetworkError(String),
}

impl BatchOutcome {
    /// Text written to the output column; empty for every failure.
    pub fn into_text(self) -> String {
        match self {
            Self::Success(text) => text,
            Self::MissingFile | Self::Timeout | Self::ServiceError(_) | Self::NetworkError(_) => {
                String::new()
            }
        }
    }
}

/// Counts per outcome for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Dataset that was processed.
    pub dataset: PathBuf,
    /// Column the results were written to.
    pub output_column: String,
    /// Rows processed.
    pub total: usize,
    /// Rows transcribed.
    pub succeeded: usize,
    /// Rows whose audio file was missing.
    pub missing: usize,
    /// Rows that timed out.
    pub timed_out: usize,
    /// Rows the service rejected.
    pub service_errors: usize,
    /// Rows that failed in transport.
    pub network_errors: usize,
}

impl BatchSummary {
    /// Empty summary for `dataset`.
    pub fn new(dataset: PathBuf, output_column: impl Into<String>) -> Self {
        Self {
            dataset,
            output_column: output_column.into(),
            ..Self::default()
        }
    }

    /// Count one row.
    pub fn record(&mut self, outcome: &BatchOutcome) {
        self.total += 1;
        match outcome {
            BatchOutcome::Success(_) => self.succeeded += 1,
            BatchOutcome::MissingFile => self.missing += 1,
            BatchOutcome::Timeout => self.timed_out += 1,
            BatchOutcome::ServiceError(_) => self.service_errors += 1,
            BatchOutcome::NetworkError(_) => self.network_errors += 1,
        }
    }

    /// Rows that did not produce a transcription.
    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Updated CSV file '{}' with column '{}': {}/{} transcribed \
             ({} missing, {} timed out, {} service errors, {} network errors)",
            self.dataset.display(),
            self.output_column,
            self.succeeded,
            self.total,
            self.missing,
            self.timed_out,
            self.service_errors,
            self.network_errors,
        )
    }
}
