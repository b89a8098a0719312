//! # asr-batch
//!
//! Transcribes every row of a CSV dataset through the `/asr` endpoint,
//! strictly one request at a time, and writes the results back to the same
//! file in a single pass at the end.
//!
//! Per-row problems (missing audio, timeouts, error statuses, transport
//! failures) become an empty transcription and never stop the run.

#![deny(unsafe_code)]

pub mod client;
pub mod dataset;
pub mod driver;
pub mod errors;
pub mod outcome;

pub use client::{AsrClient, ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT};
pub use dataset::Dataset;
pub use driver::{BatchConfig, BatchDriver};
pub use errors::{BatchError, DatasetError};
pub use outcome::{BatchOutcome, BatchSummary};
