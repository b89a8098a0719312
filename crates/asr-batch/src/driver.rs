//! Sequential transcription of every row in a dataset.

use std::path::{Path, PathBuf};

use asr_settings::BatchSettings;
use tracing::{debug, info, warn};

use crate::client::{AsrClient, ClientConfig};
use crate::dataset::Dataset;
use crate::errors::BatchError;
use crate::outcome::{BatchOutcome, BatchSummary};

/// Rows between info-level progress lines.
const PROGRESS_EVERY: usize = 100;

/// Everything a batch run needs.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// CSV read and rewritten in place.
    pub dataset: PathBuf,
    /// Directory relative `filename` values resolve against.
    pub audio_root: Option<PathBuf>,
    /// Column holding audio paths.
    pub filename_column: String,
    /// Column the transcriptions go to.
    pub output_column: String,
    /// Endpoint and timeouts.
    pub client: ClientConfig,
}

impl From<&BatchSettings> for BatchConfig {
    fn from(settings: &BatchSettings) -> Self {
        Self {
            dataset: PathBuf::from(&settings.dataset),
            audio_root: settings.audio_root.as_ref().map(PathBuf::from),
            filename_column: settings.filename_column.clone(),
            output_column: settings.output_column.clone(),
            client: ClientConfig::from(settings),
        }
    }
}

/// Drives one pass over a dataset, one request at a time.
#[derive(Debug)]
pub struct BatchDriver {
    config: BatchConfig,
    client: AsrClient,
}

impl BatchDriver {
    /// Build the driver and its HTTP client.
    pub fn new(config: BatchConfig) -> Result<Self, BatchError> {
        let client = AsrClient::new(&config.client)?;
        Ok(Self { config, client })
    }

    /// Transcribe every row, then write the output column back once.
    ///
    /// Row failures never abort the run; only dataset I/O does.
    pub async fn run(&self) -> Result<BatchSummary, BatchError> {
        let mut dataset = Dataset::load(&self.config.dataset)?;
        let filenames: Vec<String> = dataset
            .column(&self.config.filename_column)?
            .into_iter()
            .map(str::to_string)
            .collect();

        let total = filenames.len();
        info!(
            dataset = %self.config.dataset.display(),
            rows = total,
            endpoint = self.client.endpoint(),
            "starting batch transcription"
        );

        let mut summary = BatchSummary::new(
            self.config.dataset.clone(),
            self.config.output_column.clone(),
        );
        let mut texts = Vec::with_capacity(total);

        for (idx, filename) in filenames.iter().enumerate() {
            let outcome = self.process_row(filename).await;
            debug!(row = idx + 1, total, %filename, ?outcome, "row done");
            summary.record(&outcome);
            texts.push(outcome.into_text());

            if (idx + 1) % PROGRESS_EVERY == 0 {
                info!(done = idx + 1, total, succeeded = summary.succeeded, "progress");
            }
        }

        dataset.set_column(&self.config.output_column, texts)?;
        dataset.save()?;

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed(),
            "batch transcription finished"
        );
        Ok(summary)
    }

    async fn process_row(&self, filename: &str) -> BatchOutcome {
        let path = self.resolve(filename);
        if filename.trim().is_empty() || !path.is_file() {
            warn!(filename, "file not found, skipping");
            return BatchOutcome::MissingFile;
        }
        self.client.transcribe_file(&path).await
    }

    /// Resolve a dataset `filename` against the audio root.
    pub fn resolve(&self, filename: &str) -> PathBuf {
        let path = Path::new(filename);
        match &self.config.audio_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}
