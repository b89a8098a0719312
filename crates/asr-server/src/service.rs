//! Request-independent state and the decode → normalize → infer pipeline.

use std::sync::Arc;
use std::time::Instant;

use asr_transcription::{AcousticModel, TranscriptionResult, decode_audio, normalize};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::errors::ApiError;

/// Shared, immutable state handed to every handler.
pub struct ServiceContext {
    model: Arc<dyn AcousticModel>,
    slots: Arc<Semaphore>,
    workers: usize,
}

impl ServiceContext {
    /// Wrap a loaded model with `workers` concurrent inference slots.
    pub fn new(model: Arc<dyn AcousticModel>, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            model,
            slots: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    /// Configured concurrent inference slots.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Slots not currently held by a request.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Run the full pipeline on an uploaded payload.
    ///
    /// The slot permit moves into the blocking task, so an abandoned request
    /// keeps its slot until inference actually finishes.
    pub async fn transcribe(
        &self,
        bytes: Vec<u8>,
        mime_type: String,
    ) -> Result<TranscriptionResult, ApiError> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|e| ApiError::Unexpected(e.to_string()))?;
        let model = Arc::clone(&self.model);

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            run_pipeline(model.as_ref(), &bytes, &mime_type)
        })
        .await
        .map_err(|e| ApiError::Unexpected(format!("inference task failed: {e}")))?
    }
}

/// Decode, normalize and transcribe synchronously.
pub fn run_pipeline(
    model: &dyn AcousticModel,
    bytes: &[u8],
    mime_type: &str,
) -> Result<TranscriptionResult, ApiError> {
    let start = Instant::now();

    let decoded = decode_audio(bytes, mime_type)?;
    debug!(
        sample_rate = decoded.sample_rate,
        channels = decoded.channel_count(),
        frames = decoded.frames(),
        "decoded upload"
    );

    let audio = normalize(decoded)?;
    let duration_seconds = audio.duration_seconds();
    let text = model.transcribe(&audio)?;

    info!(
        samples = audio.samples().len(),
        duration_secs = duration_seconds,
        elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "transcribed upload"
    );

    Ok(TranscriptionResult {
        text,
        duration_seconds,
    })
}
