//! Acoustic model seam and the ONNX wav2vec2 implementation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ndarray::ArrayView2;
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use crate::ctc::{self, FeatureExtractorConfig, Vocabulary};
use crate::model::ModelPaths;
use crate::types::{NormalizedAudio, ResultExt, TranscriptionError};

/// Intra-op thread count for the ONNX session.
const INTRA_THREADS: usize = 4;

/// Turns normalized audio into text.
///
/// Implementations must be deterministic for fixed weights and input and
/// must never mutate the weights. Calls are synchronous and CPU-bound;
/// callers run them off the async runtime.
pub trait AcousticModel: Send + Sync {
    /// Transcribe 16kHz mono audio.
    fn transcribe(&self, audio: &NormalizedAudio) -> Result<String, TranscriptionError>;
}

/// wav2vec2 CTC model running on ONNX Runtime.
///
/// The session sits behind a `Mutex` because `Session::run` takes `&mut self`;
/// that lock is what makes concurrent callers single-flight.
pub struct Wav2Vec2Engine {
    session: Mutex<Session>,
    vocab: Vocabulary,
    features: FeatureExtractorConfig,
}

impl Wav2Vec2Engine {
    /// Load the model from `model_dir` on a blocking thread.
    ///
    /// Loads ~1.2GB of weights; call once at startup.
    pub async fn new(model_dir: PathBuf) -> Result<Arc<Self>, TranscriptionError> {
        tokio::task::spawn_blocking(move || Self::load(&model_dir))
            .await
            .inference("task join")?
            .map(Arc::new)
    }

    /// Load synchronously.
    pub fn load(model_dir: &Path) -> Result<Self, TranscriptionError> {
        info!("loading acoustic model from {}...", model_dir.display());
        let paths = ModelPaths::from_dir(model_dir);

        if !paths.model.exists() {
            return Err(TranscriptionError::ModelNotAvailable(format!(
                "missing {}",
                paths.model.display()
            )));
        }

        let vocab = Vocabulary::load(&paths.vocab)?;
        let features = FeatureExtractorConfig::load(&paths.preprocessor)?;
        if features.sampling_rate != crate::TARGET_SAMPLE_RATE {
            return Err(TranscriptionError::ModelNotAvailable(format!(
                "model expects {}Hz input, pipeline produces {}Hz",
                features.sampling_rate,
                crate::TARGET_SAMPLE_RATE
            )));
        }

        let session = Session::builder()
            .inference("session builder")?
            .with_intra_threads(INTRA_THREADS)
            .inference("set threads")?
            .commit_from_file(&paths.model)
            .inference("load model")?;

        info!(
            vocab_size = vocab.len(),
            blank_id = vocab.blank_id(),
            "acoustic model ready"
        );

        Ok(Self {
            session: Mutex::new(session),
            vocab,
            features,
        })
    }

    /// Run the model and return `[frames, classes]` logits.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn logits(&self, input_values: Vec<f32>) -> Result<(Vec<f32>, usize, usize), TranscriptionError> {
        let n = input_values.len();
        let input = Tensor::from_array(([1i64, n as i64], input_values))
            .inference("input_values tensor")?;

        let mut session = self.session.lock().inference("session lock")?;
        let outputs = session
            .run(ort::inputs!["input_values" => input])
            .inference("model run")?;

        let (shape, data) = outputs["logits"]
            .try_extract_tensor::<f32>()
            .inference("extract logits")?;

        if shape.len() != 3 {
            return Err(TranscriptionError::Inference(format!(
                "unexpected logits rank: {shape:?}"
            )));
        }
        Ok((data.to_vec(), shape[1] as usize, shape[2] as usize))
    }
}

impl AcousticModel for Wav2Vec2Engine {
    fn transcribe(&self, audio: &NormalizedAudio) -> Result<String, TranscriptionError> {
        if audio.samples().is_empty() {
            return Ok(String::new());
        }

        let input_values = self.features.extract(audio.samples());
        let (logits, frames, classes) = self.logits(input_values)?;
        debug!(frames, classes, "model logits");

        let view = ArrayView2::from_shape((frames, classes), logits.as_slice())
            .inference("reshape logits")?;
        let ids = ctc::greedy_ids(view);
        let text = self.vocab.decode(&ids);

        debug!(
            "decoded {} frames → {} chars",
            frames,
            text.len()
        );
        Ok(text)
    }
}
