//! Core types for the transcription pipeline.

use crate::normalize::TARGET_SAMPLE_RATE;

/// Audio as it comes out of the decoder: planar channels at the source rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// One sample vector per channel, all of equal length.
    pub samples: Vec<Vec<f32>>,
    /// Source sample rate in Hz.
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.samples.len()
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }
}

/// Mono audio at [`TARGET_SAMPLE_RATE`], ready for the acoustic model.
///
/// Only [`crate::normalize::normalize`] constructs this type, which is what
/// guarantees the rate and channel invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAudio {
    samples: Vec<f32>,
}

impl NormalizedAudio {
    pub(crate) fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    /// The mono samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Always [`TARGET_SAMPLE_RATE`].
    pub fn sample_rate(&self) -> u32 {
        TARGET_SAMPLE_RATE
    }

    /// Always 1.
    pub fn channel_count(&self) -> usize {
        1
    }

    /// Signal length in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / f64::from(TARGET_SAMPLE_RATE)
    }
}

/// Result of transcribing an audio file.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionResult {
    /// The transcribed text.
    pub text: String,
    /// Duration of the normalized audio in seconds.
    pub duration_seconds: f64,
}

/// Errors that can occur during transcription.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    /// Model files not found or failed to download.
    #[error("model not available: {0}")]
    ModelNotAvailable(String),

    /// ONNX Runtime session creation or inference failure.
    #[error("inference error: {0}")]
    Inference(String),

    /// Audio decoding failure (empty, unsupported format, corrupt data).
    #[error("audio decode error: {0}")]
    AudioDecode(String),

    /// Resampling failure.
    #[error("resample error: {0}")]
    Resample(String),

    /// I/O error (file read/write).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Attach context to foreign errors and fold them into [`TranscriptionError::Inference`].
pub(crate) trait ResultExt<T> {
    fn inference(self, context: &str) -> Result<T, TranscriptionError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn inference(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::Inference(format!("{context}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_audio_dimensions() {
        let audio = DecodedAudio {
            samples: vec![vec![0.0; 10], vec![0.0; 10]],
            sample_rate: 44_100,
        };
        assert_eq!(audio.channel_count(), 2);
        assert_eq!(audio.frames(), 10);
    }

    #[test]
    fn decoded_audio_without_channels_has_no_frames() {
        let audio = DecodedAudio {
            samples: Vec::new(),
            sample_rate: 16_000,
        };
        assert_eq!(audio.frames(), 0);
    }

    #[test]
    fn normalized_duration() {
        let audio = NormalizedAudio::new(vec![0.0; 8_000]);
        assert_eq!(audio.sample_rate(), 16_000);
        assert_eq!(audio.channel_count(), 1);
        assert!((audio.duration_seconds() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn transcription_error_display() {
        let e = TranscriptionError::ModelNotAvailable("missing model.onnx".into());
        assert!(e.to_string().contains("missing model.onnx"));

        let e = TranscriptionError::AudioDecode("corrupt header".into());
        assert!(e.to_string().contains("corrupt header"));
    }

    #[test]
    fn result_ext_wraps_message() {
        let r: Result<(), String> = Err("boom".into());
        let err = r.inference("session run").unwrap_err();
        assert!(matches!(err, TranscriptionError::Inference(ref m) if m == "session run: boom"));
    }
}
