//! Speech-to-text core: audio decoding, normalization and wav2vec2 inference.
//!
//! # Architecture
//!
//! ```text
//! audio bytes → symphonia decode → DecodedAudio (planar, source rate)
//! → rubato resample to 16kHz → mean mixdown → NormalizedAudio (mono f32)
//! → zero-mean/unit-variance features → model.onnx → logits [1, T, V]
//! → greedy arg-max per frame → CTC collapse → text string
//! ```

#![deny(unsafe_code)]

pub mod audio;
pub mod ctc;
pub mod engine;
pub mod model;
pub mod normalize;
pub mod types;

pub use audio::decode_audio;
pub use engine::{AcousticModel, Wav2Vec2Engine};
pub use normalize::{TARGET_SAMPLE_RATE, normalize};
pub use types::{DecodedAudio, NormalizedAudio, TranscriptionError, TranscriptionResult};
