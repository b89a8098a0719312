//! Stub models and request builders shared by the router tests.

use std::sync::Mutex;

use asr_transcription::{AcousticModel, NormalizedAudio, TranscriptionError};

/// Returns fixed text and remembers how many samples it was given.
pub(crate) struct StubModel {
    text: String,
    last_len: Mutex<Option<usize>>,
}

impl StubModel {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            last_len: Mutex::new(None),
        }
    }

    pub(crate) fn last_len(&self) -> Option<usize> {
        *self.last_len.lock().unwrap()
    }
}

impl AcousticModel for StubModel {
    fn transcribe(&self, audio: &NormalizedAudio) -> Result<String, TranscriptionError> {
        assert_eq!(audio.sample_rate(), 16_000);
        *self.last_len.lock().unwrap() = Some(audio.samples().len());
        Ok(self.text.clone())
    }
}

/// Always fails inference.
pub(crate) struct FailingModel;

impl AcousticModel for FailingModel {
    fn transcribe(&self, _audio: &NormalizedAudio) -> Result<String, TranscriptionError> {
        Err(TranscriptionError::Inference("model run: out of memory".into()))
    }
}

/// 16-bit PCM WAV with a constant quarter-scale tone on every channel.
pub(crate) fn wav_bytes(sample_rate: u32, channels: u16, frames: u32) -> Vec<u8> {
    let block_align = channels * 2;
    let data_size = frames * u32::from(block_align);

    let mut buf = Vec::with_capacity(44 + data_size as usize);
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVEfmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&16u16.to_le_bytes());
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for _ in 0..frames * u32::from(channels) {
        buf.extend_from_slice(&8192i16.to_le_bytes());
    }
    buf
}

/// A single-part `multipart/form-data` body.
pub(crate) fn multipart_body(
    boundary: &str,
    field: &str,
    file_name: &str,
    content_type: &str,
    data: &[u8],
) -> Vec<u8> {
    let mut body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
