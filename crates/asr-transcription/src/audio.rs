//! Audio decoding into planar f32 channels at the source sample rate.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::types::{DecodedAudio, TranscriptionError};

/// Map a declared MIME type to the container extension symphonia probes with.
///
/// The hint is advisory: unknown types return `None` and the probe falls back
/// to sniffing the stream.
pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "audio/wav" | "audio/wave" | "audio/x-wav" => Some("wav"),
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/m4a" | "audio/mp4" | "audio/x-m4a" | "audio/aac" => Some("m4a"),
        "audio/flac" | "audio/x-flac" => Some("flac"),
        "audio/ogg" | "audio/vorbis" => Some("ogg"),
        _ => None,
    }
}

/// Decode encoded audio bytes into planar f32 samples.
///
/// Channels are kept separate and the source rate is preserved; resampling
/// and mixdown belong to [`crate::normalize`].
pub fn decode_audio(data: &[u8], mime_type: &str) -> Result<DecodedAudio, TranscriptionError> {
    if data.is_empty() {
        return Err(TranscriptionError::AudioDecode("empty audio payload".into()));
    }

    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension_for_mime(mime_type) {
        let _ = hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| TranscriptionError::AudioDecode(format!("probe failed: {e}")))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| TranscriptionError::AudioDecode("no audio track found".into()))?;

    let codec_params = track.codec_params.clone();
    let track_id = track.id;
    let mut sample_rate = codec_params.sample_rate;
    let mut channels: Vec<Vec<f32>> =
        vec![Vec::new(); codec_params.channels.map_or(1, |c| c.count())];

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| TranscriptionError::AudioDecode(format!("codec init failed: {e}")))?;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(TranscriptionError::AudioDecode(format!("packet read: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(error = %e, "skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(TranscriptionError::AudioDecode(format!("decode: {e}"))),
        };

        let spec = *decoded.spec();
        let n_frames = decoded.frames();
        if n_frames == 0 {
            continue;
        }
        let _ = sample_rate.get_or_insert(spec.rate);

        let n_channels = spec.channels.count();
        if n_channels != channels.len() {
            if channels.iter().any(|c| !c.is_empty()) {
                return Err(TranscriptionError::AudioDecode(format!(
                    "channel layout changed mid-stream: {} -> {n_channels}",
                    channels.len()
                )));
            }
            channels = vec![Vec::new(); n_channels];
        }

        let mut sample_buf = SampleBuffer::<f32>::new(n_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        for frame in sample_buf.samples().chunks(n_channels) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
    }

    let sample_rate = sample_rate
        .ok_or_else(|| TranscriptionError::AudioDecode("unknown sample rate".into()))?;

    let audio = DecodedAudio {
        samples: channels,
        sample_rate,
    };
    debug!(
        frames = audio.frames(),
        channels = audio.channel_count(),
        sample_rate,
        "audio decoded"
    );
    Ok(audio)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Generate a minimal valid 16-bit PCM WAV file.
    ///
    /// Samples alternate sign per channel so mixdown is observable.
    pub(crate) fn generate_test_wav(sample_rate: u32, channels: u16, num_samples: u32) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let byte_rate = sample_rate * u32::from(channels) * u32::from(bits_per_sample) / 8;
        let block_align = channels * bits_per_sample / 8;
        let data_size = num_samples * u32::from(channels) * u32::from(bits_per_sample) / 8;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(file_size as usize + 8);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&sample_rate.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for _ in 0..num_samples {
            for ch in 0..channels {
                let value: i16 = if ch % 2 == 0 { 8192 } else { -8192 };
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }
        buf
    }

    /// Silent MPEG-1 Layer III stream: 128 kbps, 44.1 kHz, mono. Zeroed side
    /// info and main data decode to silence.
    pub(crate) fn generate_silent_mp3(num_frames: usize) -> Vec<u8> {
        const HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0xC0];
        // 144 * 128_000 / 44_100, no padding
        const FRAME_LEN: usize = 417;

        let mut buf = Vec::with_capacity(FRAME_LEN * num_frames);
        for _ in 0..num_frames {
            buf.extend_from_slice(&HEADER);
            buf.resize(buf.len() + FRAME_LEN - HEADER.len(), 0);
        }
        buf
    }

    #[test]
    fn decode_mp3_via_mpeg_hint() {
        let mp3 = generate_silent_mp3(10);
        let audio = decode_audio(&mp3, "audio/mpeg").unwrap();
        assert_eq!(audio.sample_rate, 44_100);
        assert_eq!(audio.channel_count(), 1);
        assert!(audio.frames() >= 1_152, "frames = {}", audio.frames());
        assert_eq!(audio.frames() % 1_152, 0);
        assert!(audio.samples[0].iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn decode_invalid_audio_returns_error() {
        let err = decode_audio(b"not audio data", "audio/wav").unwrap_err();
        assert!(matches!(err, TranscriptionError::AudioDecode(_)));
    }

    #[test]
    fn decode_empty_returns_error() {
        let err = decode_audio(b"", "audio/wav").unwrap_err();
        assert!(err.to_string().contains("empty audio payload"));
    }

    #[test]
    fn decode_wav_mono() {
        let wav = generate_test_wav(16_000, 1, 1_600);
        let audio = decode_audio(&wav, "audio/wav").unwrap();
        assert_eq!(audio.sample_rate, 16_000);
        assert_eq!(audio.channel_count(), 1);
        assert_eq!(audio.frames(), 1_600);
        assert!(audio.samples[0].iter().all(|&s| (-1.0..=1.0).contains(&s)));
    }

    #[test]
    fn decode_wav_stereo_keeps_channels_apart() {
        let wav = generate_test_wav(44_100, 2, 4_410);
        let audio = decode_audio(&wav, "audio/wav").unwrap();
        assert_eq!(audio.sample_rate, 44_100);
        assert_eq!(audio.channel_count(), 2);
        assert_eq!(audio.frames(), 4_410);
        assert!(audio.samples[0][0] > 0.0);
        assert!(audio.samples[1][0] < 0.0);
    }

    #[test]
    fn decode_ignores_wrong_hint() {
        let wav = generate_test_wav(16_000, 1, 160);
        let audio = decode_audio(&wav, "audio/mpeg").unwrap();
        assert_eq!(audio.frames(), 160);
    }

    #[test]
    fn decode_zero_length_wav_is_valid() {
        let wav = generate_test_wav(16_000, 1, 0);
        let audio = decode_audio(&wav, "audio/wav").unwrap();
        assert_eq!(audio.frames(), 0);
        assert_eq!(audio.sample_rate, 16_000);
    }

    #[test]
    fn mime_hints() {
        assert_eq!(extension_for_mime("audio/mpeg"), Some("mp3"));
        assert_eq!(extension_for_mime("audio/x-wav"), Some("wav"));
        assert_eq!(extension_for_mime("audio/mp4"), Some("m4a"));
        assert_eq!(extension_for_mime("audio/flac"), Some("flac"));
        assert_eq!(extension_for_mime("application/octet-stream"), None);
    }
}
