//! Resampling to 16kHz and mono mixdown.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

use crate::types::{DecodedAudio, NormalizedAudio, TranscriptionError};

/// Sample rate the acoustic model expects, in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Input frames fed to the resampler per call.
const CHUNK_SIZE: usize = 1024;

/// Bring decoded audio into the canonical form: 16kHz, one channel.
///
/// Resampling happens per channel before the mixdown, and the output frame
/// count is exactly `round(frames * 16000 / source_rate)`.
pub fn normalize(audio: DecodedAudio) -> Result<NormalizedAudio, TranscriptionError> {
    let DecodedAudio {
        mut samples,
        sample_rate,
    } = audio;

    if sample_rate != TARGET_SAMPLE_RATE && !samples.is_empty() {
        samples = resample(&samples, sample_rate, TARGET_SAMPLE_RATE)?;
    }

    let mono = mix_down(samples);
    debug!(
        samples = mono.len(),
        source_rate = sample_rate,
        "audio normalized"
    );
    Ok(NormalizedAudio::new(mono))
}

/// Average all channels sample-by-sample. A single channel passes through.
fn mix_down(mut channels: Vec<Vec<f32>>) -> Vec<f32> {
    match channels.len() {
        0 => Vec::new(),
        1 => channels.pop().unwrap_or_default(),
        n => {
            #[allow(clippy::cast_precision_loss)]
            let scale = 1.0 / n as f32;
            let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
            (0..frames)
                .map(|i| channels.iter().map(|c| c[i]).sum::<f32>() * scale)
                .collect()
        }
    }
}

/// Expected frame count after converting `frames` from `from_rate` to `to_rate`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn resampled_len(frames: usize, from_rate: u32, to_rate: u32) -> usize {
    (frames as f64 * f64::from(to_rate) / f64::from(from_rate)).round() as usize
}

/// Resample planar audio from `from_rate` to `to_rate` using rubato.
fn resample(
    channels: &[Vec<f32>],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<Vec<f32>>, TranscriptionError> {
    if from_rate == 0 {
        return Err(TranscriptionError::Resample("source sample rate is zero".into()));
    }

    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    let expected = resampled_len(frames, from_rate, to_rate);
    if frames == 0 {
        return Ok(vec![Vec::new(); channels.len()]);
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_SIZE, channels.len())
        .map_err(|e| TranscriptionError::Resample(format!("init: {e}")))?;

    // The sinc filter delays its output; skip that many frames at the front.
    let delay = resampler.output_delay();
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); channels.len()];

    let mut pos = 0;
    while pos + CHUNK_SIZE <= frames {
        let block: Vec<&[f32]> = channels.iter().map(|c| &c[pos..pos + CHUNK_SIZE]).collect();
        let resampled = resampler
            .process(&block, None)
            .map_err(|e| TranscriptionError::Resample(format!("process: {e}")))?;
        append(&mut output, resampled);
        pos += CHUNK_SIZE;
    }

    if pos < frames {
        let block: Vec<&[f32]> = channels.iter().map(|c| &c[pos..frames]).collect();
        let resampled = resampler
            .process_partial(Some(block.as_slice()), None)
            .map_err(|e| TranscriptionError::Resample(format!("process tail: {e}")))?;
        append(&mut output, resampled);
    }

    // Flush the filter tail until the delayed signal is fully out.
    while output[0].len() < expected + delay {
        let resampled = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| TranscriptionError::Resample(format!("flush: {e}")))?;
        if resampled.first().is_none_or(Vec::is_empty) {
            break;
        }
        append(&mut output, resampled);
    }

    for channel in &mut output {
        let skip = delay.min(channel.len());
        let _ = channel.drain(..skip);
        channel.resize(expected, 0.0);
    }

    Ok(output)
}

fn append(output: &mut [Vec<f32>], resampled: Vec<Vec<f32>>) {
    for (out, chunk) in output.iter_mut().zip(resampled) {
        out.extend_from_slice(&chunk);
    }
}
