//! Greedy CTC decoding for wav2vec2 character vocabularies.

use std::collections::HashMap;
use std::path::Path;

use ndarray::ArrayView2;
use serde::Deserialize;

use crate::types::TranscriptionError;

/// Character vocabulary with the CTC blank and word delimiter resolved.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    tokens: Vec<String>,
    blank_id: usize,
    word_delimiter: String,
}

/// Tokens that never contribute text.
const SILENT_TOKENS: &[&str] = &["<s>", "</s>"];

impl Vocabulary {
    /// Build from a `token → id` map as found in `vocab.json`.
    ///
    /// The blank is `<pad>` and the word delimiter is `|`, the wav2vec2 CTC
    /// tokenizer defaults.
    pub fn from_map(map: HashMap<String, usize>) -> Result<Self, TranscriptionError> {
        let size = map.values().max().map_or(0, |&m| m + 1);
        let mut tokens = vec![String::new(); size];
        for (token, id) in map {
            tokens[id] = token;
        }
        let blank_id = tokens
            .iter()
            .position(|t| t == "<pad>")
            .ok_or_else(|| {
                TranscriptionError::ModelNotAvailable("vocab has no <pad> token".into())
            })?;
        Ok(Self {
            tokens,
            blank_id,
            word_delimiter: "|".into(),
        })
    }

    /// Load `vocab.json`.
    pub fn load(path: &Path) -> Result<Self, TranscriptionError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranscriptionError::ModelNotAvailable(format!("failed to read vocab.json: {e}"))
        })?;
        let map: HashMap<String, usize> = serde_json::from_str(&content).map_err(|e| {
            TranscriptionError::ModelNotAvailable(format!("failed to parse vocab.json: {e}"))
        })?;
        Self::from_map(map)
    }

    /// Number of output classes.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Id of the CTC blank token.
    pub fn blank_id(&self) -> usize {
        self.blank_id
    }

    /// Collapse a per-frame id sequence into text.
    ///
    /// Repeats merge, blanks split repeats and vanish, `|` becomes a space.
    pub fn decode(&self, ids: &[usize]) -> String {
        let mut text = String::new();
        let mut prev: Option<usize> = None;
        for &id in ids {
            if prev == Some(id) {
                continue;
            }
            prev = Some(id);
            if id == self.blank_id {
                continue;
            }
            let Some(token) = self.tokens.get(id) else {
                continue;
            };
            if SILENT_TOKENS.contains(&token.as_str()) {
                continue;
            }
            if *token == self.word_delimiter {
                text.push(' ');
            } else {
                text.push_str(token);
            }
        }
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Feature extractor settings from `preprocessor_config.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureExtractorConfig {
    /// Apply zero-mean unit-variance normalization.
    pub do_normalize: bool,
    /// Rate the model was trained at.
    pub sampling_rate: u32,
}

impl Default for FeatureExtractorConfig {
    fn default() -> Self {
        Self {
            do_normalize: true,
            sampling_rate: crate::TARGET_SAMPLE_RATE,
        }
    }
}

impl FeatureExtractorConfig {
    /// Load `preprocessor_config.json`, falling back to defaults if absent.
    pub fn load(path: &Path) -> Result<Self, TranscriptionError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            TranscriptionError::ModelNotAvailable(format!(
                "failed to parse preprocessor_config.json: {e}"
            ))
        })
    }

    /// Turn a waveform into model input values.
    pub fn extract(&self, samples: &[f32]) -> Vec<f32> {
        if self.do_normalize {
            zero_mean_unit_var(samples)
        } else {
            samples.to_vec()
        }
    }
}

/// `(x - mean) / sqrt(var + 1e-7)`, matching the wav2vec2 feature extractor.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn zero_mean_unit_var(samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|&s| f64::from(s)).sum::<f64>() / n;
    let var = samples
        .iter()
        .map(|&s| (f64::from(s) - mean).powi(2))
        .sum::<f64>()
        / n;
    let denom = (var + 1e-7).sqrt();
    samples
        .iter()
        .map(|&s| ((f64::from(s) - mean) / denom) as f32)
        .collect()
}

/// Highest-scoring class per frame of a `[frames, classes]` logit matrix.
pub fn greedy_ids(logits: ArrayView2<'_, f32>) -> Vec<usize> {
    logits.rows().into_iter().map(|row| argmax(row.iter())).collect()
}

/// Find the index of the maximum value.
fn argmax<'a>(values: impl IntoIterator<Item = &'a f32>) -> usize {
    values
        .into_iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map_or(0, |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn vocab() -> Vocabulary {
        let map: HashMap<String, usize> = [
            ("<pad>", 0),
            ("<s>", 1),
            ("</s>", 2),
            ("<unk>", 3),
            ("|", 4),
            ("H", 5),
            ("E", 6),
            ("L", 7),
            ("O", 8),
        ]
        .into_iter()
        .map(|(t, i)| (t.to_string(), i))
        .collect();
        Vocabulary::from_map(map).unwrap()
    }

    #[test]
    fn argmax_basic() {
        assert_eq!(argmax(&[1.0, 3.0, 2.0]), 1);
        assert_eq!(argmax(&[5.0, 1.0, 2.0]), 0);
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), 1);
        assert_eq!(argmax(&[42.0]), 0);
    }

    #[test]
    fn collapses_repeats_and_blanks() {
        let v = vocab();
        // H H E <pad> L L <pad> L O
        let ids = [5, 5, 6, 0, 7, 7, 0, 7, 8];
        assert_eq!(v.decode(&ids), "HELLO");
    }

    #[test]
    fn word_delimiter_becomes_space() {
        let v = vocab();
        let ids = [4, 5, 6, 4, 4, 0, 8, 4];
        assert_eq!(v.decode(&ids), "HE O");
    }

    #[test]
    fn sentence_markers_are_dropped() {
        let v = vocab();
        assert_eq!(v.decode(&[1, 5, 8, 2]), "HO");
    }

    #[test]
    fn all_blank_is_empty() {
        let v = vocab();
        assert_eq!(v.decode(&[0, 0, 0]), "");
        assert_eq!(v.decode(&[]), "");
    }

    #[test]
    fn out_of_range_ids_are_ignored() {
        let v = vocab();
        assert_eq!(v.decode(&[5, 99, 6]), "HE");
    }

    #[test]
    fn vocab_requires_pad() {
        let map: HashMap<String, usize> = [("A".to_string(), 0)].into_iter().collect();
        assert!(Vocabulary::from_map(map).is_err());
    }

    #[test]
    fn vocab_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.json");
        std::fs::write(&path, r#"{"<pad>": 0, "|": 1, "A": 2}"#).unwrap();
        let v = Vocabulary::load(&path).unwrap();
        assert_eq!(v.len(), 3);
        assert_eq!(v.blank_id(), 0);
        assert_eq!(v.decode(&[2, 1, 2]), "A A");
    }

    #[test]
    fn greedy_over_logit_matrix() {
        let logits = Array2::from_shape_vec(
            (3, 3),
            vec![0.1, 0.9, 0.0, 0.8, 0.1, 0.1, 0.0, 0.2, 0.7],
        )
        .unwrap();
        assert_eq!(greedy_ids(logits.view()), vec![1, 0, 2]);
    }

    #[test]
    fn normalization_has_zero_mean_unit_variance() {
        let out = zero_mean_unit_var(&[1.0, 2.0, 3.0, 4.0]);
        let mean: f32 = out.iter().sum::<f32>() / 4.0;
        let var: f32 = out.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / 4.0;
        assert!(mean.abs() < 1e-5);
        assert!((var - 1.0).abs() < 1e-3);
    }

    #[test]
    fn normalization_of_silence_stays_finite() {
        let out = zero_mean_unit_var(&[0.0; 16]);
        assert!(out.iter().all(|x| x.is_finite() && x.abs() < 1e-6));
    }

    #[test]
    fn feature_config_defaults_when_missing() {
        let cfg = FeatureExtractorConfig::load(Path::new("/nonexistent/preprocessor.json")).unwrap();
        assert!(cfg.do_normalize);
        assert_eq!(cfg.sampling_rate, 16_000);
    }

    #[test]
    fn feature_config_without_normalization_passes_through() {
        let cfg: FeatureExtractorConfig =
            serde_json::from_str(r#"{"do_normalize": false, "sampling_rate": 16000}"#).unwrap();
        assert_eq!(cfg.extract(&[0.25, -0.25]), vec![0.25, -0.25]);
    }
}
