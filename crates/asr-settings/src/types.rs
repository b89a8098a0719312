//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a settings
//! file may be partial: missing fields get their default value.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Default port, shared by the server bind and the batch endpoint.
pub const DEFAULT_PORT: u16 = 8001;
/// Default upload cap in bytes (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
/// Default connection-establishment budget in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;
/// Default response-read budget in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Root settings type.
///
/// # JSON Format
///
/// ```json
/// {
///   "server": { "port": 9000, "inferenceWorkers": 2 },
///   "batch": { "readTimeoutSecs": 60 }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AsrSettings {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Acoustic model location.
    pub model: ModelSettings,
    /// Batch driver settings.
    pub batch: BatchSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl AsrSettings {
    /// Reject values that would make the service unusable.
    pub fn validate(&self) -> Result<()> {
        if self.server.inference_workers == 0 {
            return Err(SettingsError::InvalidValue(
                "server.inferenceWorkers must be at least 1".into(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(SettingsError::InvalidValue(
                "server.maxUploadBytes must be positive".into(),
            ));
        }
        if self.batch.connect_timeout_secs == 0 || self.batch.read_timeout_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "batch timeouts must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Inference calls allowed in flight at once (1 = single-flight).
    pub inference_workers: usize,
    /// Largest accepted request body in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            inference_workers: 1,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Acoustic model location and provisioning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    /// Model directory; `None` means `~/.asr/models/wav2vec2-large-960h`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// `HuggingFace` repository to download from; `None` uses the built-in default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Download missing model files at startup.
    pub auto_download: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            dir: None,
            repo: None,
            auto_download: true,
        }
    }
}

/// Batch driver settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchSettings {
    /// Full URL of the `/asr` endpoint.
    pub endpoint: String,
    /// CSV dataset read and rewritten in place.
    pub dataset: String,
    /// Directory `filename` values resolve against; `None` means the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_root: Option<String>,
    /// Column holding the audio path.
    pub filename_column: String,
    /// Column the transcription is written to.
    pub output_column: String,
    /// Connection-establishment budget in seconds.
    pub connect_timeout_secs: u64,
    /// Response-read budget in seconds.
    pub read_timeout_secs: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            endpoint: format!("http://localhost:{DEFAULT_PORT}/asr"),
            dataset: "cv-valid-dev.csv".to_string(),
            audio_root: None,
            filename_column: "filename".to_string(),
            output_column: "generated_text".to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive (`RUST_LOG` takes precedence).
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_defaults() {
        let s = ServerSettings::default();
        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.port, 8001);
        assert_eq!(s.inference_workers, 1);
        assert_eq!(s.max_upload_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn batch_defaults() {
        let b = BatchSettings::default();
        assert_eq!(b.dataset, "cv-valid-dev.csv");
        assert_eq!(b.filename_column, "filename");
        assert_eq!(b.output_column, "generated_text");
        assert!(b.audio_root.is_none());
    }

    #[test]
    fn camel_case_wire_format() {
        let json = serde_json::to_value(AsrSettings::default()).unwrap();
        assert!(json["server"]["inferenceWorkers"].is_number());
        assert!(json["batch"]["connectTimeoutSecs"].is_number());
        assert!(json["model"]["autoDownload"].is_boolean());
        assert!(json["model"].get("dir").is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: AsrSettings = serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(s.server.port, 9000);
        assert_eq!(s.server.host, "0.0.0.0");
        assert_eq!(s.batch.read_timeout_secs, 30);
    }

    #[test]
    fn validate_defaults_ok() {
        AsrSettings::default().validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut s = AsrSettings::default();
        s.server.inference_workers = 0;
        assert!(matches!(s.validate(), Err(SettingsError::InvalidValue(_))));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut s = AsrSettings::default();
        s.batch.read_timeout_secs = 0;
        assert!(s.validate().is_err());
    }
}
