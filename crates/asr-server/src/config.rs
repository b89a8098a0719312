//! Server configuration.

use asr_settings::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT, ServerSettings};
use serde::{Deserialize, Serialize};

/// Configuration for the transcription server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind (`0` auto-assigns).
    pub port: u16,
    /// Concurrent inference slots.
    pub inference_workers: usize,
    /// Largest accepted request body in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            inference_workers: 1,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// `host:port` bind string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            // a zero-permit semaphore would never admit a request
            inference_workers: settings.inference_workers.max(1),
            max_upload_bytes: settings.max_upload_bytes,
        }
    }
}
