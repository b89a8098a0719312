//! HTTP client for the `/asr` endpoint.

use std::path::Path;
use std::time::Duration;

use asr_settings::{BatchSettings, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, warn};

use crate::outcome::BatchOutcome;

/// Budget for establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS);
/// Budget for each read of the response.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS);

/// MIME type sent when the extension is unknown.
const DEFAULT_MIME: &str = "audio/mpeg";

/// Endpoint and timeouts for [`AsrClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full URL of the `/asr` endpoint.
    pub endpoint: String,
    /// Connection-establishment budget.
    pub connect_timeout: Duration,
    /// Response-read budget.
    pub read_timeout: Duration,
}

impl ClientConfig {
    /// Defaults with the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl From<&BatchSettings> for ClientConfig {
    fn from(settings: &BatchSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
            read_timeout: Duration::from_secs(settings.read_timeout_secs),
        }
    }
}

/// Posts audio files to the service and classifies the result.
#[derive(Debug, Clone)]
pub struct AsrClient {
    http: reqwest::Client,
    endpoint: String,
}

impl AsrClient {
    /// Build a client with independent connect and read timeouts.
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    /// The endpoint requests go to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload `path` and classify what came back. Never fails; every problem
    /// becomes a non-success outcome and is logged with the file name.
    pub async fn transcribe_file(&self, path: &Path) -> BatchOutcome {
        let filename = path.display().to_string();

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(%filename, "file not found, skipping");
                return BatchOutcome::MissingFile;
            }
            Err(e) => {
                warn!(%filename, error = %e, "could not read audio file");
                return BatchOutcome::NetworkError(e.to_string());
            }
        };

        let base_name = path
            .file_name()
            .map_or_else(|| filename.clone(), |n| n.to_string_lossy().into_owned());
        let part = match Part::bytes(bytes)
            .file_name(base_name)
            .mime_str(mime_for_path(path))
        {
            Ok(part) => part,
            Err(e) => return network_error(&filename, &e),
        };
        let form = Form::new().part("file", part);

        let response = match self.http.post(&self.endpoint).multipart(form).send().await {
            Ok(resp) => resp,
            Err(e) => return classify_transport(&filename, &e),
        };

        let status = response.status();
        if status != StatusCode::OK {
            warn!(%filename, status = status.as_u16(), "service returned an error status");
            return BatchOutcome::ServiceError(status.as_u16());
        }

        match response.json::<Value>().await {
            Ok(body) => {
                let text = body
                    .get("transcription")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                debug!(%filename, chars = text.len(), "transcribed");
                BatchOutcome::Success(text)
            }
            Err(e) => classify_transport(&filename, &e),
        }
    }
}

/// Guess the upload MIME type from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("ogg" | "oga") => "audio/ogg",
        Some("m4a" | "mp4") => "audio/mp4",
        _ => DEFAULT_MIME,
    }
}

fn classify_transport(filename: &str, err: &reqwest::Error) -> BatchOutcome {
    if is_timeout(err) {
        warn!(filename, error = %err, "request timed out, skipping");
        BatchOutcome::Timeout
    } else {
        network_error(filename, err)
    }
}

/// A per-read timeout can surface as an I/O `TimedOut` deeper in the chain.
fn is_timeout(err: &reqwest::Error) -> bool {
    if err.is_timeout() {
        return true;
    }
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if inner
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::TimedOut)
        {
            return true;
        }
        source = inner.source();
    }
    false
}

fn network_error(filename: &str, err: &reqwest::Error) -> BatchOutcome {
    warn!(filename, error = %err, "could not process file");
    BatchOutcome::NetworkError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_guess() {
        assert_eq!(mime_for_path(Path::new("a/sample-000000.mp3")), "audio/mpeg");
        assert_eq!(mime_for_path(Path::new("x.WAV")), "audio/wav");
        assert_eq!(mime_for_path(Path::new("x.flac")), "audio/flac");
        assert_eq!(mime_for_path(Path::new("noext")), "audio/mpeg");
    }

    #[test]
    fn default_timeouts() {
        let cfg = ClientConfig::new("http://localhost:8001/asr");
        assert_eq!(cfg.connect_timeout, Duration::from_secs(15));
        assert_eq!(cfg.read_timeout, Duration::from_secs(30));
    }

    #[test]
    fn config_from_settings() {
        let settings = BatchSettings {
            read_timeout_secs: 5,
            ..BatchSettings::default()
        };
        let cfg = ClientConfig::from(&settings);
        assert_eq!(cfg.endpoint, "http://localhost:8001/asr");
        assert_eq!(cfg.read_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn unreadable_file_is_missing() {
        let client = AsrClient::new(&ClientConfig::new("http://127.0.0.1:9/asr")).unwrap();
        let outcome = client.transcribe_file(Path::new("/no/such/file.mp3")).await;
        assert_eq!(outcome, BatchOutcome::MissingFile);
    }

    #[tokio::test]
    async fn existing_but_unreadable_path_is_not_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let client = AsrClient::new(&ClientConfig::new("http://127.0.0.1:9/asr")).unwrap();

        // a directory exists but cannot be read as a file
        let outcome = client.transcribe_file(tmp.path()).await;
        assert!(matches!(outcome, BatchOutcome::NetworkError(_)), "{outcome:?}");
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let tmp = tempfile::tempdir().unwrap();
        let audio = tmp.path().join("a.mp3");
        std::fs::write(&audio, b"ID3").unwrap();

        // Bind then drop to get a port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = AsrClient::new(&ClientConfig::new(format!("http://127.0.0.1:{port}/asr"))).unwrap();

        let outcome = client.transcribe_file(&audio).await;
        assert!(matches!(outcome, BatchOutcome::NetworkError(_)), "{outcome:?}");
    }
}
