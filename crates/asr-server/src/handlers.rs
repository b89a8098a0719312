//! Route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::extract::multipart::MultipartRejection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ApiError;
use crate::service::ServiceContext;

/// Name of the multipart part carrying the audio.
pub const FILE_FIELD: &str = "file";

/// MIME type assumed when the part does not declare one.
const FALLBACK_MIME: &str = "application/octet-stream";

/// Successful `/asr` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsrResponse {
    /// Decoded text.
    pub transcription: String,
    /// Length of the normalized audio in seconds, e.g. `"5.064"`.
    pub duration: String,
}

impl AsrResponse {
    /// Build a response, rendering `duration_seconds` as the shortest
    /// round-tripping decimal that always carries a fractional part.
    pub fn new(transcription: String, duration_seconds: f64) -> Self {
        Self {
            transcription,
            duration: format!("{duration_seconds:?}"),
        }
    }
}

/// GET /ping
pub async fn ping() -> &'static str {
    "pong"
}

/// POST /asr
pub async fn asr(
    State(ctx): State<Arc<ServiceContext>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AsrResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        debug!(error = %e, "not a multipart request");
        ApiError::no_file()
    })?;

    let (bytes, mime_type) = read_file_part(&mut multipart).await?;
    let result = ctx.transcribe(bytes, mime_type).await?;
    Ok(Json(AsrResponse::new(result.text, result.duration_seconds)))
}

/// Find the `file` part and read it fully.
async fn read_file_part(multipart: &mut Multipart) -> Result<(Vec<u8>, String), ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(ApiError::no_file()),
            Err(e) => {
                debug!(error = %e, "unreadable multipart body");
                return Err(e.into());
            }
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let mime_type = field
            .content_type()
            .unwrap_or(FALLBACK_MIME)
            .to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| {
            debug!(error = %e, "failed to read file part");
            ApiError::from(e)
        })?;

        debug!(
            file_name = file_name.as_deref().unwrap_or("-"),
            mime_type,
            bytes = bytes.len(),
            "received upload"
        );
        return Ok((bytes.to_vec(), mime_type));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_always_has_fraction() {
        assert_eq!(AsrResponse::new(String::new(), 2.0).duration, "2.0");
        assert_eq!(AsrResponse::new(String::new(), 0.0).duration, "0.0");
    }

    #[test]
    fn duration_is_shortest_round_trip() {
        assert_eq!(AsrResponse::new(String::new(), 0.1).duration, "0.1");
        assert_eq!(AsrResponse::new(String::new(), 81_024.0 / 16_000.0).duration, "5.064");
    }

    #[tokio::test]
    async fn ping_is_pong() {
        assert_eq!(ping().await, "pong");
    }
}
