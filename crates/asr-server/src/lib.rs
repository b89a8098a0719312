//! # asr-server
//!
//! HTTP front end for the speech-to-text pipeline.
//!
//! - `GET /ping` liveness probe
//! - `POST /asr` multipart upload, answered with `{transcription, duration}`
//!
//! Inference is gated by a semaphore sized by `inference_workers` and runs on
//! the blocking pool, so the async runtime never stalls on the model.

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod handlers;
pub mod server;
pub mod service;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::ServerConfig;
pub use errors::ApiError;
pub use handlers::AsrResponse;
pub use server::{AsrServer, ServerHandle};
pub use service::ServiceContext;
pub use shutdown::ShutdownCoordinator;
