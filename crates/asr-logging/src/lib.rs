//! # asr-logging
//!
//! One-shot `tracing` subscriber setup. `RUST_LOG` wins over the configured
//! level. Output goes to stderr (stdout is reserved for command results),
//! compact by default or JSON lines on request.

#![deny(unsafe_code)]

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the logging subsystem.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Default level directive (e.g. `info`). Overridden by `RUST_LOG`.
    pub level: String,
    /// Per-target overrides (e.g. `("ort", "warn")`).
    pub module_levels: Vec<(String, String)>,
    /// Emit JSON lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            // ONNX Runtime is chatty at info
            module_levels: vec![("ort".to_string(), "warn".to_string())],
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Config with the given level and the default per-target overrides.
    pub fn new(level: impl Into<String>, json: bool) -> Self {
        Self {
            level: level.into(),
            json,
            ..Self::default()
        }
    }

    /// Build the `EnvFilter` directive string for this config.
    pub fn filter_directive(&self) -> String {
        let mut directive = self.level.trim().to_lowercase();
        if directive.is_empty() {
            directive.push_str("info");
        }
        for (module, level) in &self.module_levels {
            directive.push(',');
            directive.push_str(module);
            directive.push('=');
            directive.push_str(&level.to_lowercase());
        }
        directive
    }
}

/// Logging setup failure.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The level directive could not be parsed.
    #[error("invalid log filter '{directive}': {source}")]
    InvalidFilter {
        /// Directive that failed to parse.
        directive: String,
        /// Parser error.
        source: tracing_subscriber::filter::ParseError,
    },
    /// A global subscriber is already installed.
    #[error("failed to install subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Resolve the filter: `RUST_LOG` if set and valid, otherwise the config.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = config.filter_directive();
    EnvFilter::try_new(&directive).map_err(|source| LoggingError::InvalidFilter {
        directive,
        source,
    })
}

/// Install the global subscriber. Call once at startup.
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry().with(fmt_layer).try_init()?;
    Ok(())
}
