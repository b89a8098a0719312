//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`AsrSettings::default()`]
//! 2. If `~/.asr/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `ASR_*` environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::AsrSettings;

/// Resolve the path to the settings file (`~/.asr/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".asr").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<AsrSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON or a value that fails
/// [`AsrSettings::validate`] is an error.
pub fn load_settings_from_path(path: &Path) -> Result<AsrSettings> {
    let defaults = serde_json::to_value(AsrSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: AsrSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `ASR_*` environment variable overrides.
///
/// Out-of-range or unparseable values are logged and ignored.
pub fn apply_env_overrides(settings: &mut AsrSettings) {
    // server
    if let Some(v) = read_env_string("ASR_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("ASR_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = read_env_usize("ASR_INFERENCE_WORKERS", 1, 64) {
        settings.server.inference_workers = v;
    }
    if let Some(v) = read_env_usize("ASR_MAX_UPLOAD_BYTES", 1024, 1 << 30) {
        settings.server.max_upload_bytes = v;
    }

    // model
    if let Some(v) = read_env_string("ASR_MODEL_DIR") {
        settings.model.dir = Some(v);
    }
    if let Some(v) = read_env_string("ASR_MODEL_REPO") {
        settings.model.repo = Some(v);
    }

    // batch
    if let Some(v) = read_env_string("ASR_ENDPOINT") {
        settings.batch.endpoint = v;
    }
    if let Some(v) = read_env_string("ASR_DATASET") {
        settings.batch.dataset = v;
    }
    if let Some(v) = read_env_u64("ASR_CONNECT_TIMEOUT_SECS", 1, 3600) {
        settings.batch.connect_timeout_secs = v;
    }
    if let Some(v) = read_env_u64("ASR_READ_TIMEOUT_SECS", 1, 3600) {
        settings.batch.read_timeout_secs = v;
    }

    // logging
    if let Some(v) = read_env_string("ASR_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_env_bool("ASR_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within `[min, max]`.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u64` within `[min, max]`.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `usize` within `[min, max]`.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

// ── Env var readers ─────────────────────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_parsed<T>(name: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    let val = std::env::var(name).ok()?;
    let result = parse(&val);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid env var, ignoring");
    }
    result
}

fn read_env_bool(name: &str) -> Option<bool> {
    read_env_parsed(name, parse_bool)
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    read_env_parsed(name, |v| parse_u16_range(v, min, max))
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    read_env_parsed(name, |v| parse_u64_range(v, min, max))
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    read_env_parsed(name, |v| parse_usize_range(v, min, max))
}
