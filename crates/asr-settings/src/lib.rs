//! # asr-settings
//!
//! Configuration for the transcription server and the batch driver.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`AsrSettings::default()`]
//! 2. **User file**: `~/.asr/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `ASR_*` overrides (highest priority)
//!
//! Command-line flags are applied on top by the binary.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = AsrSettings::default();
        let _path = settings_path();
    }

    #[test]
    fn default_settings_are_valid() {
        let settings = AsrSettings::default();
        assert_eq!(settings.server.port, 8001);
        assert_eq!(settings.server.inference_workers, 1);
        assert_eq!(settings.batch.endpoint, "http://localhost:8001/asr");
        assert_eq!(settings.batch.connect_timeout_secs, 15);
        assert_eq!(settings.batch.read_timeout_secs, 30);
        assert_eq!(settings.logging.level, "info");
    }
}
