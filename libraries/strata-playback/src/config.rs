//! Engine configuration
//!
//! Tunables for chunk scheduling and seek handling. Every field has a
//! default so a partial `strata.toml` (or nothing at all) is valid.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the streaming engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fraction of the current chunk that must play before the next chunk
    /// is appended (default: 0.55)
    pub lookahead_ratio: f64,

    /// Offset past the first appended chunk's start used when snapping the
    /// output position after the first append (default: 0.01)
    pub first_append_epsilon_secs: f64,

    /// How far before the final chunk's start a seek into it is snapped
    /// (default: 1.0)
    pub tail_seek_margin_secs: f64,

    /// Declared buffer duration when the total is unknown (default: 1e6)
    pub unknown_duration_secs: f64,

    /// Offset for Media Session seek-forward/backward actions that carry
    /// no explicit offset; read by `MediaSessionSurface::from_config`
    /// (default: 10.0)
    pub seek_step_secs: f64,

    /// "Previous" restarts the current track instead of moving back once
    /// playback is past this point (default: 3.0)
    pub restart_threshold_secs: f64,

    /// Initial volume, 0.0-1.0 (default: 1.0)
    pub initial_volume: f32,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Initial repeat flag (default: false)
    pub repeat: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookahead_ratio: 0.55,
            first_append_epsilon_secs: 0.01,
            tail_seek_margin_secs: 1.0,
            unknown_duration_secs: 1e6,
            seek_step_secs: 10.0,
            restart_threshold_secs: 3.0,
            initial_volume: 1.0,
            shuffle: false,
            repeat: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from `strata.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("strata.toml"))
    }

    /// Load configuration from a specific file (if present) and the environment
    ///
    /// Environment variables are prefixed with `STRATA_`, e.g.
    /// `STRATA_LOOKAHEAD_RATIO=0.6`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = config::Config::builder();

        if path.exists() {
            settings = settings.add_source(config::File::from(path));
        }

        settings = settings.add_source(config::Environment::with_prefix("STRATA").try_parsing(true));

        let config: Self = settings
            .build()
            .map_err(|e| PlaybackError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.lookahead_ratio > 0.0 && self.lookahead_ratio <= 1.0) {
            return Err(PlaybackError::Config(format!(
                "lookahead_ratio must be in (0, 1], got {}",
                self.lookahead_ratio
            )));
        }

        for (name, value) in [
            ("first_append_epsilon_secs", self.first_append_epsilon_secs),
            ("tail_seek_margin_secs", self.tail_seek_margin_secs),
            ("seek_step_secs", self.seek_step_secs),
            ("restart_threshold_secs", self.restart_threshold_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PlaybackError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if !(self.unknown_duration_secs.is_finite() && self.unknown_duration_secs > 0.0) {
            return Err(PlaybackError::Config(
                "unknown_duration_secs must be positive".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(PlaybackError::Config(format!(
                "initial_volume must be in [0, 1], got {}",
                self.initial_volume
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.lookahead_ratio, 0.55);
        assert_eq!(config.first_append_epsilon_secs, 0.01);
        assert_eq!(config.tail_seek_margin_secs, 1.0);
        assert_eq!(config.seek_step_secs, 10.0);
        assert_eq!(config.restart_threshold_secs, 3.0);
        assert_eq!(config.initial_volume, 1.0);
        assert!(!config.shuffle);
        assert!(!config.repeat);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        let config = EngineConfig {
            lookahead_ratio: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PlaybackError::Config(_))));

        let config = EngineConfig {
            lookahead_ratio: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_negative_margin() {
        let config = EngineConfig {
            tail_seek_margin_secs: -1.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tail_seek_margin_secs"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "lookahead_ratio = 0.7").unwrap();
        writeln!(file, "repeat = true").unwrap();

        let config = EngineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.lookahead_ratio, 0.7);
        assert!(config.repeat);
        assert_eq!(config.tail_seek_margin_secs, 1.0);
    }

    #[test]
    fn missing_file_is_default() {
        let config = EngineConfig::load_from(Path::new("/nonexistent/strata.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
