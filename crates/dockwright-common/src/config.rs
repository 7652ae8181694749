//! Engine configuration model.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DockwrightError, Result};

/// Which engine to drive and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine binary name or path.
    pub binary: String,
    /// Subcommand placed before `build` for multi-platform builds.
    pub multi_arch_subcommand: String,
    /// Timeout applied to `start` when a run spec does not set one.
    #[serde(with = "optional_secs")]
    pub default_run_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: crate::constants::DEFAULT_ENGINE_BINARY.to_string(),
            multi_arch_subcommand: crate::constants::DEFAULT_MULTI_ARCH_SUBCOMMAND.to_string(),
            default_run_timeout: None,
        }
    }
}

impl EngineConfig {
    /// Loads a JSON configuration file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// names an empty engine binary.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DockwrightError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy that drives a different engine binary.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Checks that the configuration can produce usable commands.
    ///
    /// # Errors
    ///
    /// Returns an error if the binary or multi-arch subcommand is blank.
    pub fn validate(&self) -> Result<()> {
        if self.binary.trim().is_empty() {
            return Err(DockwrightError::Config {
                message: "engine binary must not be empty".into(),
            });
        }
        if self.multi_arch_subcommand.trim().is_empty() {
            return Err(DockwrightError::Config {
                message: "multi-arch subcommand must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Serializes `Option<Duration>` as fractional seconds.
mod optional_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<f64>::deserialize(d)?;
        secs.map(|s| Duration::try_from_secs_f64(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_drives_docker() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.binary, "docker");
        assert_eq!(cfg.multi_arch_subcommand, "buildx");
        assert!(cfg.default_run_timeout.is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"binary": "podman", "default_run_timeout": 2.5}"#).unwrap();
        assert_eq!(cfg.binary, "podman");
        assert_eq!(cfg.multi_arch_subcommand, "buildx");
        assert_eq!(cfg.default_run_timeout, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"binary": "nerdctl"}"#).expect("write");
        let cfg = EngineConfig::load(&path).expect("load");
        assert_eq!(cfg.binary, "nerdctl");
    }

    #[test]
    fn load_rejects_blank_binary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"binary": "  "}"#).expect("write");
        assert!(matches!(
            EngineConfig::load(&path),
            Err(DockwrightError::Config { .. })
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = EngineConfig::load(Path::new("/nonexistent/dwr.json")).unwrap_err();
        assert!(matches!(err, DockwrightError::Io { .. }));
    }

    #[test]
    fn negative_timeout_is_rejected() {
        let parsed = serde_json::from_str::<EngineConfig>(r#"{"default_run_timeout": -1}"#);
        assert!(parsed.is_err());
    }
}
