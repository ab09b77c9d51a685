//! Configuration: defaults, a TOML file, then `COUNTERTYPE_*` environment
//! overrides.
//!
//! ```toml
//! [injection]
//! intensity = 0.8
//! cascade_depth = 3
//! filter_threshold = 0.3
//! seed = 42
//!
//! [scoring]
//! baseline_time_ms = 60000.0
//! elegance_threshold = 0.7
//! history_limit = 20
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::injector::InjectionConfig;
use crate::scoring::ScoringConfig;

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountertypeConfig {
    pub injection: InjectionConfig,
    pub scoring: ScoringConfig,
}

impl CountertypeConfig {
    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Read a TOML file. Missing keys take defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The file (if any), then environment overrides.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply `COUNTERTYPE_*` overrides. Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let parsed = |key: &str| lookup(key).map(|v| v.trim().to_string());

        if let Some(v) = parsed("COUNTERTYPE_INTENSITY").and_then(|v| v.parse().ok()) {
            self.injection.intensity = v;
        }
        if let Some(v) = parsed("COUNTERTYPE_CASCADE_DEPTH").and_then(|v| v.parse().ok()) {
            self.injection.cascade_depth = v;
        }
        if let Some(v) = parsed("COUNTERTYPE_FILTER_THRESHOLD").and_then(|v| v.parse().ok()) {
            self.injection.filter_threshold = v;
        }
        if let Some(v) = parsed("COUNTERTYPE_SEED").and_then(|v| v.parse().ok()) {
            self.injection.seed = Some(v);
        }
        if let Some(v) = parsed("COUNTERTYPE_BASELINE_TIME_MS").and_then(|v| v.parse().ok()) {
            self.scoring.baseline_time_ms = v;
        }
        if let Some(v) = parsed("COUNTERTYPE_ELEGANCE_THRESHOLD").and_then(|v| v.parse().ok()) {
            self.scoring.elegance_threshold = v;
        }
    }
}
