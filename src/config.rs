use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cluster::{Clusterer, MergeStrategy, DEFAULT_MERGE_WINDOW_DAYS};
use crate::crypto::KdfParams;
use crate::prediction::{PredictionPolicy, DEFAULT_CYCLE_LENGTH};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cycle_length must be within 15..=90, got {0}")]
    CycleLength(i64),
    #[error("merge_window_days must be within 0..=31, got {0}")]
    MergeWindow(i64),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub cycle: CycleToml,
    #[serde(default)]
    pub clustering: ClusteringToml,
    #[serde(default)]
    pub storage: StorageToml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    #[default]
    Configured,
    Chained,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CycleToml {
    #[serde(default)]
    pub policy: PolicyKind,
    /// Only read by the `configured` policy.
    #[serde(default = "default_cycle_length")]
    pub cycle_length: i64,
}

impl Default for CycleToml {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            cycle_length: default_cycle_length(),
        }
    }
}

fn default_cycle_length() -> i64 {
    DEFAULT_CYCLE_LENGTH
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusteringToml {
    #[serde(default = "default_merge_window")]
    pub merge_window_days: i64,
    #[serde(default)]
    pub strategy: MergeStrategy,
}

impl Default for ClusteringToml {
    fn default() -> Self {
        Self {
            merge_window_days: default_merge_window(),
            strategy: MergeStrategy::default(),
        }
    }
}

fn default_merge_window() -> i64 {
    DEFAULT_MERGE_WINDOW_DAYS
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageToml {
    /// Journal location; the platform data directory when unset.
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub kdf: KdfParams,
}

impl EngineConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(15..=90).contains(&self.cycle.cycle_length) {
            return Err(ConfigError::CycleLength(self.cycle.cycle_length));
        }
        if !(0..=31).contains(&self.clustering.merge_window_days) {
            return Err(ConfigError::MergeWindow(self.clustering.merge_window_days));
        }
        Ok(())
    }

    pub fn policy(&self) -> PredictionPolicy {
        match self.cycle.policy {
            PolicyKind::Configured => PredictionPolicy::Configured {
                cycle_length: self.cycle.cycle_length,
            },
            PolicyKind::Chained => PredictionPolicy::Chained,
        }
    }

    pub fn clusterer(&self) -> Clusterer {
        Clusterer::new(
            self.clustering.merge_window_days,
            self.clustering.strategy,
        )
    }
}
