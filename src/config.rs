use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::IdStrategy;

pub const DEFAULT_MARKER_ATTRIBUTE: &str = "data-ember-action";
pub const DEFAULT_EVENT_NAME: &str = "click";
pub const DEFAULT_MAX_FLUSH_TASKS: usize = 1000;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV_VAR: &str = "ACTIONS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read action config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("max_flush_tasks must be at least 1")]
    ZeroFlushLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Attribute carrying the action id on bound elements.
    pub marker_attribute: String,
    /// Event used when a binding does not say `on=`.
    pub default_event: String,
    pub id_strategy: IdStrategy,
    /// Upper bound on tasks run by a single flush.
    pub max_flush_tasks: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            marker_attribute: DEFAULT_MARKER_ATTRIBUTE.to_string(),
            default_event: DEFAULT_EVENT_NAME.to_string(),
            id_strategy: IdStrategy::default(),
            max_flush_tasks: DEFAULT_MAX_FLUSH_TASKS,
        }
    }
}

impl RuntimeConfig {
    /// Load from `config_path`, falling back to defaults when no path is
    /// given or the file does not exist.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                serde_yaml::from_str(&contents)?
            }
            _ => Self::default(),
        };
        config.validate()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.marker_attribute.trim().is_empty() {
            return Err(ConfigError::Empty("marker_attribute"));
        }
        if self.default_event.trim().is_empty() {
            return Err(ConfigError::Empty("default_event"));
        }
        if self.max_flush_tasks == 0 {
            return Err(ConfigError::ZeroFlushLimit);
        }
        Ok(self)
    }
}
