use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::session::DEFAULT_RESET_DELAY_MS;

pub const CONFIG_FILE: &str = "config.toml";
pub const MAX_RESET_DELAY_MS: u64 = 24 * 60 * 60 * 1_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Delay before a completed session returns to idle.
    pub reset_delay_ms: u64,
    /// Terminal poll interval.
    pub tick_ms: u64,
    /// Celebratory messages; empty means the built-in pool.
    pub celebrations: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reset_delay_ms: DEFAULT_RESET_DELAY_MS as u64,
            tick_ms: 250,
            celebrations: Vec::new(),
        }
    }
}

impl Config {
    pub fn reset_delay(&self) -> Duration {
        Duration::milliseconds(self.reset_delay_ms.min(MAX_RESET_DELAY_MS) as i64)
    }

    pub fn tick(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_ms.max(10))
    }
}

/// Reads `path`, falling back to defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Config::default()),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if config.reset_delay_ms > MAX_RESET_DELAY_MS {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            message: format!("reset_delay_ms must be at most {MAX_RESET_DELAY_MS}"),
        });
    }

    Ok(config)
}
