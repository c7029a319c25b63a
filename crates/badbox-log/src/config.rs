use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ir::{Severity, SortBy};

/// Line length, in bytes, at which TeX engines hard-wrap their transcript
/// (`max_print_line`).
pub const DEFAULT_WRAP_WIDTH: usize = 79;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value {value:?} for {field}")]
    InvalidValue { field: &'static str, value: String },
    #[error("wrap width must be positive")]
    ZeroWrapWidth,
}

/// Knobs that shape the parser's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Diagnostics below this severity are dropped as they are discovered.
    pub min_severity: Severity,
    pub sort_by: SortBy,
    pub wrap_width: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            min_severity: Severity::BoxOverflow,
            sort_by: SortBy::default(),
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }
}

impl ParseConfig {
    /// Location of the per-user config file: `<config_dir>/badbox/config.json`.
    ///
    /// The directory itself is host specific, so callers pass it in.
    pub fn user_path(config_dir: &Path) -> PathBuf {
        config_dir.join("badbox").join("config.json")
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        log::debug!("Loaded parse config from {:?}", path);
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wrap_width == 0 {
            return Err(ConfigError::ZeroWrapWidth);
        }
        Ok(())
    }
}
