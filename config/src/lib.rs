//! Configuration loading for BabyBaby page hydration.
//!
//! The file is optional; every section and field falls back to the defaults
//! of the resolved settings types in `babybaby-types`. Validation of typed
//! values (tier ordering, margins, intervals) happens during deserialization,
//! so a successfully parsed [`BabyConfig`] always resolves.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use babybaby_types::{FailureFallback, ScheduleSettings, ShellSettings, ViewportSettings};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "BABYBABY_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ShellSection {
    #[serde(default)]
    pub on_failure: FailureFallback,
}

/// Top-level shape of `config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct BabyConfig {
    pub schedule: Option<ScheduleSettings>,
    pub viewport: Option<ViewportSettings>,
    pub shell: Option<ShellSection>,
}

impl BabyConfig {
    /// Load from the default location.
    ///
    /// Returns `Ok(None)` when no config file exists; callers fall back to
    /// defaults.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        Self::parse(&content, path)
    }

    /// Parse TOML text. `path` is only used for error reporting.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        match toml::from_str(content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    /// Resolve into the settings consumed by the page shell.
    #[must_use]
    pub fn into_settings(self) -> ShellSettings {
        ShellSettings {
            schedule: self.schedule.unwrap_or_default(),
            viewport: self.viewport.unwrap_or_default(),
            on_failure: self.shell.map(|s| s.on_failure).unwrap_or_default(),
        }
    }
}

/// Location of the config file: `$BABYBABY_CONFIG`, else `~/.babybaby/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os(CONFIG_PATH_ENV)
        && !explicit.is_empty()
    {
        return Some(PathBuf::from(explicit));
    }
    dirs::home_dir().map(|home| home.join(".babybaby").join("config.toml"))
}
