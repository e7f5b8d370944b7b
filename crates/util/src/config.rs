//! Session configuration for hosts embedding querystate.
//!
//! The configuration is a small JSON document read from
//! `~/.config/querystate/session.json` (or the path named by
//! `QUERYSTATE_CONFIG_PATH`). It only carries defaults; every value can be
//! overridden per instance or per scenario.

use std::fs;
use std::path::{Path, PathBuf};

use querystate_types::Location;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::paths::config_file_path;

/// Environment variable allowing callers to override the configuration path.
pub const CONFIG_PATH_ENV: &str = "QUERYSTATE_CONFIG_PATH";

/// Default filename for the JSON payload.
pub const CONFIG_FILE_NAME: &str = "session.json";

/// Error surfaced when reading or writing the session configuration fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("session config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("session config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Defaults applied to a host session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Address the session starts on when the host does not supply one
    pub initial_location: Location,
    /// Default for `notifyOnChange` when a mount omits it
    pub notify_on_change: bool,
    /// Drop an instance's query parameter when it is unmounted
    pub clear_param_on_unmount: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_location: Location::new("/"),
            notify_on_change: false,
            clear_param_on_unmount: false,
        }
    }
}

impl SessionConfig {
    /// Loads the configuration from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&default_config_path())
    }

    /// Loads the configuration from `path`.
    ///
    /// A missing file yields defaults. A file that fails to parse is logged and
    /// also yields defaults; any other I/O failure is returned.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(config) => Ok(config),
                Err(error) => {
                    warn!(
                        path = %path.display(),
                        error = %error,
                        "Failed to parse session config; using defaults"
                    );
                    Ok(Self::default())
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(ConfigError::Io(error)),
        }
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

/// Get the default path for the session configuration file.
pub fn default_config_path() -> PathBuf {
    config_file_path(CONFIG_PATH_ENV, CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = SessionConfig::load_from_path(&dir.path().join("absent.json")).expect("load");
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").expect("write");
        let config = SessionConfig::load_from_path(&path).expect("load");
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"initialLocation":"/profile?lang=en","notifyOnChange":true}"#).expect("write");
        let config = SessionConfig::load_from_path(&path).expect("load");
        assert_eq!(config.initial_location.to_string(), "/profile?lang=en");
        assert!(config.notify_on_change);
        assert!(!config.clear_param_on_unmount);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("session.json");
        let config = SessionConfig {
            initial_location: Location::parse("/a?b=c").expect("parse"),
            notify_on_change: true,
            clear_param_on_unmount: true,
        };
        config.save_to_path(&path).expect("save");
        assert_eq!(SessionConfig::load_from_path(&path).expect("load"), config);
    }

    #[test]
    fn default_path_honors_environment_override() {
        temp_env::with_var(CONFIG_PATH_ENV, Some("/tmp/qs/session.json"), || {
            assert_eq!(default_config_path(), PathBuf::from("/tmp/qs/session.json"));
        });
    }
}
