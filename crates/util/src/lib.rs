//! Utility helpers shared by querystate crates: configuration loading and
//! path handling.

pub mod config;
mod paths;

pub use config::{ConfigError, SessionConfig, default_config_path};
pub use paths::{config_file_path, expand_tilde};
