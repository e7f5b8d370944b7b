use std::env;
use std::path::{Path, PathBuf};

use dirs_next::{config_dir, home_dir};

/// Expands a leading `~` (or `~/`, `~\`) to the user's home directory.
///
/// Paths without a tilde prefix are returned trimmed but otherwise untouched.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    match trimmed {
        "~" => home(),
        _ => match trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
            Some(rest) => home().join(rest),
            None => PathBuf::from(trimmed),
        },
    }
}

/// Resolves a configuration file path.
///
/// A non-blank value in the environment variable `env_var` wins; otherwise
/// the file lives under `<config_dir>/querystate/<file_name>`.
pub fn config_file_path(env_var: &str, file_name: impl AsRef<Path>) -> PathBuf {
    if let Ok(path) = env::var(env_var)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("querystate")
        .join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_leaves_plain_paths_alone() {
        assert_eq!(expand_tilde(" /etc/querystate.json "), PathBuf::from("/etc/querystate.json"));
    }

    #[test]
    fn expand_tilde_joins_home_directory() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~/a/b.json"), home.join("a/b.json"));
            assert_eq!(expand_tilde("~"), home);
        }
    }

    #[test]
    fn config_file_path_honors_environment_override() {
        temp_env::with_var("QUERYSTATE_TEST_PATH", Some("/tmp/custom.json"), || {
            assert_eq!(config_file_path("QUERYSTATE_TEST_PATH", "session.json"), PathBuf::from("/tmp/custom.json"));
        });
    }

    #[test]
    fn config_file_path_ignores_blank_override() {
        temp_env::with_var("QUERYSTATE_TEST_BLANK", Some("   "), || {
            let path = config_file_path("QUERYSTATE_TEST_BLANK", "session.json");
            assert!(path.ends_with("querystate/session.json"), "unexpected path {}", path.display());
        });
    }
}
