// src/core/paths.rs

use crate::constants::{
    APP_DIR_NAME, CONFIG_FILENAME, HISTORY_FILENAME, HISTORY_PATH_ENV_VAR, PROFILE_ENV_VAR,
    PROFILE_EXTENSION, PROFILES_DIR_NAME,
};
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref ENTRY_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not expand path '{path}': {message}")]
    Expansion { path: String, message: String },
    #[error("Invalid profile name '{0}'. Use letters, digits, '-' and '_' only.")]
    InvalidProfileName(String),
}

/// Returns the application configuration directory (`<config_dir>/entry`).
///
/// Memoized: the first call computes the path, later calls return the cached value.
/// The directory is not created here; writers create it on demand.
pub fn get_entry_config_dir() -> Result<PathBuf, PathError> {
    let mut cached = ENTRY_CONFIG_DIR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(APP_DIR_NAME);
    *cached = Some(config_path.clone());
    Ok(config_path)
}

/// Path of the default `config.toml`.
pub fn get_default_config_path() -> Result<PathBuf, PathError> {
    get_entry_config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

/// Directory holding profile configuration files.
pub fn get_profiles_dir() -> Result<PathBuf, PathError> {
    get_entry_config_dir().map(|dir| dir.join(PROFILES_DIR_NAME))
}

/// Path of the configuration file for a named profile.
pub fn get_profile_path(name: &str) -> Result<PathBuf, PathError> {
    if !is_valid_profile_name(name) {
        return Err(PathError::InvalidProfileName(name.to_string()));
    }
    get_profiles_dir().map(|dir| dir.join(format!("{}.{}", name, PROFILE_EXTENSION)))
}

/// Path of the history file. `ENTRY_HISTORY_PATH` takes precedence.
pub fn get_history_path() -> Result<PathBuf, PathError> {
    match std::env::var(HISTORY_PATH_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => expand_user_path(&path),
        _ => get_entry_config_dir().map(|dir| dir.join(HISTORY_FILENAME)),
    }
}

/// Expands `~` and environment variables in a user-supplied path.
pub fn expand_user_path(path: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(path).map_err(|e| PathError::Expansion {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Decides which configuration file to use.
///
/// Precedence: an explicit `--config` path, then `--profile`, then the
/// `ENTRY_PROFILE` environment variable, then the default `config.toml`.
pub fn resolve_config_path(
    explicit: Option<&str>,
    profile: Option<&str>,
) -> Result<PathBuf, PathError> {
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        log::debug!("Using config from --config: {}", path);
        return expand_user_path(path);
    }
    if let Some(name) = profile.filter(|p| !p.trim().is_empty()) {
        log::debug!("Using profile '{}' from --profile", name);
        return get_profile_path(name.trim());
    }
    if let Ok(name) = std::env::var(PROFILE_ENV_VAR) {
        if !name.trim().is_empty() {
            log::debug!("Using profile '{}' from {}", name, PROFILE_ENV_VAR);
            return get_profile_path(name.trim());
        }
    }
    get_default_config_path()
}

/// Lists profile names found in the profiles directory, sorted.
pub fn list_profiles() -> Result<Vec<String>, PathError> {
    let dir = get_profiles_dir()?;
    Ok(profile_names_in(&dir))
}

fn profile_names_in(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(PROFILE_EXTENSION)
        })
        .filter_map(|path| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        })
        .collect();
    names.sort();
    names
}

fn is_valid_profile_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_explicit_config_path_wins() {
        let path = resolve_config_path(Some("/tmp/custom.toml"), Some("work")).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    fn test_profile_path_lives_in_profiles_dir() {
        let Ok(path) = get_profile_path("work") else {
            return; // No config dir on this machine.
        };
        assert!(path.ends_with(Path::new(PROFILES_DIR_NAME).join("work.toml")));
    }

    #[test]
    fn test_profile_names_are_validated() {
        assert!(matches!(
            get_profile_path("../escape"),
            Err(PathError::InvalidProfileName(_))
        ));
        assert!(is_valid_profile_name("work_2-laptop"));
        assert!(!is_valid_profile_name(""));
    }

    #[test]
    fn test_expand_user_path_expands_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let expanded = expand_user_path("~/entry.toml").unwrap();
        assert_eq!(expanded, home.join("entry.toml"));
    }

    #[test]
    fn test_profile_names_in_lists_only_toml_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("work.toml"), "").unwrap();
        fs::write(dir.path().join("home.toml"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("sub.toml")).unwrap();
        assert_eq!(profile_names_in(dir.path()), vec!["home", "work"]);
    }

    #[test]
    fn test_profile_names_in_missing_dir_is_empty() {
        assert!(profile_names_in(Path::new("no/such/profiles")).is_empty());
    }
}
