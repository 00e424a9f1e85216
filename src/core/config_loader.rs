//! # Config Loader
//!
//! Reads, validates and writes the TOML configuration holding the ordered rule list,
//! the default command, the terminal launcher and the command aliases.
//!
//! Loading never validates patterns: the matcher reports a bad pattern when a rule is
//! actually evaluated. `validate_config` is the eager check behind `:config check` and
//! the write path of `:config add`.

use crate::{
    constants::CONFIG_VERSION,
    core::templater,
    models::{Config, Rule},
};
use regex::Regex;
use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Config file not found at '{0}'. Run `et :config init` to create one.")]
    NotFound(PathBuf),
    #[error("Could not access config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A rule failed eager validation. `index` is 1-based, as shown by `:config list`.
    #[error("Rule #{index} ('{label}') is invalid: {reason}")]
    InvalidRule {
        index: usize,
        label: String,
        reason: String,
    },
    #[error("Config file '{0}' already exists.")]
    AlreadyExists(PathBuf),
    #[error(transparent)]
    Path(#[from] crate::core::paths::PathError),
}

/// Loads and parses the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "Loaded config '{}' with {} rule(s)",
        path.display(),
        config.rules.len()
    );
    Ok(config)
}

/// Writes the configuration as pretty TOML, creating parent directories as needed.
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let toml_string = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    fs::write(path, toml_string).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Saved config '{}'", path.display());
    Ok(())
}

/// Checks every rule eagerly: patterns must compile and templates must parse.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    for (i, rule) in config.rules.iter().enumerate() {
        validate_rule(rule).map_err(|reason| ConfigError::InvalidRule {
            index: i + 1,
            label: rule.label().to_string(),
            reason,
        })?;
    }
    if let Some(template) = config.default_command() {
        templater::validate(template).map_err(|e| ConfigError::InvalidRule {
            index: 0,
            label: "default_command".to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

/// Returns the first problem found in a single rule, if any.
pub fn validate_rule(rule: &Rule) -> Result<(), String> {
    if let Some(pattern) = rule.regex.as_deref().filter(|p| !p.is_empty()) {
        Regex::new(pattern).map_err(|e| format!("invalid regex: {}", e))?;
    }
    if let Some(pattern) = rule.mime.as_deref().filter(|p| !p.is_empty()) {
        Regex::new(pattern).map_err(|e| format!("invalid mime pattern: {}", e))?;
    }
    if !rule.command.is_empty() {
        templater::validate(&rule.command).map_err(|e| e.to_string())?;
    }
    if rule.command.trim().is_empty() && rule.script_source().is_none() {
        return Err("a rule needs a command or a script".to_string());
    }
    let has_predicate = !rule.extensions.is_empty()
        || rule.regex.as_deref().is_some_and(|p| !p.is_empty())
        || rule.mime.as_deref().is_some_and(|p| !p.is_empty())
        || rule.scheme.as_deref().is_some_and(|p| !p.is_empty())
        || rule.script_source().is_some();
    if !has_predicate {
        return Err("the rule has no extensions, regex, mime, scheme or script and never matches".to_string());
    }
    Ok(())
}

/// Writes a starter configuration to `path`. Fails if the file already exists.
pub fn init_config(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    let config = starter_config();
    save_config(path, &config)?;
    Ok(config)
}

/// A small, working configuration for first-time users.
pub fn starter_config() -> Config {
    let (editor, viewer) = if cfg!(target_os = "windows") {
        ("notepad {{.File}}", "type {{.File}}")
    } else {
        ("vi {{.File}}", "cat {{.File}}")
    };

    let mut aliases = BTreeMap::new();
    aliases.insert("ll".to_string(), "ls -la".to_string());

    Config {
        version: CONFIG_VERSION.to_string(),
        default_command: Some(editor.to_string()),
        terminal_command: None,
        aliases,
        rules: vec![
            Rule {
                name: Some("Text".to_string()),
                extensions: vec!["txt".to_string(), "log".to_string()],
                command: viewer.to_string(),
                ..Default::default()
            },
            Rule {
                name: Some("Markdown".to_string()),
                extensions: vec!["md".to_string()],
                command: editor.to_string(),
                ..Default::default()
            },
        ],
    }
}
