// src/cli/handlers/config.rs

//! # Config Handler
//!
//! `et :config <subcommand>` inspects and edits the active configuration file.
//! Every write goes through `validate_rule`/`validate_config` first, so a saved file
//! never contains a pattern or template the matcher would later reject.

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::Path;

use crate::{
    core::{config_loader, paths},
    models::{Config, Rule},
};

use super::commons::RunContext;

/// Profile name that refers to the base `config.toml`.
const BASE_PROFILE: &str = "default";

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Inspect and edit the configuration.")]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Prints the path of the active configuration file.
    Path,
    /// Prints the active configuration.
    #[command(name = "list", aliases = ["ls"])]
    List,
    /// Writes a starter configuration file.
    Init,
    /// Validates every rule pattern and template.
    Check,
    /// Appends a rule.
    Add(AddArgs),
    /// Removes the rule with the given number (as shown by `list`).
    #[command(name = "remove", aliases = ["rm"])]
    Remove { index: usize },
    /// Sets the command used when no rule matches a file or URL.
    SetDefault { command: String },
    /// Lists the available profiles.
    Profiles,
    /// Copies one profile to a new one. `default` names the base configuration.
    CopyProfile { from: String, to: String },
}

#[derive(Args, Debug)]
struct AddArgs {
    /// Extensions to match, comma-separated (e.g. `pdf,epub`).
    #[arg(long, value_delimiter = ',')]
    ext: Vec<String>,
    /// Command template to run (e.g. `zathura {{.File}}`).
    #[arg(long)]
    cmd: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    regex: Option<String>,
    #[arg(long)]
    mime: Option<String>,
    #[arg(long)]
    scheme: Option<String>,
    /// Operating systems the rule applies to, comma-separated.
    #[arg(long, value_delimiter = ',')]
    os: Vec<String>,
    #[arg(long)]
    terminal: bool,
    #[arg(long)]
    background: bool,
    #[arg(long)]
    fallthrough: bool,
}

impl AddArgs {
    fn into_rule(self) -> Rule {
        Rule {
            name: self.name.filter(|n| !n.trim().is_empty()),
            extensions: self
                .ext
                .into_iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            regex: self.regex,
            mime: self.mime,
            scheme: self.scheme,
            os: self.os,
            background: self.background,
            terminal: self.terminal,
            fallthrough: self.fallthrough,
            command: self.cmd,
            script: None,
        }
    }
}

/// Handles `et :config <subcommand>`. Without a subcommand, lists the configuration.
pub fn handle(args: Vec<String>, ctx: &RunContext) -> Result<()> {
    let config_args = ConfigArgs::try_parse_from(&args)?;
    let path = ctx.config_path.as_path();

    match config_args.command.unwrap_or(ConfigCommand::List) {
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommand::List => list_config(path),
        ConfigCommand::Init => init_config(path),
        ConfigCommand::Check => check_config(path),
        ConfigCommand::Add(add_args) => add_rule(path, add_args.into_rule()),
        ConfigCommand::Remove { index } => remove_rule(path, index),
        ConfigCommand::SetDefault { command } => set_default(path, &command),
        ConfigCommand::Profiles => list_profiles(),
        ConfigCommand::CopyProfile { from, to } => copy_profile(&from, &to),
    }
}

// --- Subcommand Logic ---

fn list_config(path: &Path) -> Result<()> {
    let config = config_loader::load_config(path)?;
    println!("{} {}", "#".dimmed(), path.display().to_string().dimmed());
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn init_config(path: &Path) -> Result<()> {
    config_loader::init_config(path)?;
    println!(
        "{}",
        format!(t!("config.info.initialized"), path = path.display()).green()
    );
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let config = config_loader::load_config(path)?;
    config_loader::validate_config(&config)?;
    println!(
        "{}",
        format!(t!("config.info.valid"), count = config.rules.len()).green()
    );
    Ok(())
}

fn add_rule(path: &Path, rule: Rule) -> Result<()> {
    config_loader::validate_rule(&rule)
        .map_err(|reason| anyhow!(t!("config.error.invalid_new_rule"), reason = reason))?;

    let mut config = load_or_default(path)?;
    let label = rule.label().to_string();
    config.rules.push(rule);
    config_loader::save_config(path, &config)?;
    println!(
        "{}",
        format!(t!("config.info.rule_added"), label = label, index = config.rules.len()).green()
    );
    Ok(())
}

fn remove_rule(path: &Path, index: usize) -> Result<()> {
    let mut config = config_loader::load_config(path)?;
    let position = index
        .checked_sub(1)
        .filter(|i| *i < config.rules.len())
        .ok_or_else(|| {
            anyhow!(
                t!("config.error.no_such_rule"),
                index = index,
                count = config.rules.len()
            )
        })?;
    let removed = config.rules.remove(position);
    config_loader::save_config(path, &config)?;
    println!(
        "{}",
        format!(t!("config.info.rule_removed"), label = removed.label(), index = index).green()
    );
    Ok(())
}

fn set_default(path: &Path, command: &str) -> Result<()> {
    crate::core::templater::validate(command)?;
    let mut config = load_or_default(path)?;
    config.default_command = Some(command.to_string());
    config_loader::save_config(path, &config)?;
    println!(
        "{}",
        format!(t!("config.info.default_set"), command = command).green()
    );
    Ok(())
}

fn list_profiles() -> Result<()> {
    let profiles = paths::list_profiles()?;
    println!("  {} {}", BASE_PROFILE.cyan(), t!("config.info.base_profile").dimmed());
    for name in profiles {
        println!("  {}", name.cyan());
    }
    Ok(())
}

fn copy_profile(from: &str, to: &str) -> Result<()> {
    let source = profile_path(from)?;
    let destination = profile_path(to)?;
    if destination.exists() {
        return Err(anyhow!(t!("config.error.profile_exists"), name = to));
    }

    let config = config_loader::load_config(&source)
        .with_context(|| format!(t!("config.error.profile_unreadable"), name = from))?;
    config_loader::save_config(&destination, &config)?;
    println!(
        "{}",
        format!(t!("config.info.profile_copied"), from = from, to = to).green()
    );
    Ok(())
}

fn profile_path(name: &str) -> Result<std::path::PathBuf> {
    if name == BASE_PROFILE {
        Ok(paths::get_default_config_path()?)
    } else {
        Ok(paths::get_profile_path(name)?)
    }
}

/// Loads the configuration, starting from an empty one if the file does not exist yet.
fn load_or_default(path: &Path) -> Result<Config> {
    match config_loader::load_config(path) {
        Ok(config) => Ok(config),
        Err(config_loader::ConfigError::NotFound(_)) => {
            log::debug!("Creating new config at '{}'", path.display());
            Ok(Config::default())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_path() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        (dir, path)
    }

    #[test]
    fn test_add_args_build_normalized_rule() {
        let args = ConfigArgs::try_parse_from([
            "add", "--ext", ".PDF,epub", "--cmd", "zathura {{.File}}", "--background",
        ])
        .unwrap();
        let Some(ConfigCommand::Add(add_args)) = args.command else {
            panic!("expected add");
        };
        let rule = add_args.into_rule();
        assert_eq!(rule.extensions, vec!["pdf", "epub"]);
        assert_eq!(rule.command, "zathura {{.File}}");
        assert!(rule.background);
        assert!(!rule.fallthrough);
    }

    #[test]
    fn test_add_requires_cmd() {
        assert!(ConfigArgs::try_parse_from(["add", "--ext", "pdf"]).is_err());
    }

    #[test]
    fn test_add_then_remove_rule() {
        let (_dir, path) = config_path();
        let rule = Rule {
            extensions: vec!["pdf".to_string()],
            command: "zathura {{.File}}".to_string(),
            ..Default::default()
        };
        add_rule(&path, rule).unwrap();
        assert_eq!(config_loader::load_config(&path).unwrap().rules.len(), 1);

        assert!(remove_rule(&path, 2).is_err());
        assert!(remove_rule(&path, 0).is_err());
        remove_rule(&path, 1).unwrap();
        assert!(config_loader::load_config(&path).unwrap().rules.is_empty());
    }

    #[test]
    fn test_add_rejects_invalid_regex_without_writing() {
        let (_dir, path) = config_path();
        let rule = Rule {
            regex: Some("([".to_string()),
            command: "cat {{.File}}".to_string(),
            ..Default::default()
        };
        assert!(add_rule(&path, rule).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_set_default_validates_template() {
        let (_dir, path) = config_path();
        assert!(set_default(&path, "vi {{.Nope}}").is_err());
        set_default(&path, "vi {{.File}}").unwrap();
        let config = config_loader::load_config(&path).unwrap();
        assert_eq!(config.default_command(), Some("vi {{.File}}"));
    }
}
