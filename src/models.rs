// src/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::CONFIG_VERSION;

fn is_false(value: &bool) -> bool {
    !*value
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

// --- `config.toml` MODELS ---

/// One ordered entry of the rule list: a match condition plus the action to run.
///
/// The OS list and the URL scheme are preconditions. `extensions`, `regex` and `mime`
/// are alternatives; any one of them succeeding makes the rule match. A `script` has
/// the last word: it can veto a static match, or match on its own when none applied.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Lower-cased extensions without the leading dot.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    /// Pattern matched against the raw target string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Pattern matched against the sniffed MIME type of a local file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    /// URL scheme; its presence makes the rule URL-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub os: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub background: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub terminal: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub fallthrough: bool,
    /// Command template; may be empty when the script supplies the command.
    #[serde(default)]
    pub command: String,
    /// Embedded script deciding the match (and optionally the command) at runtime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

impl Rule {
    /// The label shown to users: the rule name, or its command when unnamed.
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.command,
        }
    }

    /// Returns the script source if it is set and not blank.
    pub fn script_source(&self) -> Option<&str> {
        self.script.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Represents the deserialized structure of a `config.toml` file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    /// Template run when no rule handles an existing file or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_command: Option<String>,
    /// Launcher prefix used for rules flagged `terminal` (e.g. `x-terminal-emulator -e`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_command: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            default_command: None,
            terminal_command: None,
            aliases: BTreeMap::new(),
            rules: Vec::new(),
        }
    }
}

impl Config {
    /// The default command template, ignoring blank values.
    pub fn default_command(&self) -> Option<&str> {
        self.default_command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
    }

    /// The terminal launcher, ignoring blank values.
    pub fn terminal_command(&self) -> Option<&str> {
        self.terminal_command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
    }
}

// --- HISTORY MODELS ---

/// A single record in `history.json`, newest first.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    /// The input line as typed (target or command), shell-quoted.
    pub command: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rule_name: String,
}
