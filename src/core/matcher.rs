// src/core/matcher.rs

//! # Rule Matcher
//!
//! Evaluates the ordered rule list against a target (path or URL).
//!
//! Per rule, predicates are checked in a fixed order:
//!
//! 1. **OS** (precondition): if listed and the current OS is not among them, the rule
//!    is excluded.
//! 2. **Scheme** (precondition and predicate): if set, non-URLs and other schemes
//!    exclude the rule; a matching scheme matches immediately.
//! 3. **Extensions**, **regex**, **MIME**: alternatives, first success wins.
//! 4. **Script**: run for every rule that was not excluded. It is the last alternative
//!    when nothing above matched, and a veto when something did. Either way its answer
//!    is final, so a rejecting script never ends a `match_rules` chain.
//!
//! Script results travel with the selected rule in a [`Selection`], so a script runs
//! at most once per rule and target.

use crate::{
    core::{
        context::{self, CommandContext},
        script::{self, ScriptBindings, ScriptEngine, ScriptError, ScriptResult},
        sniff,
    },
    models::Rule,
};
use regex::Regex;
use std::{cell::OnceCell, collections::HashMap, path::Path};
use thiserror::Error;
use url::Url;

/// A rule carries a pattern that does not compile. Aborts the whole match call.
#[derive(Error, Debug)]
#[error("Invalid {field} pattern '{pattern}' in rule '{rule}': {source}")]
pub struct PatternError {
    /// Label of the offending rule.
    pub rule: String,
    /// `regex` or `mime`.
    pub field: &'static str,
    /// The pattern as written in the configuration.
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Anything that stops a match call.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("Script of rule '{rule}' failed: {source}")]
    Script {
        rule: String,
        #[source]
        source: ScriptError,
    },
}

/// A single predicate of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// The rule's `os` list.
    Os,
    /// The URL scheme.
    Scheme,
    /// The file extension list.
    Extension,
    /// A regex over the raw target.
    Regex,
    /// A regex over the sniffed MIME type.
    Mime,
    /// The rule's script.
    Script,
}

/// The state of one predicate after evaluating a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckState {
    Passed(String),
    Failed(String),
    /// Not evaluated because an earlier predicate already decided the rule.
    Skipped(String),
}

/// Why a rule was (or was not) selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A precondition (OS or scheme) failed, or the script vetoed a match.
    Excluded(Predicate),
    Matched(Predicate),
    NoMatch,
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

/// Full evaluation record for one rule, used by the explain view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTrace {
    pub checks: Vec<(Predicate, CheckState)>,
    pub verdict: Verdict,
    /// What the rule's script returned, when it ran.
    pub script: Option<ScriptResult>,
}

/// A matched rule and what its script decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'r> {
    pub rule: &'r Rule,
    pub script: Option<ScriptResult>,
}

impl Selection<'_> {
    /// The command to run: the script's command if it returned one, else the rule's.
    pub fn command(&self) -> &str {
        self.script
            .as_ref()
            .and_then(ScriptResult::command)
            .unwrap_or(self.rule.command.as_str())
    }
}

/// Facts about a target computed once per match call.
#[derive(Debug)]
pub struct Subject<'t> {
    raw: &'t str,
    url: Option<Url>,
    extension: String,
    mime: OnceCell<Option<String>>,
    scripts: &'t dyn ScriptEngine,
    bindings: OnceCell<(CommandContext, HashMap<String, String>)>,
}

impl<'t> Subject<'t> {
    /// Prepares `target` for matching. Rule scripts run on `scripts`.
    pub fn new(target: &'t str, scripts: &'t dyn ScriptEngine) -> Self {
        let url = context::parse_url(target);
        let ext_source = match &url {
            Some(u) => context::extension_of(u.path()).to_string(),
            None => context::extension_of(target).to_string(),
        };
        let extension = normalize_extension(&ext_source);
        Self {
            raw: target,
            url,
            extension,
            mime: OnceCell::new(),
            scripts,
            bindings: OnceCell::new(),
        }
    }

    pub fn is_url(&self) -> bool {
        self.url.is_some()
    }

    pub fn scheme(&self) -> Option<&str> {
        self.url.as_ref().map(Url::scheme)
    }

    /// Lower-cased extension without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Sniffed MIME type, detected at most once. `None` for URLs and unreadable files.
    pub fn mime(&self) -> Option<&str> {
        self.mime
            .get_or_init(|| {
                if self.is_url() {
                    None
                } else {
                    sniff::detect_mime(Path::new(self.raw))
                }
            })
            .as_deref()
    }

    /// Script bindings and the environment snapshot are built on the first script.
    fn run_script(&self, source: &str) -> Result<ScriptResult, ScriptError> {
        let (context, env) = self.bindings.get_or_init(|| {
            (
                CommandContext::from_target(self.raw),
                script::environment_snapshot(),
            )
        });
        self.scripts
            .evaluate(source, &ScriptBindings::new(context, env))
    }
}

/// Returns true if the single rule matches the target.
pub fn matches_rule(
    rule: &Rule,
    target: &str,
    scripts: &dyn ScriptEngine,
) -> Result<bool, MatchError> {
    let subject = Subject::new(target, scripts);
    Ok(explain_rule(rule, &subject)?.verdict.is_match())
}

/// Evaluates rules in order, stopping after the first match whose `fallthrough` is false.
pub fn match_rules<'r>(
    rules: &'r [Rule],
    target: &str,
    scripts: &dyn ScriptEngine,
) -> Result<Vec<Selection<'r>>, MatchError> {
    let subject = Subject::new(target, scripts);
    let mut matched = Vec::new();
    for rule in rules {
        let Some(selection) = select(rule, &subject)? else {
            continue;
        };
        log::debug!("Rule '{}' matched '{}'", rule.label(), target);
        matched.push(selection);
        if !rule.fallthrough {
            break;
        }
    }
    Ok(matched)
}

/// Collects every rule that matches on its own, ignoring `fallthrough`.
pub fn match_all<'r>(
    rules: &'r [Rule],
    target: &str,
    scripts: &dyn ScriptEngine,
) -> Result<Vec<Selection<'r>>, MatchError> {
    let subject = Subject::new(target, scripts);
    let mut matched = Vec::new();
    for rule in rules {
        if let Some(selection) = select(rule, &subject)? {
            matched.push(selection);
        }
    }
    Ok(matched)
}

fn select<'r>(rule: &'r Rule, subject: &Subject<'_>) -> Result<Option<Selection<'r>>, MatchError> {
    let trace = explain_rule(rule, subject)?;
    if !trace.verdict.is_match() {
        return Ok(None);
    }
    Ok(Some(Selection {
        rule,
        script: trace.script,
    }))
}

/// Evaluates one rule against a subject, recording every predicate's state.
pub fn explain_rule(rule: &Rule, subject: &Subject<'_>) -> Result<RuleTrace, MatchError> {
    let mut checks = Vec::new();

    // --- Preconditions ---
    if !rule.os.is_empty() {
        let current = std::env::consts::OS;
        if rule.os.iter().any(|os| os_matches(os, current)) {
            checks.push((Predicate::Os, CheckState::Passed(current.to_string())));
        } else {
            checks.push((
                Predicate::Os,
                CheckState::Failed(format!("{} not in [{}]", current, rule.os.join(", "))),
            ));
            return Ok(RuleTrace {
                checks,
                verdict: Verdict::Excluded(Predicate::Os),
                script: None,
            });
        }
    }

    let mut decided: Option<Predicate> = None;

    if let Some(scheme) = non_empty(rule.scheme.as_deref()) {
        match subject.scheme() {
            Some(actual) if actual.eq_ignore_ascii_case(scheme) => {
                checks.push((Predicate::Scheme, CheckState::Passed(scheme.to_string())));
                decided = Some(Predicate::Scheme);
            }
            _ => {
                checks.push((Predicate::Scheme, CheckState::Failed(scheme.to_string())));
                return Ok(RuleTrace {
                    checks,
                    verdict: Verdict::Excluded(Predicate::Scheme),
                    script: None,
                });
            }
        }
    }

    // --- Alternatives ---
    if !rule.extensions.is_empty() {
        let listed = format!("[{}]", rule.extensions.join(", "));
        if decided.is_some() {
            checks.push((Predicate::Extension, CheckState::Skipped(listed)));
        } else if rule
            .extensions
            .iter()
            .any(|ext| normalize_extension(ext) == subject.extension())
        {
            checks.push((
                Predicate::Extension,
                CheckState::Passed(format!(".{}", subject.extension())),
            ));
            decided = Some(Predicate::Extension);
        } else {
            checks.push((Predicate::Extension, CheckState::Failed(listed)));
        }
    }

    if let Some(pattern) = non_empty(rule.regex.as_deref()) {
        if decided.is_some() {
            checks.push((Predicate::Regex, CheckState::Skipped(pattern.to_string())));
        } else if compile(rule, "regex", pattern)?.is_match(subject.raw) {
            checks.push((Predicate::Regex, CheckState::Passed(pattern.to_string())));
            decided = Some(Predicate::Regex);
        } else {
            checks.push((Predicate::Regex, CheckState::Failed(pattern.to_string())));
        }
    }

    if let Some(pattern) = non_empty(rule.mime.as_deref()) {
        if decided.is_some() || subject.is_url() {
            checks.push((Predicate::Mime, CheckState::Skipped(pattern.to_string())));
        } else {
            let re = compile(rule, "mime", pattern)?;
            match subject.mime() {
                Some(mime) if re.is_match(mime) => {
                    checks.push((Predicate::Mime, CheckState::Passed(mime.to_string())));
                    decided = Some(Predicate::Mime);
                }
                Some(mime) => checks.push((
                    Predicate::Mime,
                    CheckState::Failed(format!("{} !~ {}", mime, pattern)),
                )),
                None => checks.push((
                    Predicate::Mime,
                    CheckState::Failed(format!("{} (unreadable)", pattern)),
                )),
            }
        }
    }

    // --- Script ---
    let mut script_result = None;
    if let Some(source) = rule.script_source() {
        let result = subject
            .run_script(source)
            .map_err(|source| MatchError::Script {
                rule: rule.label().to_string(),
                source,
            })?;
        if result.is_match() {
            checks.push((Predicate::Script, CheckState::Passed(result.to_string())));
            decided.get_or_insert(Predicate::Script);
        } else {
            checks.push((Predicate::Script, CheckState::Failed(result.to_string())));
            if decided.is_some() {
                return Ok(RuleTrace {
                    checks,
                    verdict: Verdict::Excluded(Predicate::Script),
                    script: Some(result),
                });
            }
        }
        script_result = Some(result);
    }

    let verdict = match decided {
        Some(predicate) => Verdict::Matched(predicate),
        None => Verdict::NoMatch,
    };
    Ok(RuleTrace {
        checks,
        verdict,
        script: script_result,
    })
}

fn compile(rule: &Rule, field: &'static str, pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|source| PatternError {
        rule: rule.label().to_string(),
        field,
        pattern: pattern.to_string(),
        source,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

fn os_matches(listed: &str, current: &str) -> bool {
    let listed = listed.trim().to_lowercase();
    listed == current || (listed == "darwin" && current == "macos")
}
