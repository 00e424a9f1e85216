// src/cli/handlers/explain.rs

//! # Explain View
//!
//! `et --explain <target>` shows what the matcher sees for a target and how each rule
//! evaluates, without executing any command. Rule scripts do run, since they are part
//! of matching. Per predicate: `✓` passed, `✗` failed, `○` not evaluated because an
//! earlier predicate already decided the rule.

use anyhow::Result;
use colored::*;

use crate::{
    core::{
        context,
        matcher::{self, CheckState, Predicate, Subject, Verdict},
        script::{RhaiEngine, ScriptEngine},
    },
    models::Config,
};

use super::commons::RunContext;

pub fn handle(target: &str, ctx: &RunContext) -> Result<()> {
    let config = ctx.load_config()?;
    print!("{}", render_explanation(&config, target, &RhaiEngine::new()));
    Ok(())
}

/// Builds the full explanation text for a target.
pub fn render_explanation(config: &Config, target: &str, scripts: &dyn ScriptEngine) -> String {
    let subject = Subject::new(target, scripts);
    let mut lines = vec![format!(
        "{} {}",
        t!("explain.header.target").bold(),
        target.cyan()
    )];

    if subject.is_url() {
        lines.push(format!(
            "  {:<11}URL ({})",
            "type:",
            subject.scheme().unwrap_or_default()
        ));
    } else {
        let existence = if context::target_exists(target) {
            t!("explain.info.exists")
        } else {
            t!("explain.info.missing")
        };
        lines.push(format!("  {:<11}file ({})", "type:", existence));
    }
    lines.push(format!(
        "  {:<11}{}",
        "extension:",
        display_extension(subject.extension())
    ));
    if !subject.is_url() {
        lines.push(format!("  {:<11}{}", "mime:", subject.mime().unwrap_or("-")));
    }

    lines.push(String::new());
    lines.push(t!("explain.header.rules").bold().to_string());
    if config.rules.is_empty() {
        lines.push(format!("  {}", t!("explain.info.no_rules").dimmed()));
    }

    let mut match_failure = None;
    for (i, rule) in config.rules.iter().enumerate() {
        match matcher::explain_rule(rule, &subject) {
            Ok(trace) => {
                let verdict = match trace.verdict {
                    Verdict::Matched(_) => "MATCH".green().bold(),
                    Verdict::Excluded(_) => "SKIP".yellow(),
                    Verdict::NoMatch => "-".dimmed(),
                };
                lines.push(format!("  #{} {}  {}", i + 1, rule.label(), verdict));
                for (predicate, state) in &trace.checks {
                    lines.push(format!("      {}", check_line(*predicate, state)));
                }
            }
            Err(e) => {
                lines.push(format!(
                    "  #{} {}  {}",
                    i + 1,
                    rule.label(),
                    "ERROR".red().bold()
                ));
                lines.push(format!("      {} {}", "✗".red(), e));
                match_failure.get_or_insert(e.to_string());
            }
        }
    }

    let result = match match_failure {
        Some(error) => format!(t!("explain.result.pattern_error"), error = error),
        None => result_line(config, target, scripts),
    };
    lines.push(String::new());
    lines.push(format!("{} {}", t!("explain.header.result").bold(), result));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn result_line(config: &Config, target: &str, scripts: &dyn ScriptEngine) -> String {
    let matched = match matcher::match_rules(&config.rules, target, scripts) {
        Ok(matched) => matched,
        Err(e) => return format!(t!("explain.result.pattern_error"), error = e),
    };
    if !matched.is_empty() {
        let labels: Vec<&str> = matched.iter().map(|s| s.rule.label()).collect();
        return format!(t!("explain.result.rules"), rules = labels.join(", "));
    }
    if context::is_file_or_url(target) {
        return match config.default_command() {
            Some(command) => format!(t!("explain.result.default_command"), command = command),
            None => t!("explain.result.system_opener").to_string(),
        };
    }
    t!("explain.result.unresolved").to_string()
}

fn check_line(predicate: Predicate, state: &CheckState) -> String {
    let name = match predicate {
        Predicate::Os => "os",
        Predicate::Scheme => "scheme",
        Predicate::Extension => "extension",
        Predicate::Regex => "regex",
        Predicate::Mime => "mime",
        Predicate::Script => "script",
    };
    match state {
        CheckState::Passed(detail) => format!("{} {:<10} {}", "✓".green(), name, detail),
        CheckState::Failed(detail) => format!("{} {:<10} {}", "✗".red(), name, detail),
        CheckState::Skipped(detail) => {
            format!("{} {:<10} {}", "○".dimmed(), name, detail.dimmed())
        }
    }
}

fn display_extension(ext: &str) -> String {
    if ext.is_empty() {
        "-".to_string()
    } else {
        format!(".{}", ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rule;

    fn sample_config() -> Config {
        Config {
            rules: vec![
                Rule {
                    name: Some("Web".to_string()),
                    scheme: Some("https".to_string()),
                    command: "firefox {{.File}}".to_string(),
                    ..Default::default()
                },
                Rule {
                    name: Some("Markdown".to_string()),
                    extensions: vec!["md".to_string()],
                    regex: Some("notes".to_string()),
                    command: "vim {{.File}}".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_explain_marks_matching_and_skipped_rules() {
        let text = render_explanation(&sample_config(), "notes/today.md", &RhaiEngine);
        assert!(text.contains("#1 Web"));
        assert!(text.contains("SKIP"));
        assert!(text.contains("#2 Markdown"));
        assert!(text.contains("MATCH"));
        assert!(text.contains("✓"));
        assert!(text.contains("○"));
        assert!(text.contains("Markdown"));
        assert!(text.contains("file ("));
    }

    #[test]
    fn test_explain_url_target() {
        let text = render_explanation(&sample_config(), "https://example.com/a.md", &RhaiEngine);
        assert!(text.contains("URL (https)"));
        assert!(text.contains("Web"));
    }

    #[test]
    fn test_explain_unresolved_target() {
        let text = render_explanation(&Config::default(), "no-such-thing-anywhere", &RhaiEngine);
        assert!(text.contains(t!("explain.info.no_rules")));
        assert!(text.contains(t!("explain.result.unresolved")));
    }

    #[test]
    fn test_explain_reports_invalid_pattern() {
        let config = Config {
            rules: vec![Rule {
                name: Some("Broken".to_string()),
                regex: Some("([".to_string()),
                command: "x".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let text = render_explanation(&config, "a.txt", &RhaiEngine);
        assert!(text.contains("ERROR"));
        assert!(text.contains("Broken"));
    }

    #[test]
    fn test_explain_shows_script_verdict() {
        let config = Config {
            rules: vec![
                Rule {
                    name: Some("Gate".to_string()),
                    extensions: vec!["txt".to_string()],
                    script: Some("false".to_string()),
                    command: "never".to_string(),
                    ..Default::default()
                },
                Rule {
                    name: Some("Text".to_string()),
                    extensions: vec!["txt".to_string()],
                    command: "cat {{.File}}".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let text = render_explanation(&config, "a.txt", &RhaiEngine);
        assert!(text.contains("returned false"));
        let expected = format!(t!("explain.result.rules"), rules = "Text");
        assert!(text.trim_end().ends_with(&expected));
    }
}
