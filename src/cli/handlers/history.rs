// src/cli/handlers/history.rs

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;

use crate::{
    cli::dispatcher,
    core::{history::JsonHistory, paths},
    models::HistoryEntry,
};

use super::commons::RunContext;

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Show or replay previously opened targets.")]
struct HistoryArgs {
    #[command(subcommand)]
    command: Option<HistoryCommand>,

    /// Re-run the entry with this number (1 is the most recent).
    #[arg(long, value_name = "N")]
    run: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// Removes every history entry.
    Clear,
}

/// Handles `et :history [--run <n>]` and `et :history clear`.
pub fn handle(args: Vec<String>, ctx: &RunContext) -> Result<()> {
    let history_args = HistoryArgs::try_parse_from(&args)?;
    let history = JsonHistory::new(paths::get_history_path()?);

    if let Some(HistoryCommand::Clear) = history_args.command {
        history.clear()?;
        println!("{}", t!("history.info.cleared").green());
        return Ok(());
    }

    let entries = history.load()?;
    match history_args.run {
        Some(number) => rerun(&entries, number, ctx),
        None => {
            list(&entries);
            Ok(())
        }
    }
}

fn list(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("{}", t!("history.info.empty").dimmed());
        return;
    }
    for line in format_entries(entries) {
        println!("{}", line);
    }
}

fn format_entries(entries: &[HistoryEntry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let when = entry
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S");
            let mut line = format!("{:>3}  {}  {}", i + 1, when.to_string().dimmed(), entry.command);
            if !entry.rule_name.is_empty() {
                line.push_str(&format!("  ({})", entry.rule_name.cyan()));
            }
            line
        })
        .collect()
}

fn rerun(entries: &[HistoryEntry], number: usize, ctx: &RunContext) -> Result<()> {
    let entry = number
        .checked_sub(1)
        .and_then(|i| entries.get(i))
        .ok_or_else(|| anyhow!(t!("history.error.no_entry"), number = number))?;
    let args = shlex::split(&entry.command)
        .filter(|args| !args.is_empty())
        .ok_or_else(|| anyhow!(t!("history.error.unparsable"), command = entry.command))?;

    log::debug!("Re-running history entry #{}: {:?}", number, args);
    dispatcher::dispatch_args(args, ctx)
        .with_context(|| format!(t!("history.error.rerun_failed"), number = number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(command: &str, rule_name: &str) -> HistoryEntry {
        HistoryEntry {
            timestamp: Utc::now(),
            command: command.to_string(),
            rule_name: rule_name.to_string(),
        }
    }

    #[test]
    fn test_format_entries_numbers_from_one() {
        let lines = format_entries(&[entry("b.md", "Markdown"), entry("a.txt", "")]);
        assert!(lines[0].starts_with("  1"));
        assert!(lines[0].contains("b.md"));
        assert!(lines[0].contains("Markdown"));
        assert!(lines[1].starts_with("  2"));
        assert!(!lines[1].contains('('));
    }

    #[test]
    fn test_rerun_rejects_out_of_range_numbers() {
        let ctx = RunContext::default();
        let entries = vec![entry("a.txt", "")];
        assert!(rerun(&entries, 0, &ctx).is_err());
        assert!(rerun(&entries, 2, &ctx).is_err());
    }

    #[test]
    fn test_history_args_parse() {
        let args = HistoryArgs::try_parse_from(["--run", "3"]).unwrap();
        assert_eq!(args.run, Some(3));
        let args = HistoryArgs::try_parse_from(["clear"]).unwrap();
        assert!(matches!(args.command, Some(HistoryCommand::Clear)));
    }
}
