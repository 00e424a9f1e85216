// src/cli/handlers/matching.rs

use anyhow::{Result, anyhow};
use clap::Parser;

use crate::core::{matcher, script::RhaiEngine};

use super::commons::RunContext;

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Print the first rule matching a target.")]
struct MatchArgs {
    /// The file path or URL to test.
    target: String,
}

/// Handles `et :match <target>`.
pub fn handle(args: Vec<String>, ctx: &RunContext) -> Result<()> {
    let match_args = MatchArgs::try_parse_from(&args)?;
    let config = ctx.load_config()?;

    let engine = RhaiEngine::new();
    let matched = matcher::match_rules(&config.rules, &match_args.target, &engine)?;
    let first = matched
        .first()
        .ok_or_else(|| anyhow!(t!("match.error.no_match"), target = match_args.target))?;
    println!("{}", first.rule.label());
    Ok(())
}
