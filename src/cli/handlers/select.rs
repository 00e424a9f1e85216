// src/cli/handlers/select.rs

use anyhow::{Result, anyhow};
use colored::*;
use dialoguer::{Select, theme::ColorfulTheme};

use crate::core::{
    context::{self, CommandContext},
    matcher::{self, Selection},
    pipeline::Pipeline,
    script::RhaiEngine,
};

use super::commons::RunContext;

/// One entry of the selection menu.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Choice<'r> {
    Rule(Selection<'r>),
    SystemDefault,
}

/// Handles `et --select <target>`: pick one of every matching rule interactively.
pub fn handle(target: &str, ctx: &RunContext) -> Result<()> {
    let config = ctx.load_config()?;
    let engine = RhaiEngine::new();
    let matched = matcher::match_all(&config.rules, target, &engine)?;
    let choices = build_choices(matched, context::is_file_or_url(target));
    if choices.is_empty() {
        return Err(anyhow!(t!("select.error.no_candidates"), target = target));
    }

    let labels: Vec<String> = choices.iter().map(choice_label).collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(t!("select.prompt"), target = target))
        .items(&labels)
        .default(0)
        .interact_opt()?;

    let Some(index) = selection else {
        println!("{}", t!("common.info.operation_cancelled").dimmed());
        return Ok(());
    };
    let Some(choice) = choices.get(index) else {
        return Ok(());
    };

    let origin = vec![target.to_string()];
    let mut executor = ctx.executor(&config, &origin);
    let mut pipeline = Pipeline::new(&config, &mut executor, &engine);

    match choice {
        Choice::Rule(selection) => {
            let command_ctx = CommandContext::from_target(target);
            let outcome = pipeline.run_rule(selection, &command_ctx)?;
            log::debug!("Selected rule '{}': {:?}", selection.rule.label(), outcome);
        }
        Choice::SystemDefault => {
            pipeline.run_fallback(target)?;
        }
    }
    Ok(())
}

fn build_choices(matched: Vec<Selection<'_>>, file_or_url: bool) -> Vec<Choice<'_>> {
    let mut choices: Vec<Choice<'_>> = matched.into_iter().map(Choice::Rule).collect();
    if file_or_url {
        choices.push(Choice::SystemDefault);
    }
    choices
}

fn choice_label(choice: &Choice<'_>) -> String {
    match choice {
        Choice::Rule(selection) => match selection.rule.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!(t!("select.label.command"), command = selection.command()),
        },
        Choice::SystemDefault => t!("select.label.system_default").to_string(),
    }
}
