// src/cli/dispatcher.rs

use anyhow::Result;
use clap::CommandFactory;

use crate::cli::{
    Cli,
    handlers::{self, commons::RunContext},
};

/// Defines a system command, its aliases, and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &RunContext) -> Result<()>,
}

/// The single source of truth for all system commands.
/// System commands start with `:` so they never shadow a file or program name.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: ":config",
        aliases: &[":cfg"],
        handler: handlers::config::handle,
    },
    CommandDefinition {
        name: ":history",
        aliases: &[":h"],
        handler: handlers::history::handle,
    },
    CommandDefinition {
        name: ":match",
        aliases: &[],
        handler: handlers::matching::handle,
    },
    CommandDefinition {
        name: ":version",
        aliases: &[],
        handler: handlers::version::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Entry point after argument parsing.
pub fn dispatch(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    if cli.args.is_empty() {
        Cli::command().print_help()?;
        return Ok(());
    }
    let ctx = RunContext::from_cli(&cli)?;
    dispatch_args(cli.args, &ctx)
}

/// Routes the positional arguments.
///
/// 1. `:command [args...]` runs a system command.
/// 2. A single target is explained, selected or resolved through the rules.
/// 3. Anything else runs as a command.
pub fn dispatch_args(args: Vec<String>, ctx: &RunContext) -> Result<()> {
    log::debug!("Dispatching args: {:?}", args);
    let Some((first, rest)) = args.split_first() else {
        return Ok(());
    };

    if let Some(command) = find_command(first) {
        return (command.handler)(rest.to_vec(), ctx);
    }

    if rest.is_empty() {
        if ctx.explain {
            return handlers::explain::handle(first, ctx);
        }
        if ctx.select {
            return handlers::select::handle(first, ctx);
        }
        return handlers::open::handle(first, ctx);
    }

    handlers::command::handle(args, ctx)
}
