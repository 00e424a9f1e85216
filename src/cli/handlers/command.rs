// src/cli/handlers/command.rs

use anyhow::{Result, anyhow};
use std::io::Write;

use crate::{
    core::{pipeline::Pipeline, script::RhaiEngine},
    models::Config,
    system::executor::Executor,
};

use super::commons::RunContext;

/// Handles `et <program> [args...]`.
pub fn handle(args: Vec<String>, ctx: &RunContext) -> Result<()> {
    let config = ctx.load_config()?;
    let mut executor = ctx.executor(&config, &args);
    run(&config, &mut executor, &args)
}

/// Runs the input as a command.
///
/// Aliases are expanded first. A single word that is not a program on `PATH` is
/// taken as a new file and opened with the default command, if one is configured.
pub fn run<W: Write>(config: &Config, executor: &mut Executor<W>, args: &[String]) -> Result<()> {
    let Some((program, rest)) = args.split_first() else {
        return Ok(());
    };

    if let Some(alias) = config.aliases.get(program) {
        let mut parts = shlex::split(alias)
            .filter(|parts| !parts.is_empty())
            .ok_or_else(|| anyhow!(t!("command.error.bad_alias"), name = program))?;
        parts.extend(rest.iter().cloned());
        let Some((aliased, alias_args)) = parts.split_first() else {
            return Ok(());
        };
        log::debug!("Alias '{}' expands to '{}'", program, alias);
        executor.execute_command(aliased, alias_args)?;
        return Ok(());
    }

    if rest.is_empty() && config.default_command().is_some() && which::which(program).is_err() {
        log::debug!(
            "'{}' is not a command on PATH; opening it as a new file",
            program
        );
        let engine = RhaiEngine::new();
        Pipeline::new(config, executor, &engine).run_fallback(program)?;
        return Ok(());
    }

    executor.execute_command(program, rest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn run_dry(config: &Config, args: &[&str]) -> String {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let mut executor = Executor::new(Vec::new(), true);
        run(config, &mut executor, &args).unwrap();
        String::from_utf8(executor.into_output()).unwrap()
    }

    #[test]
    fn test_alias_expands_and_keeps_extra_args() {
        let mut aliases = BTreeMap::new();
        aliases.insert("ll".to_string(), "ls -la".to_string());
        let config = Config {
            aliases,
            ..Default::default()
        };
        assert_eq!(run_dry(&config, &["ll", "/tmp"]), "ls -la /tmp\n");
    }

    #[test]
    fn test_unknown_single_word_uses_default_command() {
        let config = Config {
            default_command: Some("vi {{.File}}".to_string()),
            ..Default::default()
        };
        assert_eq!(
            run_dry(&config, &["brand-new-notes-file.md"]),
            "vi brand-new-notes-file.md\n"
        );
    }

    #[test]
    fn test_unknown_word_without_default_runs_as_command() {
        assert_eq!(
            run_dry(&Config::default(), &["no-such-tool-here", "x"]),
            "no-such-tool-here x\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_known_program_runs_as_command_even_with_default() {
        let config = Config {
            default_command: Some("vi {{.File}}".to_string()),
            ..Default::default()
        };
        assert_eq!(run_dry(&config, &["sh"]), "sh\n");
    }
}
