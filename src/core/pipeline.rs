// src/core/pipeline.rs

//! # Action Resolution Pipeline
//!
//! Turns one target into zero or more executions:
//!
//! 1. `match_rules` selects the ordered chain of matching rules. Rule scripts run
//!    there, so a rule whose script rejects the target is never part of the chain.
//! 2. Each selection runs through [`Pipeline::run_rule`]: the effective command (the
//!    script's, else the rule's) is rendered and handed to the executor.
//! 3. With no selected rule, an existing path or URL goes to the default command or
//!    the system opener; anything else is [`Resolution::Unresolved`], letting the
//!    caller reinterpret the input as a command.
//!
//! The first error aborts the chain. Rules already executed are not undone.

use crate::{
    constants::DEFAULT_COMMAND_LABEL,
    core::{
        context::{self, CommandContext},
        matcher::{self, MatchError, Selection},
        script::ScriptEngine,
        templater::{self, TemplateError},
    },
    models::Config,
    system::executor::{ExecutionError, ExecutionOptions, Executor},
};
use std::{fmt, io::Write};
use thiserror::Error;

/// Any failure that stops a resolution. Wraps the underlying error unchanged.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// How a target was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// One or more matched rules were handled.
    Rules { handled: usize },
    DefaultCommand,
    SystemOpener,
    /// No rule applied and the target is neither an existing path nor a URL.
    Unresolved,
}

/// What happened to a single selected rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// A command was dispatched to the executor.
    Executed,
    /// The rule matched but has no command to run.
    NoAction,
}

/// Resolves targets against one configuration.
pub struct Pipeline<'a, W: Write> {
    config: &'a Config,
    executor: &'a mut Executor<W>,
    scripts: &'a dyn ScriptEngine,
}

impl<W: Write> fmt::Debug for Pipeline<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("rules", &self.config.rules.len())
            .field("executor", &self.executor)
            .field("scripts", &self.scripts)
            .finish()
    }
}

impl<'a, W: Write> Pipeline<'a, W> {
    pub fn new(
        config: &'a Config,
        executor: &'a mut Executor<W>,
        scripts: &'a dyn ScriptEngine,
    ) -> Self {
        Self {
            config,
            executor,
            scripts,
        }
    }

    /// Resolves and executes a single target.
    pub fn resolve(&mut self, target: &str) -> Result<Resolution, ResolveError> {
        let config = self.config;
        let matched = matcher::match_rules(&config.rules, target, self.scripts)?;
        log::debug!("Found {} matching rule(s) for '{}'", matched.len(), target);

        if !matched.is_empty() {
            let ctx = CommandContext::from_target(target);
            for selection in &matched {
                self.run_rule(selection, &ctx).inspect_err(|e| {
                    log::error!("Rule '{}' failed: {}", selection.rule.label(), e);
                })?;
            }
            return Ok(Resolution::Rules {
                handled: matched.len(),
            });
        }

        if context::is_file_or_url(target) {
            return self.run_fallback(target);
        }
        log::debug!("'{}' is not a file or URL and matched no rule", target);
        Ok(Resolution::Unresolved)
    }

    /// Runs one selected rule against a prepared context.
    pub fn run_rule(
        &mut self,
        selection: &Selection<'_>,
        ctx: &CommandContext,
    ) -> Result<RuleOutcome, ResolveError> {
        let rule = selection.rule;
        let command = selection.command();
        if command.trim().is_empty() {
            log::debug!("Rule '{}' matched but has no command to execute", rule.label());
            return Ok(RuleOutcome::NoAction);
        }

        let rendered = templater::render(command, ctx)?;
        let options = ExecutionOptions {
            background: rule.background,
            terminal: rule.terminal,
        };
        self.executor.run_shell(&rendered, options, rule.label())?;
        Ok(RuleOutcome::Executed)
    }

    /// Runs the default command, or the system opener when none is configured.
    pub fn run_fallback(&mut self, target: &str) -> Result<Resolution, ResolveError> {
        match self.config.default_command() {
            Some(template) => {
                log::debug!("Executing with default command: {}", template);
                let ctx = CommandContext::from_target(target);
                let rendered = templater::render(template, &ctx)?;
                self.executor.run_shell(
                    &rendered,
                    ExecutionOptions::default(),
                    DEFAULT_COMMAND_LABEL,
                )?;
                Ok(Resolution::DefaultCommand)
            }
            None => {
                log::debug!("Opening '{}' with the system default", target);
                self.executor.open_system(target)?;
                Ok(Resolution::SystemOpener)
            }
        }
    }
}
