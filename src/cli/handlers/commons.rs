// src/cli/handlers/commons.rs

// Shared setup used by multiple handlers.

use anyhow::{Context, Result};
use std::{io, path::PathBuf};

use crate::{
    cli::Cli,
    core::{
        config_loader,
        history::{HistoryRecorder, JsonHistory, NoHistory},
        paths,
    },
    models::Config,
    system::executor::Executor,
};

/// Explicit per-invocation state handed to every handler.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub config_path: PathBuf,
    pub dry_run: bool,
    pub select: bool,
    pub explain: bool,
}

impl RunContext {
    /// Resolves the configuration path from the global flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config_path = paths::resolve_config_path(cli.config.as_deref(), cli.profile.as_deref())
            .context(t!("config.error.path_unresolved"))?;
        log::debug!("Config path: {}", config_path.display());
        Ok(Self {
            config_path,
            dry_run: cli.dry_run,
            select: cli.select,
            explain: cli.explain,
        })
    }

    pub fn load_config(&self) -> Result<Config> {
        Ok(config_loader::load_config(&self.config_path)?)
    }

    /// An executor bound to stdout, recording `origin` in the history file on success.
    pub fn executor(&self, config: &Config, origin: &[String]) -> Executor<io::Stdout> {
        let mut executor = Executor::stdout(self.dry_run)
            .with_history(self.history_recorder())
            .with_terminal_launcher(config.terminal_command().map(str::to_string));
        executor.set_origin(history_line(origin));
        executor
    }

    fn history_recorder(&self) -> Box<dyn HistoryRecorder> {
        if self.dry_run {
            return Box::new(NoHistory);
        }
        match paths::get_history_path() {
            Ok(path) => Box::new(JsonHistory::new(path)),
            Err(e) => {
                log::warn!("History is disabled: {}", e);
                Box::new(NoHistory)
            }
        }
    }
}

/// Joins arguments into one shell-quoted line, so it can be split back for a re-run.
pub fn history_line(args: &[String]) -> String {
    shlex::try_join(args.iter().map(String::as_str)).unwrap_or_else(|_| args.join(" "))
}
