// src/system/executor.rs

//! Spawns rendered commands, or prints them in dry-run mode.
//!
//! Three entry points share one dry-run/foreground contract:
//! [`Executor::run_shell`] for rendered rule commands, [`Executor::execute_command`] for
//! raw program invocations, and [`Executor::open_system`] for the platform opener.

use crate::{
    constants::{BACKGROUND_MARKER, SYSTEM_OPENER_LABEL},
    core::history::{HistoryRecorder, NoHistory},
};
use std::fmt;
use std::io::{self, Write};
use std::process::{Child, Command as StdCommand, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command '{0}' could not be executed: {1}")]
    Spawn(String, #[source] io::Error),
    #[error("Command '{command}' exited with a non-zero status{}.", exit_suffix(.code))]
    NonZeroExit { command: String, code: Option<i32> },
    #[error("Could not write command output: {0}")]
    Output(#[source] io::Error),
    #[error("Terminal launcher '{0}' could not be parsed.")]
    TerminalLauncher(String),
    #[error("Command '{0}' could not be started in the background: {1}")]
    BackgroundSpawn(String, #[source] io::Error),
}

fn exit_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" ({})", c)).unwrap_or_default()
}

impl ExecutionError {
    /// The child's exit code, when the failure was a non-zero exit.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => *code,
            _ => None,
        }
    }
}

/// Per-call execution flags, taken from the rule being run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOptions {
    pub background: bool,
    pub terminal: bool,
}

/// Runs commands and writes dry-run lines (or captured child output) to `W`.
pub struct Executor<W: Write> {
    output: W,
    /// When true, children inherit the process stdout instead of writing into `output`.
    passthrough: bool,
    dry_run: bool,
    history: Box<dyn HistoryRecorder>,
    terminal_launcher: Option<String>,
    origin: Option<String>,
}

impl<W: Write> fmt::Debug for Executor<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("passthrough", &self.passthrough)
            .field("dry_run", &self.dry_run)
            .field("terminal_launcher", &self.terminal_launcher)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl Executor<io::Stdout> {
    /// An executor bound to the process stdout. Children inherit the terminal.
    pub fn stdout(dry_run: bool) -> Self {
        Self {
            passthrough: true,
            ..Self::new(io::stdout(), dry_run)
        }
    }
}

impl<W: Write> Executor<W> {
    /// An executor writing dry-run lines and child stdout into `output`.
    pub fn new(output: W, dry_run: bool) -> Self {
        Self {
            output,
            passthrough: false,
            dry_run,
            history: Box::new(NoHistory),
            terminal_launcher: None,
            origin: None,
        }
    }

    /// Sets where successful foreground runs are recorded.
    pub fn with_history(mut self, history: Box<dyn HistoryRecorder>) -> Self {
        self.history = history;
        self
    }

    /// Sets the launcher prefix used for `terminal` rules, e.g. `x-terminal-emulator -e`.
    pub fn with_terminal_launcher(mut self, launcher: Option<String>) -> Self {
        self.terminal_launcher = launcher.filter(|l| !l.trim().is_empty());
        self
    }

    /// Sets the text recorded in history for the executions that follow
    /// (the user's input rather than the rendered command).
    pub fn set_origin(&mut self, origin: impl Into<String>) {
        self.origin = Some(origin.into());
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs a rendered command line through the platform shell.
    pub fn run_shell(
        &mut self,
        command: &str,
        options: ExecutionOptions,
        rule_name: &str,
    ) -> Result<(), ExecutionError> {
        if self.dry_run {
            let marker = if options.background {
                BACKGROUND_MARKER
            } else {
                ""
            };
            return self.write_line(&format!("{}{}", command, marker));
        }

        if options.background {
            log::debug!("Starting '{}' in the background", command);
            return spawn_detached(shell_command(command), command);
        }

        let process = if options.terminal {
            self.terminal_command(command)?
        } else {
            shell_command(command)
        };
        log::debug!("Running '{}'", command);
        self.run_foreground(process, command)?;
        self.record(command, rule_name);
        Ok(())
    }

    /// Runs a program directly with arguments. No shell, no templating.
    pub fn execute_command(&mut self, program: &str, args: &[String]) -> Result<(), ExecutionError> {
        let display = display_line(program, args);
        if self.dry_run {
            return self.write_line(&display);
        }

        let mut process = StdCommand::new(program);
        process.args(args);
        log::debug!("Executing '{}'", display);
        self.run_foreground(process, &display)?;
        self.record(&display, "");
        Ok(())
    }

    /// Opens a path or URL with the platform's default handler.
    pub fn open_system(&mut self, target: &str) -> Result<(), ExecutionError> {
        let (program, mut args) = system_opener();
        args.push(target.to_string());
        let display = display_line(program, &args);
        if self.dry_run {
            return self.write_line(&display);
        }

        let mut process = StdCommand::new(program);
        process.args(&args);
        log::debug!("Opening '{}' with the system opener", target);
        self.run_foreground(process, &display)?;
        self.record(&display, SYSTEM_OPENER_LABEL);
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), ExecutionError> {
        writeln!(self.output, "{}", line).map_err(ExecutionError::Output)?;
        self.output.flush().map_err(ExecutionError::Output)
    }

    fn terminal_command(&self, command: &str) -> Result<StdCommand, ExecutionError> {
        let Some(launcher) = self.terminal_launcher.as_deref() else {
            log::warn!(
                "Rule requests a terminal but no 'terminal_command' is configured; running '{}' in the foreground.",
                command
            );
            return Ok(shell_command(command));
        };
        let parts = shlex::split(launcher)
            .filter(|parts| !parts.is_empty())
            .ok_or_else(|| ExecutionError::TerminalLauncher(launcher.to_string()))?;
        let Some((program, launcher_args)) = parts.split_first() else {
            return Err(ExecutionError::TerminalLauncher(launcher.to_string()));
        };

        let (shell, flag) = shell_program();
        let mut process = StdCommand::new(program);
        process
            .args(launcher_args)
            .arg(shell)
            .arg(flag)
            .arg(command);
        log::debug!("Launching '{}' in terminal '{}'", command, launcher);
        Ok(process)
    }

    fn run_foreground(&mut self, mut process: StdCommand, display: &str) -> Result<(), ExecutionError> {
        process.stdin(Stdio::inherit()).stderr(Stdio::inherit());
        if self.passthrough {
            process.stdout(Stdio::inherit());
        } else {
            process.stdout(Stdio::piped());
        }

        let mut child = process
            .spawn()
            .map_err(|e| ExecutionError::Spawn(display.to_string(), e))?;
        let status = self.drain_and_wait(&mut child, display)?;

        if !status.success() {
            return Err(ExecutionError::NonZeroExit {
                command: display.to_string(),
                code: status.code(),
            });
        }
        Ok(())
    }

    fn drain_and_wait(&mut self, child: &mut Child, display: &str) -> Result<ExitStatus, ExecutionError> {
        if let Some(mut stdout) = child.stdout.take() {
            if let Err(e) = io::copy(&mut stdout, &mut self.output) {
                // Reap the child before reporting, so it does not linger as a zombie.
                child.wait().ok();
                return Err(ExecutionError::Output(e));
            }
        }
        child
            .wait()
            .map_err(|e| ExecutionError::Spawn(display.to_string(), e))
    }

    fn record(&self, command: &str, rule_name: &str) {
        let entry = self.origin.as_deref().unwrap_or(command);
        if let Err(e) = self.history.record(entry, rule_name) {
            log::warn!("Could not record history: {}", e);
        }
    }
}

/// The platform shell and its "run this string" flag.
fn shell_program() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

fn shell_command(command: &str) -> StdCommand {
    let (shell, flag) = shell_program();
    let mut process = StdCommand::new(shell);
    process.arg(flag).arg(command);
    process
}

/// The platform opener program and its leading arguments.
fn system_opener() -> (&'static str, Vec<String>) {
    if cfg!(target_os = "macos") {
        ("open", Vec::new())
    } else if cfg!(target_os = "windows") {
        // `start` treats the first quoted argument as a window title.
        (
            "cmd",
            vec!["/c".to_string(), "start".to_string(), String::new()],
        )
    } else {
        ("xdg-open", Vec::new())
    }
}

/// The command as one printable line. Empty arguments show as `""`.
fn display_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(
            args.iter()
                .map(|arg| if arg.is_empty() { "\"\"" } else { arg.as_str() }),
        )
        .collect::<Vec<_>>()
        .join(" ")
}

/// Spawns a child with no inherited stdio in its own process group and lets it go.
fn spawn_detached(mut process: StdCommand, display: &str) -> Result<(), ExecutionError> {
    process
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        process.process_group(0);
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        process.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    let child = process
        .spawn()
        .map_err(|e| ExecutionError::BackgroundSpawn(display.to_string(), e))?;
    log::debug!("Background process started (PID: {})", child.id());
    // Dropping the handle neither waits for nor kills the child.
    drop(child);
    Ok(())
}
