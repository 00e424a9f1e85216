// src/bin/et.rs

use clap::Parser;
use colored::*;
use entry::{
    cli::{Cli, dispatcher},
    core::pipeline::ResolveError,
    system::executor::ExecutionError,
};

/// Sets up logging, parses arguments, dispatches, and handles errors in one place.
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = dispatcher::dispatch(cli) {
        // Argument errors from sub-handlers (including `--help`) are printed by clap.
        if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
            clap_err.exit();
        }

        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(exit_code(&e));
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` raises this crate's level to `debug`.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "entry=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Mirrors a failed child's exit code; every other failure exits with 1.
fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|cause| {
            if let Some(exec) = cause.downcast_ref::<ExecutionError>() {
                return exec.exit_code();
            }
            match cause.downcast_ref::<ResolveError>() {
                Some(ResolveError::Execution(exec)) => exec.exit_code(),
                _ => None,
            }
        })
        .filter(|code| *code != 0)
        .unwrap_or(1)
}
