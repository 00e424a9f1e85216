// src/cli/handlers/open.rs

use anyhow::Result;

use crate::core::{
    pipeline::{Pipeline, Resolution},
    script::RhaiEngine,
};

use super::{command, commons::RunContext};

/// Resolves a single target through the rule pipeline.
///
/// A target that no rule handles and that is neither an existing path nor a URL
/// is retried as a command.
pub fn handle(target: &str, ctx: &RunContext) -> Result<()> {
    let config = ctx.load_config()?;
    let origin = vec![target.to_string()];
    let mut executor = ctx.executor(&config, &origin);
    let engine = RhaiEngine::new();

    let resolution = Pipeline::new(&config, &mut executor, &engine).resolve(target)?;
    log::debug!("Resolved '{}': {:?}", target, resolution);

    if resolution == Resolution::Unresolved {
        return command::run(&config, &mut executor, &origin);
    }
    Ok(())
}
