// src/cli/handlers/version.rs

use anyhow::Result;

use super::commons::RunContext;

/// Handles `et :version`.
pub fn handle(_args: Vec<String>, _ctx: &RunContext) -> Result<()> {
    println!("et version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
