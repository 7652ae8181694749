//! `dwr clean` — Remove every container and image the engine knows about.

use clap::Args;

use super::Context;
use crate::output;

/// Arguments for the `clean` command.
#[derive(Args, Debug)]
pub struct CleanArgs {}

/// Executes the `clean` command.
///
/// # Errors
///
/// Returns an error if the engine cannot list its containers or images.
pub fn execute(_args: CleanArgs, ctx: &Context) -> anyhow::Result<()> {
    let report = ctx.engine.clean_all()?;
    if ctx.json {
        return output::print_json(&report);
    }
    println!(
        "Removed {} container(s) and {} image(s), {} command(s) failed",
        report.containers.len(),
        report.images.len(),
        report.failures
    );
    Ok(())
}
