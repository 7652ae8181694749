//! `dwr inspect` — Show the engine's JSON description of an object.

use clap::Args;

use super::Context;
use crate::output;

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Image or container name or id.
    pub target: String,
}

/// Executes the `inspect` command.
///
/// # Errors
///
/// Returns an error if the engine cannot inspect the target.
pub fn execute(args: InspectArgs, ctx: &Context) -> anyhow::Result<()> {
    let records = ctx.engine.inspect(&args.target)?;
    output::print_json(&records)
}
