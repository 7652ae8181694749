//! `dwr ps` — List container ids.

use clap::Args;

use super::Context;
use crate::output;

/// Arguments for the `ps` command.
#[derive(Args, Debug)]
pub struct PsArgs {}

/// Executes the `ps` command.
///
/// # Errors
///
/// Returns an error if the engine cannot list containers.
pub fn execute(_args: PsArgs, ctx: &Context) -> anyhow::Result<()> {
    let containers = ctx.engine.list_containers()?;
    output::print_ids(&containers, ctx.json)
}
