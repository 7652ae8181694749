//! `dwr rm` — Force-remove containers.

use clap::Args;

use super::Context;
use crate::output;

/// Arguments for the `rm` command.
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Container ids or names.
    #[arg(required = true)]
    pub containers: Vec<String>,
}

/// Executes the `rm` command. Engine failures are reported, not raised.
///
/// # Errors
///
/// Returns an error if the engine cannot be launched.
pub fn execute(args: RmArgs, ctx: &Context) -> anyhow::Result<()> {
    let result = ctx.engine.remove_containers(&args.containers)?;
    output::print_cleanup(&args.containers, &result, ctx.json)
}
