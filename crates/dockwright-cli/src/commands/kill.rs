//! `dwr kill` — Kill containers.

use clap::Args;

use super::Context;
use crate::output;

/// Arguments for the `kill` command.
#[derive(Args, Debug)]
pub struct KillArgs {
    /// Container ids or names.
    #[arg(required = true)]
    pub containers: Vec<String>,
}

/// Executes the `kill` command. Engine failures are reported, not raised.
///
/// # Errors
///
/// Returns an error if the engine cannot be launched.
pub fn execute(args: KillArgs, ctx: &Context) -> anyhow::Result<()> {
    let result = ctx.engine.stop_containers(&args.containers)?;
    output::print_cleanup(&args.containers, &result, ctx.json)
}
