//! `dwr rmi` — Force-remove images.

use clap::Args;

use super::Context;
use crate::output;

/// Arguments for the `rmi` command.
#[derive(Args, Debug)]
pub struct RmiArgs {
    /// Image ids or tags.
    #[arg(required = true)]
    pub images: Vec<String>,
}

/// Executes the `rmi` command. Engine failures are reported, not raised.
///
/// # Errors
///
/// Returns an error if the engine cannot be launched.
pub fn execute(args: RmiArgs, ctx: &Context) -> anyhow::Result<()> {
    let result = ctx.engine.remove_images(&args.images)?;
    output::print_cleanup(&args.images, &result, ctx.json)
}
