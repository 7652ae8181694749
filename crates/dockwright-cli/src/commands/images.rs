//! `dwr images` — List image ids.

use clap::Args;

use super::Context;
use crate::output;

/// Arguments for the `images` command.
#[derive(Args, Debug)]
pub struct ImagesArgs {}

/// Executes the `images` command.
///
/// # Errors
///
/// Returns an error if the engine cannot list images.
pub fn execute(_args: ImagesArgs, ctx: &Context) -> anyhow::Result<()> {
    let images = ctx.engine.list_images()?;
    output::print_ids(&images, ctx.json)
}
