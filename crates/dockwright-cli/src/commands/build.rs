//! `dwr build` — Build an image and report its id.

use std::path::PathBuf;

use clap::Args;
use dockwright_runtime::BuildSpec;
use serde::Serialize;

use super::{Context, parse_key_value};
use crate::output;

/// Arguments for the `build` command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Build context directory.
    #[arg(default_value = ".")]
    pub context: PathBuf,

    /// Tag for the built image.
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Dockerfile path.
    #[arg(short = 'f', long = "file")]
    pub dockerfile: Option<PathBuf>,

    /// Build argument as KEY=VALUE (repeatable).
    #[arg(long = "build-arg", value_parser = parse_key_value)]
    pub build_args: Vec<(String, String)>,

    /// Target platforms, comma-separated or repeated.
    #[arg(long = "platform", value_delimiter = ',')]
    pub platforms: Vec<String>,

    /// Push the image after building.
    #[arg(long)]
    pub push: bool,

    /// Use the multi-arch builder even for a single platform.
    #[arg(long)]
    pub buildx: bool,

    /// Build secret as ID=PATH (repeatable, modern builder only).
    #[arg(long = "secret", value_parser = parse_key_value)]
    pub secrets: Vec<(String, String)>,

    /// Use the legacy builder.
    #[arg(long)]
    pub no_buildkit: bool,

    /// Treat a failing build as the expected outcome.
    #[arg(long)]
    pub expect_failure: bool,
}

impl BuildArgs {
    /// Converts the parsed flags into a build spec.
    pub fn to_spec(&self) -> BuildSpec {
        let mut spec = BuildSpec::new()
            .context(self.context.clone())
            .platforms(self.platforms.iter().cloned())
            .push(self.push)
            .multi_arch_builder(self.buildx)
            .buildkit(!self.no_buildkit)
            .expected_success(!self.expect_failure);
        if let Some(tag) = &self.tag {
            spec = spec.tag(tag.clone());
        }
        if let Some(dockerfile) = &self.dockerfile {
            spec = spec.dockerfile(dockerfile.clone());
        }
        for (name, value) in &self.build_args {
            spec = spec.build_arg(name.clone(), value.clone());
        }
        for (id, src) in &self.secrets {
            spec = spec.secret(id.clone(), src.clone());
        }
        spec
    }
}

#[derive(Serialize)]
struct BuildReport<'a> {
    image_id: &'a str,
    exit_code: i32,
    duration_ms: u128,
}

/// Executes the `build` command.
///
/// # Errors
///
/// Returns an error if the build breaks its exit-code expectation or its
/// image id cannot be resolved.
pub fn execute(args: BuildArgs, ctx: &Context) -> anyhow::Result<()> {
    let spec = args.to_spec();
    let (image_id, result) = ctx.engine.build(&spec)?;

    if ctx.json {
        return output::print_json(&BuildReport {
            image_id: image_id.as_str(),
            exit_code: result.exit_code,
            duration_ms: result.duration.as_millis(),
        });
    }

    if image_id.is_unresolved() {
        println!(
            "Build finished in {} (exit {}), no local image id",
            output::format_duration(result.duration),
            result.exit_code
        );
    } else {
        println!(
            "Built {image_id} in {}",
            output::format_duration(result.duration)
        );
    }
    Ok(())
}
