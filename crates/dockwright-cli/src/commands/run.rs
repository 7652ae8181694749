//! `dwr run` — Create and start a container.

use std::time::Duration;

use anyhow::bail;
use clap::Args;
use dockwright_runtime::RunSpec;
use serde::Serialize;

use super::Context;
use crate::output;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Image to run.
    pub image: String,

    /// Arguments passed to the container.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub params: Vec<String>,

    /// Container name. Unnamed containers are removed on exit.
    #[arg(long)]
    pub name: Option<String>,

    /// Entrypoint override.
    #[arg(long)]
    pub entrypoint: Option<String>,

    /// Do not allocate a TTY.
    #[arg(long)]
    pub no_tty: bool,

    /// Start without attaching to the container's output.
    #[arg(short, long)]
    pub detach: bool,

    /// Kill the container's start process after this many seconds.
    #[arg(long, value_parser = parse_secs)]
    pub timeout: Option<Duration>,

    /// Treat a failing container as the expected outcome.
    #[arg(long)]
    pub expect_failure: bool,

    /// Use a single `run` invocation instead of create + start.
    #[arg(long)]
    pub oneshot: bool,
}

impl RunArgs {
    /// Converts the parsed flags into a run spec.
    pub fn to_spec(&self) -> RunSpec {
        let mut spec = RunSpec::new(self.image.clone())
            .params(self.params.iter().cloned())
            .tty(!self.no_tty)
            .attach(!self.detach)
            .expected_success(!self.expect_failure)
            .check(false);
        if let Some(name) = &self.name {
            spec = spec.name(name.clone());
        }
        if let Some(entrypoint) = &self.entrypoint {
            spec = spec.entrypoint(entrypoint.clone());
        }
        if let Some(timeout) = self.timeout {
            spec = spec.timeout(timeout);
        }
        spec
    }
}

fn parse_secs(raw: &str) -> Result<Duration, String> {
    raw.parse::<f64>()
        .map_err(|e| e.to_string())
        .and_then(|secs| Duration::try_from_secs_f64(secs).map_err(|e| e.to_string()))
}

#[derive(Serialize)]
struct RunReport<'a> {
    container_id: Option<&'a str>,
    exit_code: i32,
    timed_out: bool,
    stdout: &'a str,
    stderr: &'a str,
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if the container cannot be created, or if its exit
/// status contradicts `--expect-failure`.
pub fn execute(args: RunArgs, ctx: &Context) -> anyhow::Result<()> {
    let spec = args.to_spec();
    let (container, result) = if args.oneshot {
        (None, ctx.engine.run_once(&spec)?)
    } else {
        let (container, result) = ctx.engine.run(&spec)?;
        (Some(container), result)
    };
    let container_id = container.as_ref().map(|c| c.container_id.as_str());

    if ctx.json {
        output::print_json(&RunReport {
            container_id,
            exit_code: result.exit_code,
            timed_out: result.timed_out,
            stdout: &result.stdout,
            stderr: &result.stderr,
        })?;
    } else {
        print!("{}", result.stdout);
        #[allow(clippy::print_stderr)]
        {
            eprint!("{}", result.stderr);
        }
        if let Some(id) = container_id {
            tracing::info!(id, exit_code = result.exit_code, "container finished");
        }
    }

    if !result.matches_expected() {
        bail!("{result}");
    }
    Ok(())
}
