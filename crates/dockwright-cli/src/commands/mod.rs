//! CLI command definitions and dispatch.

pub mod build;
pub mod clean;
pub mod images;
pub mod inspect;
pub mod kill;
pub mod ps;
pub mod rm;
pub mod rmi;
pub mod run;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use dockwright_common::config::EngineConfig;
use dockwright_common::constants::{CONFIG_ENV, ENGINE_ENV};
use dockwright_runtime::Engine;

/// Dockwright — build, run, and clean up through a container engine.
#[derive(Parser, Debug)]
#[command(name = "dwr", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Engine binary to drive (overrides the config file).
    #[arg(long, global = true, env = ENGINE_ENV)]
    pub engine: Option<String>,

    /// JSON engine configuration file.
    #[arg(long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build an image and print its id.
    Build(build::BuildArgs),
    /// Create and start a container.
    Run(run::RunArgs),
    /// Show the engine's JSON description of an object.
    Inspect(inspect::InspectArgs),
    /// List image ids.
    Images(images::ImagesArgs),
    /// List container ids.
    Ps(ps::PsArgs),
    /// Force-remove images.
    Rmi(rmi::RmiArgs),
    /// Force-remove containers.
    Rm(rm::RmArgs),
    /// Kill containers.
    Kill(kill::KillArgs),
    /// Kill and remove every container, then remove every image.
    Clean(clean::CleanArgs),
}

/// Shared state handed to every command.
pub struct Context {
    /// Engine resolved from flags and config.
    pub engine: Engine,
    /// Whether to print JSON.
    pub json: bool,
}

impl Cli {
    /// Resolves the engine configuration: flag or env, then file, then
    /// defaults.
    fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(binary) = &self.engine {
            config = config.with_binary(binary.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the command fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.engine_config()?;
    let engine = Engine::with_config(config);
    if !engine.is_available() {
        tracing::warn!(binary = %engine.config().binary, "engine binary not found on PATH");
    }
    let ctx = Context {
        engine,
        json: cli.json,
    };

    match cli.command {
        Command::Build(args) => build::execute(args, &ctx),
        Command::Run(args) => run::execute(args, &ctx),
        Command::Inspect(args) => inspect::execute(args, &ctx),
        Command::Images(args) => images::execute(args, &ctx),
        Command::Ps(args) => ps::execute(args, &ctx),
        Command::Rmi(args) => rmi::execute(args, &ctx),
        Command::Rm(args) => rm::execute(args, &ctx),
        Command::Kill(args) => kill::execute(args, &ctx),
        Command::Clean(args) => clean::execute(args, &ctx),
    }
}

/// Parses a `KEY=VALUE` argument.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}
