//! # dwr — Dockwright CLI
//!
//! Builds images, runs containers, and cleans up after them through an
//! installed container engine.

mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);
    commands::execute(cli)
}

/// Logs go to stderr, as JSON lines when `--json` is set.
fn init_tracing(json: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
