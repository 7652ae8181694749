//! Container engine orchestration for Dockwright.
//!
//! Builds engine command lines, runs them as blocking child processes, and
//! recovers image ids from build logs. [`engine::Engine`] is the entry point.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod build;
pub mod cleanup;
pub mod command;
pub mod container;
pub mod engine;
pub mod process;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use build::BuildSpec;
pub use command::CommandBuilder;
pub use container::RunSpec;
pub use engine::Engine;
pub use process::{Invocation, ProcessRunner, SystemRunner};
