//! Engine facade tying command construction to process execution.
//!
//! Operations are spread over the modules that own their specs:
//! [`crate::build`], [`crate::container`], and [`crate::cleanup`].

use dockwright_common::config::EngineConfig;

use crate::command::CommandBuilder;
use crate::process::{ProcessRunner, SystemRunner};

/// Drives one container engine through its command-line interface.
///
/// The engine holds no mutable state. Its image store, build cache, and
/// container namespace are shared with every other client of the same
/// engine, so concurrent callers must namespace their own tags and names.
pub struct Engine {
    runner: Box<dyn ProcessRunner>,
    commands: CommandBuilder,
    config: EngineConfig,
}

impl Engine {
    /// Creates an engine driving `docker` through real child processes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an engine for the given configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_runner(config, Box::new(SystemRunner::new()))
    }

    /// Creates an engine that executes through a custom runner.
    #[must_use]
    pub fn with_runner(config: EngineConfig, runner: Box<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            commands: CommandBuilder::new(&config),
            config,
        }
    }

    /// The argv factory for this engine.
    #[must_use]
    pub const fn commands(&self) -> &CommandBuilder {
        &self.commands
    }

    /// The runner every operation executes through.
    #[must_use]
    pub fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns whether the engine binary can be found on `PATH`.
    #[must_use]
    pub fn is_available(&self) -> bool {
        which::which(&self.config.binary).is_ok()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("commands", &self.commands)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_follow_config() {
        let engine = Engine::with_config(EngineConfig::default().with_binary("podman"));
        assert_eq!(engine.commands().binary(), "podman");
        assert_eq!(engine.config().binary, "podman");
    }

    #[test]
    fn missing_binary_is_unavailable() {
        let engine =
            Engine::with_config(EngineConfig::default().with_binary("dockwright-no-such-engine"));
        assert!(!engine.is_available());
    }
}
