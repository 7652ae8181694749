//! Inspection, listing, and best-effort cleanup.
//!
//! Removal and kill commands race against other clients and against
//! containers started with `--rm`, so a nonzero exit is logged and returned
//! in the result rather than raised.

use dockwright_common::error::Result;
use dockwright_common::types::ProcessResult;
use serde::Serialize;

use crate::engine::Engine;
use crate::process::Invocation;

/// What [`Engine::clean_all`] found and how the cleanup went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Containers that were killed and removed.
    pub containers: Vec<String>,
    /// Images that were removed.
    pub images: Vec<String>,
    /// Number of cleanup commands that exited nonzero.
    pub failures: usize,
}

impl Engine {
    /// Returns the engine's full JSON description of `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if `inspect` fails or prints malformed JSON.
    pub fn inspect(&self, target: &str) -> Result<Vec<serde_json::Value>> {
        let result = self
            .runner()
            .execute(&Invocation::new(self.commands().inspect_command(target, None)))?;
        result.json()
    }

    /// Ids of every image known to the engine, in engine order.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing command fails.
    pub fn list_images(&self) -> Result<Vec<String>> {
        self.list(self.commands().list_images_command())
    }

    /// Ids of every container known to the engine, in engine order.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing command fails.
    pub fn list_containers(&self) -> Result<Vec<String>> {
        self.list(self.commands().list_containers_command())
    }

    fn list(&self, argv: Vec<String>) -> Result<Vec<String>> {
        let result = self.runner().execute(&Invocation::new(argv))?;
        Ok(result.lines().map(str::to_string).collect())
    }

    /// Force-removes images.
    ///
    /// # Errors
    ///
    /// Returns a precondition error, before anything runs, when `images` is
    /// empty; otherwise only spawn failures are raised.
    pub fn remove_images(&self, images: &[String]) -> Result<ProcessResult> {
        let argv = self.commands().remove_images_command(images)?;
        self.best_effort(argv)
    }

    /// Force-removes containers.
    ///
    /// # Errors
    ///
    /// Returns a precondition error, before anything runs, when
    /// `containers` is empty; otherwise only spawn failures are raised.
    pub fn remove_containers(&self, containers: &[String]) -> Result<ProcessResult> {
        let argv = self.commands().remove_containers_command(containers)?;
        self.best_effort(argv)
    }

    /// Kills containers.
    ///
    /// # Errors
    ///
    /// Returns a precondition error, before anything runs, when
    /// `containers` is empty; otherwise only spawn failures are raised.
    pub fn stop_containers(&self, containers: &[String]) -> Result<ProcessResult> {
        let argv = self.commands().stop_containers_command(containers)?;
        self.best_effort(argv)
    }

    fn best_effort(&self, argv: Vec<String>) -> Result<ProcessResult> {
        let result = self.runner().execute(&Invocation::new(argv).check(false))?;
        if !result.succeeded() {
            tracing::warn!(
                argv = ?result.argv,
                exit_code = result.exit_code,
                stderr = %result.stderr.trim(),
                "cleanup command failed"
            );
        }
        Ok(result)
    }

    /// Kills and removes every container, then removes every image.
    ///
    /// Empty listings are skipped rather than passed to the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails or a process cannot be spawned.
    pub fn clean_all(&self) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();

        let containers = self.list_containers()?;
        if !containers.is_empty() {
            tracing::info!(count = containers.len(), "removing containers");
            for result in [
                self.stop_containers(&containers)?,
                self.remove_containers(&containers)?,
            ] {
                if !result.succeeded() {
                    report.failures += 1;
                }
            }
            report.containers = containers;
        }

        let images = self.list_images()?;
        if !images.is_empty() {
            tracing::info!(count = images.len(), "removing images");
            if !self.remove_images(&images)?.succeeded() {
                report.failures += 1;
            }
            report.images = images;
        }

        Ok(report)
    }
}
