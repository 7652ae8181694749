//! Container runs.
//!
//! A run is split into `create` and `start` the same way the engine splits
//! it, so a container id exists before the container's own process starts
//! and stays available when that process fails or times out.

use std::time::Duration;

use dockwright_common::error::{DockwrightError, Result};
use dockwright_common::types::{ContainerId, ContainerRef, ExpectedExit, ProcessResult};

use crate::engine::Engine;
use crate::process::Invocation;

/// Everything needed to run one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    /// Image to run.
    pub image: String,
    /// Arguments passed after the image.
    pub params: Vec<String>,
    /// Stable container name. Without one the container is auto-removed.
    pub name: Option<String>,
    /// Entrypoint override.
    pub entrypoint: Option<String>,
    /// Allocate a pseudo-TTY.
    pub tty: bool,
    /// Attach to the container's output on start.
    pub attach: bool,
    /// Kill the start process after this long.
    pub timeout: Option<Duration>,
    /// Whether the container is expected to exit successfully.
    pub expected_success: bool,
    /// Whether a broken exit-code expectation is raised as an error.
    pub check: bool,
}

impl RunSpec {
    /// A spec for `image` with a TTY, attached, expecting success.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            params: Vec::new(),
            name: None,
            entrypoint: None,
            tty: true,
            attach: true,
            timeout: None,
            expected_success: true,
            check: true,
        }
    }

    /// Replaces the arguments passed after the image.
    #[must_use]
    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the container name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Overrides the entrypoint.
    #[must_use]
    pub fn entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    /// Sets TTY allocation.
    #[must_use]
    pub const fn tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }

    /// Sets whether to attach on start.
    #[must_use]
    pub const fn attach(mut self, attach: bool) -> Self {
        self.attach = attach;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets whether the container is expected to succeed.
    #[must_use]
    pub const fn expected_success(mut self, expected: bool) -> Self {
        self.expected_success = expected;
        self
    }

    /// Sets whether exit-code mismatches are raised.
    #[must_use]
    pub const fn check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }
}

impl Engine {
    fn timeout_for(&self, spec: &RunSpec) -> Option<Duration> {
        spec.timeout.or(self.config().default_run_timeout)
    }

    /// Creates a container, then starts it.
    ///
    /// The start step is held to `spec.expected_success`. When it breaks
    /// that contract and `spec.check` is set, the returned error carries the
    /// start result, whose argv names the container.
    ///
    /// # Errors
    ///
    /// Returns an error if `create` fails or prints no id, if `start`
    /// breaks its contract while checked, or if a process cannot be spawned.
    pub fn run(&self, spec: &RunSpec) -> Result<(ContainerRef, ProcessResult)> {
        let create_argv = self.commands().create_command(spec);
        tracing::info!(image = %spec.image, name = ?spec.name, "creating container");
        let created = self.runner().execute(&Invocation::new(create_argv.clone()))?;

        let id = created.text();
        if id.is_empty() {
            return Err(DockwrightError::MissingContainerId { argv: create_argv });
        }
        let container_id = ContainerId::new(id);

        let start = Invocation::new(self.commands().start_command(container_id.as_str(), spec.attach))
            .timeout(self.timeout_for(spec))
            .expect(ExpectedExit::from_success(spec.expected_success))
            .check(spec.check);
        tracing::info!(id = %container_id, attach = spec.attach, "starting container");
        let result = self.runner().execute(&start)?;
        if result.timed_out {
            tracing::warn!(id = %container_id, "container start timed out");
        }

        Ok((
            ContainerRef {
                container_id,
                name: spec.name.clone(),
            },
            result,
        ))
    }

    /// Runs a container in a single `run` invocation.
    ///
    /// No container id is captured; prefer [`Engine::run`] when the
    /// container must be inspected or cleaned up afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the run breaks its contract while checked, or
    /// if the process cannot be spawned.
    pub fn run_once(&self, spec: &RunSpec) -> Result<ProcessResult> {
        let invocation = Invocation::new(self.commands().run_command(spec))
            .timeout(self.timeout_for(spec))
            .expect(ExpectedExit::from_success(spec.expected_success))
            .check(spec.check);
        tracing::info!(image = %spec.image, name = ?spec.name, "running container");
        self.runner().execute(&invocation)
    }
}
