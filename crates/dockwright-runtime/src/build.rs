//! Image builds.
//!
//! A build is one engine invocation followed by image id resolution over
//! its log. The raw result is always handed back so callers can inspect the
//! log even when no id could be recovered.

use std::path::PathBuf;

use dockwright_common::constants::BUILDKIT_ENV;
use dockwright_common::error::Result;
use dockwright_common::types::{ExpectedExit, ImageId, ProcessResult};

use crate::engine::Engine;
use crate::process::Invocation;
use crate::resolver;

/// Everything needed to run one image build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    /// Tag applied to the built image.
    pub tag: Option<String>,
    /// Build context directory.
    pub context: PathBuf,
    /// Dockerfile, if not the context's default.
    pub dockerfile: Option<PathBuf>,
    /// Build arguments in insertion order.
    pub build_args: Vec<(String, String)>,
    /// Push the result to its registry.
    pub push: bool,
    /// Target platforms, in order.
    pub platforms: Vec<String>,
    /// Force the multi-arch builder even without platforms.
    pub use_multi_arch_builder: bool,
    /// Build secrets as id and source file, in insertion order.
    pub secrets: Vec<(String, PathBuf)>,
    /// Whether the modern builder is enabled.
    pub buildkit_enabled: bool,
    /// Whether the build is expected to succeed.
    pub expected_success: bool,
    /// Working directory of the engine process.
    pub cwd: Option<PathBuf>,
}

impl BuildSpec {
    /// A spec building `.` with the modern builder, expecting success.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tag: None,
            context: PathBuf::from("."),
            dockerfile: None,
            build_args: Vec::new(),
            push: false,
            platforms: Vec::new(),
            use_multi_arch_builder: false,
            secrets: Vec::new(),
            buildkit_enabled: true,
            expected_success: true,
            cwd: None,
        }
    }

    /// Sets the tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the build context.
    #[must_use]
    pub fn context(mut self, context: impl Into<PathBuf>) -> Self {
        self.context = context.into();
        self
    }

    /// Sets the Dockerfile path.
    #[must_use]
    pub fn dockerfile(mut self, dockerfile: impl Into<PathBuf>) -> Self {
        self.dockerfile = Some(dockerfile.into());
        self
    }

    /// Sets a build argument. Re-setting a name keeps its original position.
    #[must_use]
    pub fn build_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        upsert(&mut self.build_args, name.into(), value.into());
        self
    }

    /// Sets whether to push.
    #[must_use]
    pub const fn push(mut self, push: bool) -> Self {
        self.push = push;
        self
    }

    /// Replaces the target platforms.
    #[must_use]
    pub fn platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = platforms.into_iter().map(Into::into).collect();
        self
    }

    /// Forces the multi-arch builder.
    #[must_use]
    pub const fn multi_arch_builder(mut self, enabled: bool) -> Self {
        self.use_multi_arch_builder = enabled;
        self
    }

    /// Adds a build secret. Re-setting an id keeps its original position.
    #[must_use]
    pub fn secret(mut self, id: impl Into<String>, src: impl Into<PathBuf>) -> Self {
        upsert(&mut self.secrets, id.into(), src.into());
        self
    }

    /// Enables or disables the modern builder.
    #[must_use]
    pub const fn buildkit(mut self, enabled: bool) -> Self {
        self.buildkit_enabled = enabled;
        self
    }

    /// Sets whether the build is expected to succeed.
    #[must_use]
    pub const fn expected_success(mut self, expected: bool) -> Self {
        self.expected_success = expected;
        self
    }

    /// Sets the working directory of the engine process.
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Whether `build` must go through the multi-arch builder.
    #[must_use]
    pub fn uses_multi_arch_builder(&self) -> bool {
        self.use_multi_arch_builder || !self.platforms.is_empty()
    }

    /// Environment overlay selecting the builder.
    #[must_use]
    pub fn env(&self) -> (&'static str, &'static str) {
        (BUILDKIT_ENV, if self.buildkit_enabled { "1" } else { "0" })
    }
}

impl Default for BuildSpec {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert<V>(entries: &mut Vec<(String, V)>, key: String, value: V) {
    if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
        slot.1 = value;
    } else {
        entries.push((key, value));
    }
}

impl Engine {
    /// Builds an image and resolves its id from the build log.
    ///
    /// An empty id is returned, without error, for a build that failed as
    /// expected and for multi-platform builds that were not loaded.
    ///
    /// # Errors
    ///
    /// Returns [`UnexpectedExitCode`] when the exit status contradicts
    /// `expected_success`, [`ImageIdUnresolved`] when a successful build's
    /// log has no recognized completion marker, or a spawn error.
    ///
    /// [`UnexpectedExitCode`]: dockwright_common::error::DockwrightError::UnexpectedExitCode
    /// [`ImageIdUnresolved`]: dockwright_common::error::DockwrightError::ImageIdUnresolved
    pub fn build(&self, spec: &BuildSpec) -> Result<(ImageId, ProcessResult)> {
        let argv = self.commands().build_command(spec);
        tracing::info!(tag = ?spec.tag, context = %spec.context.display(), buildkit = spec.buildkit_enabled, "building image");

        let (key, value) = spec.env();
        let invocation = Invocation::new(argv)
            .env(key, value)
            .cwd(spec.cwd.clone())
            .expect(ExpectedExit::from_success(spec.expected_success));
        let result = self.runner().execute(&invocation)?;

        let image_id = resolver::resolve_image_id(&result, self.runner(), self.commands())?;
        if image_id.is_unresolved() {
            tracing::info!(exit_code = result.exit_code, "build finished without an image id");
        } else {
            tracing::info!(image_id = %image_id, "image built");
        }
        Ok((image_id, result))
    }
}

#[cfg(test)]
mod tests {
    use dockwright_common::error::DockwrightError;

    use super::*;
    use crate::testing::{Reply, ScriptedRunner};

    #[test]
    fn buildkit_env_overlay() {
        assert_eq!(BuildSpec::new().env(), ("DOCKER_BUILDKIT", "1"));
        assert_eq!(BuildSpec::new().buildkit(false).env(), ("DOCKER_BUILDKIT", "0"));
    }

    #[test]
    fn build_resolves_buildkit_digest() {
        let runner = ScriptedRunner::new([Reply::exit(0).stderr(
            "#8 exporting to image\n#8 writing image sha256:deadbeef done\n#8 DONE 0.1s\n",
        )]);
        let engine = runner.engine();

        let (id, result) = engine.build(&BuildSpec::new().tag("app")).unwrap();
        assert_eq!(id.as_str(), "deadbeef");
        assert_eq!(result.exit_code, 0);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].argv, vec!["docker", "build", "-t", "app", "."]);
        assert_eq!(calls[0].env.get("DOCKER_BUILDKIT").map(String::as_str), Some("1"));
        assert_eq!(calls[0].expected, ExpectedExit::Success);
    }

    #[test]
    fn expected_failure_returns_empty_id() {
        let runner = ScriptedRunner::new([Reply::exit(1).stderr("writing image sha256:stale done\n")]);
        let engine = runner.engine();

        let (id, result) = engine
            .build(&BuildSpec::new().expected_success(false))
            .unwrap();
        assert!(id.is_unresolved());
        assert_eq!(result.exit_code, 1);
        assert_eq!(runner.calls()[0].expected, ExpectedExit::Failure);
    }

    #[test]
    fn unexpected_failure_is_raised_with_logs() {
        let runner = ScriptedRunner::new([Reply::exit(1).stderr("ERROR: failed to solve\n")]);
        let err = runner.engine().build(&BuildSpec::new()).unwrap_err();
        let result = err.process_result().expect("result attached");
        assert!(result.logs.contains("failed to solve"));
    }

    #[test]
    fn unrecognized_log_is_a_resolution_failure() {
        let runner = ScriptedRunner::new([Reply::exit(0).stderr("#1 DONE 0.0s\n")]);
        let err = runner.engine().build(&BuildSpec::new()).unwrap_err();
        assert!(matches!(err, DockwrightError::ImageIdUnresolved { .. }));
        let result = err.process_result().expect("build result attached");
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.logs, "#1 DONE 0.0s\n");
    }

    #[test]
    fn legacy_build_inspects_short_id() {
        let runner = ScriptedRunner::new([
            Reply::exit(0).stdout("Step 2/2 : CMD true\nSuccessfully built abc123\n"),
            Reply::exit(0).stdout("sha256:abc123def456\n"),
        ]);
        let engine = runner.engine();

        let (id, _) = engine.build(&BuildSpec::new().buildkit(false)).unwrap();
        assert_eq!(id.as_str(), "abc123def456");

        let calls = runner.calls();
        assert_eq!(calls[0].env.get("DOCKER_BUILDKIT").map(String::as_str), Some("0"));
        assert_eq!(
            calls[1].argv,
            vec!["docker", "inspect", "abc123", "--format", "{{ .ID }}"]
        );
    }

    #[test]
    fn cwd_is_forwarded() {
        let runner = ScriptedRunner::new([Reply::exit(0).stderr("writing image sha256:aa done\n")]);
        let _ = runner.engine().build(&BuildSpec::new().cwd("/work")).unwrap();
        assert_eq!(runner.calls()[0].cwd, Some(PathBuf::from("/work")));
    }
}
