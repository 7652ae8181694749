//! Engine command-line construction.
//!
//! Every function here is pure: it turns an immutable spec into an argv
//! vector and never touches the process table.

use dockwright_common::config::EngineConfig;
use dockwright_common::constants::ID_FORMAT;
use dockwright_common::error::{DockwrightError, Result};

use crate::build::BuildSpec;
use crate::container::RunSpec;

/// Produces argv vectors for one engine binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuilder {
    binary: String,
    multi_arch_subcommand: String,
}

impl CommandBuilder {
    /// Creates a builder for the engine named in `config`.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            multi_arch_subcommand: config.multi_arch_subcommand.clone(),
        }
    }

    /// The engine binary every argv starts with.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn base(&self, parts: &[&str]) -> Vec<String> {
        let mut argv = Vec::with_capacity(parts.len() + 1);
        argv.push(self.binary.clone());
        argv.extend(parts.iter().map(ToString::to_string));
        argv
    }

    /// `build`, routed through the multi-arch builder when platforms are
    /// requested or the spec asks for it.
    #[must_use]
    pub fn build_command(&self, spec: &BuildSpec) -> Vec<String> {
        let mut argv = vec![self.binary.clone()];
        if spec.uses_multi_arch_builder() {
            argv.push(self.multi_arch_subcommand.clone());
        }
        argv.push("build".into());
        if let Some(tag) = &spec.tag {
            argv.push("-t".into());
            argv.push(tag.clone());
        }
        if let Some(dockerfile) = &spec.dockerfile {
            argv.push("-f".into());
            argv.push(dockerfile.display().to_string());
        }
        for (name, value) in &spec.build_args {
            argv.push(format!("--build-arg={name}={value}"));
        }
        if !spec.platforms.is_empty() {
            argv.push(format!("--platform={}", spec.platforms.join(",")));
        }
        if spec.push {
            argv.push("--push".into());
        }
        if spec.buildkit_enabled {
            for (id, src) in &spec.secrets {
                argv.push(format!("--secret=id={id},src={}", src.display()));
            }
        }
        argv.push(spec.context.display().to_string());
        argv
    }

    /// Flags shared by `create` and `run`.
    fn container_flags(argv: &mut Vec<String>, spec: &RunSpec) {
        if let Some(name) = &spec.name {
            argv.push("--name".into());
            argv.push(name.clone());
        } else {
            argv.push("--rm".into());
        }
        if let Some(entrypoint) = &spec.entrypoint {
            argv.push("--entrypoint".into());
            argv.push(entrypoint.clone());
        }
        if spec.tty {
            argv.push("-t".into());
        }
    }

    /// `create`: the first half of a two-phase run.
    #[must_use]
    pub fn create_command(&self, spec: &RunSpec) -> Vec<String> {
        let mut argv = self.base(&["create"]);
        Self::container_flags(&mut argv, spec);
        argv.push(spec.image.clone());
        argv.extend(spec.params.iter().cloned());
        argv
    }

    /// `start`, attached to the container's output when `attach` is set.
    #[must_use]
    pub fn start_command(&self, container_id: &str, attach: bool) -> Vec<String> {
        let mut argv = self.base(&["start", container_id]);
        if attach {
            argv.push("-a".into());
        }
        argv
    }

    /// `run`: create and start in one step. Detached when `attach` is off.
    #[must_use]
    pub fn run_command(&self, spec: &RunSpec) -> Vec<String> {
        let mut argv = self.base(&["run"]);
        Self::container_flags(&mut argv, spec);
        if !spec.attach {
            argv.push("-d".into());
        }
        argv.push(spec.image.clone());
        argv.extend(spec.params.iter().cloned());
        argv
    }

    /// `inspect`, optionally reduced to a format expression.
    #[must_use]
    pub fn inspect_command(&self, target: &str, format: Option<&str>) -> Vec<String> {
        let mut argv = self.base(&["inspect", target]);
        if let Some(format) = format {
            argv.push("--format".into());
            argv.push(format.into());
        }
        argv
    }

    /// `inspect` selecting only the canonical id.
    #[must_use]
    pub fn inspect_id_command(&self, target: &str) -> Vec<String> {
        self.inspect_command(target, Some(ID_FORMAT))
    }

    /// Ids of every image, intermediate ones included.
    #[must_use]
    pub fn list_images_command(&self) -> Vec<String> {
        self.base(&["image", "ls", "-a", "--format", ID_FORMAT])
    }

    /// Ids of every container, stopped ones included.
    #[must_use]
    pub fn list_containers_command(&self) -> Vec<String> {
        self.base(&["ps", "-a", "-q"])
    }

    /// Forced removal of the given images.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when `images` is empty.
    pub fn remove_images_command(&self, images: &[String]) -> Result<Vec<String>> {
        self.bulk("remove images", &["image", "rm", "-f"], images)
    }

    /// Forced removal of the given containers.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when `containers` is empty.
    pub fn remove_containers_command(&self, containers: &[String]) -> Result<Vec<String>> {
        self.bulk("remove containers", &["rm", "-f"], containers)
    }

    /// Immediate kill of the given containers.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when `containers` is empty.
    pub fn stop_containers_command(&self, containers: &[String]) -> Result<Vec<String>> {
        self.bulk("stop containers", &["kill"], containers)
    }

    fn bulk(&self, operation: &'static str, parts: &[&str], targets: &[String]) -> Result<Vec<String>> {
        if targets.is_empty() {
            return Err(DockwrightError::Precondition {
                operation,
                message: "no targets given".into(),
            });
        }
        let mut argv = self.base(parts);
        argv.extend(targets.iter().cloned());
        Ok(argv)
    }
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
