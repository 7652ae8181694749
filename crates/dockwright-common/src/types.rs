//! Domain primitive types used across the Dockwright workspace.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{DockwrightError, Result};

/// Identifier of a container as printed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content identifier of a built image, without its algorithm prefix.
///
/// The empty id is a legitimate value: a multi-platform build that was not
/// loaded into the local store has no single image to point at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(String);

impl ImageId {
    /// Creates a new image ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The intentionally empty id.
    #[must_use]
    pub const fn unresolved() -> Self {
        Self(String::new())
    }

    /// Returns `true` when no image id was produced.
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a created container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRef {
    /// Id printed by `create`.
    pub container_id: ContainerId,
    /// Stable name, if one was requested.
    pub name: Option<String>,
}

/// Exit-code contract of a process invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedExit {
    /// Exit code 0.
    #[default]
    Success,
    /// Any nonzero exit code, including a timeout kill.
    Failure,
    /// One specific exit code.
    Code(i32),
}

impl ExpectedExit {
    /// Maps an `expected_success` flag onto a contract.
    #[must_use]
    pub const fn from_success(expected_success: bool) -> Self {
        if expected_success {
            Self::Success
        } else {
            Self::Failure
        }
    }

    /// Returns `true` when `code` satisfies this contract.
    #[must_use]
    pub const fn matches(self, code: i32) -> bool {
        match self {
            Self::Success => code == 0,
            Self::Failure => code != 0,
            Self::Code(expected) => code == expected,
        }
    }
}

impl fmt::Display for ExpectedExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Code(code) => write!(f, "exit code {code}"),
        }
    }
}

/// Captured outcome of one external process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// Command line that was executed.
    pub argv: Vec<String>,
    /// Exit code; `-1` when the process was killed.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Both streams interleaved in arrival order.
    pub logs: String,
    /// Environment overlay the process was started with.
    pub env: BTreeMap<String, String>,
    /// Whether the process was killed after exceeding its timeout.
    pub timed_out: bool,
    /// Contract the exit code was held to.
    pub expected: ExpectedExit,
    /// Wall-clock run time.
    pub duration: Duration,
}

impl ProcessResult {
    /// Returns `true` for a zero exit code.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// Returns `true` when the exit code satisfies [`Self::expected`].
    #[must_use]
    pub const fn matches_expected(&self) -> bool {
        self.expected.matches(self.exit_code)
    }

    /// Trimmed standard output, for commands that print a single value.
    #[must_use]
    pub fn text(&self) -> &str {
        self.stdout.trim()
    }

    /// Non-empty, trimmed lines of standard output.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().map(str::trim).filter(|l| !l.is_empty())
    }

    /// Parses standard output as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.stdout)?)
    }

    /// Converts a contract violation into an error carrying this result.
    ///
    /// # Errors
    ///
    /// Returns [`DockwrightError::UnexpectedExitCode`] when the exit code
    /// does not satisfy [`Self::expected`].
    pub fn ensure_expected(self) -> Result<Self> {
        if self.matches_expected() {
            Ok(self)
        } else {
            Err(DockwrightError::UnexpectedExitCode {
                result: Box::new(self),
            })
        }
    }

    /// The command line joined with spaces.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    /// Value of `key` in the environment overlay.
    #[must_use]
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }
}

impl fmt::Display for ProcessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.timed_out {
            write!(
                f,
                "`{}` timed out after {:.1}s (expected {})",
                self.command_line(),
                self.duration.as_secs_f64(),
                self.expected
            )
        } else {
            write!(
                f,
                "`{}` exited with {} (expected {})",
                self.command_line(),
                self.exit_code,
                self.expected
            )
        }
    }
}
