//! Unified error types for the Dockwright workspace.
//!
//! The variants separate the failure classes callers must be able to tell
//! apart: a precondition refused before any process was launched, a build
//! that succeeded without a recognizable image id, and a process whose exit
//! status broke its contract.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ProcessResult;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum DockwrightError {
    /// An operation was refused before any process was launched.
    #[error("{operation}: {message}")]
    Precondition {
        /// Operation that refused to run.
        operation: &'static str,
        /// Why the input was rejected.
        message: String,
    },

    /// A build succeeded but its log carried no recognizable image id.
    #[error("could not resolve image id: {reason}")]
    ImageIdUnresolved {
        /// Which markers were looked for.
        reason: String,
        /// The build result, so its logs stay inspectable.
        result: Box<ProcessResult>,
    },

    /// A checked process exited with a status other than the expected one.
    #[error("unexpected exit status: {result}")]
    UnexpectedExitCode {
        /// The complete result, logs included.
        result: Box<ProcessResult>,
    },

    /// `create` succeeded but printed no container id.
    #[error("engine returned no container id for `{}`", .argv.join(" "))]
    MissingContainerId {
        /// The create invocation.
        argv: Vec<String>,
    },

    /// The process could not be launched or its output could not be read.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program that failed to launch.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl DockwrightError {
    /// Returns the process result attached to an exit-code mismatch or an
    /// unresolved image id.
    #[must_use]
    pub fn process_result(&self) -> Option<&ProcessResult> {
        match self {
            Self::UnexpectedExitCode { result } | Self::ImageIdUnresolved { result, .. } => {
                Some(&**result)
            }
            _ => None,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DockwrightError>;

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use super::*;
    use crate::types::ExpectedExit;

    #[test]
    fn precondition_names_operation() {
        let err = DockwrightError::Precondition {
            operation: "remove containers",
            message: "no targets given".into(),
        };
        assert_eq!(err.to_string(), "remove containers: no targets given");
    }

    fn failed_build() -> ProcessResult {
        ProcessResult {
            argv: vec!["docker".into(), "build".into(), ".".into()],
            exit_code: 1,
            stdout: String::new(),
            stderr: "boom".into(),
            logs: "boom".into(),
            env: BTreeMap::new(),
            timed_out: false,
            expected: ExpectedExit::Success,
            duration: Duration::from_millis(5),
        }
    }

    #[test]
    fn exit_code_mismatch_keeps_result() {
        let err = DockwrightError::UnexpectedExitCode {
            result: Box::new(failed_build()),
        };
        assert!(err.to_string().contains("`docker build .` exited with 1"));
        assert_eq!(err.process_result().map(|r| r.logs.as_str()), Some("boom"));
    }

    #[test]
    fn unresolved_image_id_keeps_result() {
        let err = DockwrightError::ImageIdUnresolved {
            reason: "no marker".into(),
            result: Box::new(failed_build()),
        };
        assert_eq!(err.to_string(), "could not resolve image id: no marker");
        assert_eq!(err.process_result().map(|r| r.exit_code), Some(1));
    }

    #[test]
    fn missing_container_id_shows_command() {
        let err = DockwrightError::MissingContainerId {
            argv: vec!["docker".into(), "create".into(), "alpine".into()],
        };
        assert_eq!(
            err.to_string(),
            "engine returned no container id for `docker create alpine`"
        );
    }
}
