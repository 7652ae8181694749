//! Blocking execution of engine commands.
//!
//! [`ProcessRunner`] is the seam between command construction and the
//! operating system. [`SystemRunner`] spawns real child processes; tests
//! substitute a scripted runner.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use dockwright_common::constants::KILLED_EXIT_CODE;
use dockwright_common::error::{DockwrightError, Result};
use dockwright_common::types::{ExpectedExit, ProcessResult};

/// One command line together with how it should be run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    /// Variables added to the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Working directory, if not the current one.
    pub cwd: Option<PathBuf>,
    /// Kill the process once this much time has passed.
    pub timeout: Option<Duration>,
    /// Exit-code contract.
    pub expected: ExpectedExit,
    /// Whether a contract violation is raised as an error.
    pub check: bool,
}

impl Invocation {
    /// Creates a checked invocation that expects success.
    #[must_use]
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            env: BTreeMap::new(),
            cwd: None,
            timeout: None,
            expected: ExpectedExit::Success,
            check: true,
        }
    }

    /// Adds one environment variable to the overlay.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.env.insert(key.into(), value.into());
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn cwd(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the exit-code contract.
    #[must_use]
    pub const fn expect(mut self, expected: ExpectedExit) -> Self {
        self.expected = expected;
        self
    }

    /// Sets whether a contract violation is raised.
    #[must_use]
    pub const fn check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    /// The program name, or `""` for an empty argv.
    #[must_use]
    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }
}

/// Executes invocations and reports their outcome.
pub trait ProcessRunner: Send + Sync {
    /// Runs the invocation to completion without judging its exit code.
    ///
    /// A timed-out process is reported through
    /// [`ProcessResult::timed_out`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the argv is empty or the process cannot be
    /// spawned.
    fn run(&self, invocation: &Invocation) -> Result<ProcessResult>;

    /// Runs the invocation and enforces its exit-code contract when
    /// [`Invocation::check`] is set.
    ///
    /// # Errors
    ///
    /// Returns [`DockwrightError::UnexpectedExitCode`] on a checked contract
    /// violation, or any error from [`ProcessRunner::run`].
    fn execute(&self, invocation: &Invocation) -> Result<ProcessResult> {
        let result = self.run(invocation)?;
        if invocation.check {
            result.ensure_expected()
        } else {
            Ok(result)
        }
    }
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for Arc<T> {
    fn run(&self, invocation: &Invocation) -> Result<ProcessResult> {
        (**self).run(invocation)
    }
}

/// Spawns invocations as child processes of the current process.
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner {
    poll_interval: Duration,
    /// How long output is still collected after a timed-out child is
    /// reaped. Descendants may hold the pipes open well past that.
    drain_grace: Duration,
}

impl SystemRunner {
    /// Creates a runner that polls timed processes every 10 ms.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            drain_grace: Duration::from_millis(100),
        }
    }

    /// Waits for the child, killing it once `timeout` expires.
    fn wait(&self, child: &mut Child, timeout: Option<Duration>) -> std::io::Result<(ExitStatus, bool)> {
        // A limit too large for `Instant` is no limit at all.
        let Some(deadline) = timeout.and_then(|limit| Instant::now().checked_add(limit)) else {
            return child.wait().map(|status| (status, false));
        };
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok((status, false));
            }
            let now = Instant::now();
            if now >= deadline {
                // The child may exit between try_wait and kill.
                if let Err(e) = child.kill() {
                    if e.kind() != std::io::ErrorKind::InvalidInput {
                        return Err(e);
                    }
                }
                return child.wait().map(|status| (status, true));
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Forwards every line of `source` to `tx` until EOF.
fn drain<R: Read + Send + 'static>(
    source: R,
    stream: Stream,
    tx: Sender<(Stream, String)>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Err(e) => {
                    tracing::debug!(?stream, error = %e, "stopped reading process output");
                    break;
                }
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    if tx.send((stream, line)).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessResult> {
        let Some((program, args)) = invocation.argv.split_first() else {
            return Err(DockwrightError::Precondition {
                operation: "run process",
                message: "argv is empty".into(),
            });
        };
        tracing::debug!(
            argv = ?invocation.argv,
            env = ?invocation.env,
            cwd = ?invocation.cwd,
            timeout = ?invocation.timeout,
            "spawning process"
        );

        let mut command = Command::new(program);
        let _ = command
            .args(args)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &invocation.cwd {
            let _ = command.current_dir(cwd);
        }

        let started = Instant::now();
        let mut child = command.spawn().map_err(|e| DockwrightError::Spawn {
            program: program.clone(),
            source: e,
        })?;

        let (tx, rx) = mpsc::channel();
        let readers = [
            child.stdout.take().map(|s| drain(s, Stream::Stdout, tx.clone())),
            child.stderr.take().map(|s| drain(s, Stream::Stderr, tx.clone())),
        ];
        drop(tx);

        let (status, timed_out) =
            self.wait(&mut child, invocation.timeout)
                .map_err(|e| DockwrightError::Spawn {
                    program: program.clone(),
                    source: e,
                })?;
        let lines: Vec<(Stream, String)> = if timed_out {
            // Readers still blocked on pipes held by descendants are left
            // detached.
            let mut lines = Vec::new();
            let grace = Instant::now() + self.drain_grace;
            while let Some(left) = grace.checked_duration_since(Instant::now()) {
                match rx.recv_timeout(left) {
                    Ok(line) => lines.push(line),
                    Err(_) => break,
                }
            }
            lines
        } else {
            for reader in readers.into_iter().flatten() {
                let _ = reader.join();
            }
            rx.into_iter().collect()
        };
        let duration = started.elapsed();

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut logs = String::new();
        for (stream, line) in lines {
            match stream {
                Stream::Stdout => stdout.push_str(&line),
                Stream::Stderr => stderr.push_str(&line),
            }
            logs.push_str(&line);
        }

        let exit_code = if timed_out {
            KILLED_EXIT_CODE
        } else {
            status.code().unwrap_or(KILLED_EXIT_CODE)
        };
        if timed_out {
            tracing::warn!(argv = ?invocation.argv, ?duration, "process timed out and was killed");
        } else {
            tracing::debug!(argv = ?invocation.argv, exit_code, ?duration, "process exited");
        }

        Ok(ProcessResult {
            argv: invocation.argv.clone(),
            exit_code,
            stdout,
            stderr,
            logs,
            env: invocation.env.clone(),
            timed_out,
            expected: invocation.expected,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn invocation_defaults_to_checked_success() {
        let inv = Invocation::new(argv(&["docker", "ps"]));
        assert!(inv.check);
        assert_eq!(inv.expected, ExpectedExit::Success);
        assert_eq!(inv.program(), "docker");
    }

    #[test]
    fn invocation_builder_sets_fields() {
        let inv = Invocation::new(argv(&["docker", "build", "."]))
            .env("DOCKER_BUILDKIT", "0")
            .cwd(Some(PathBuf::from("/tmp")))
            .timeout(Some(Duration::from_secs(3)))
            .expect(ExpectedExit::Failure)
            .check(false);
        assert_eq!(inv.env.get("DOCKER_BUILDKIT").map(String::as_str), Some("0"));
        assert_eq!(inv.cwd, Some(PathBuf::from("/tmp")));
        assert_eq!(inv.timeout, Some(Duration::from_secs(3)));
        assert_eq!(inv.expected, ExpectedExit::Failure);
        assert!(!inv.check);
    }

    /// Yields one line, then fails every read.
    struct BrokenPipe {
        sent: bool,
    }

    impl Read for BrokenPipe {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.sent {
                return Err(std::io::Error::other("pipe broke"));
            }
            self.sent = true;
            let line = b"partial\n";
            buf[..line.len()].copy_from_slice(line);
            Ok(line.len())
        }
    }

    #[test]
    fn drain_keeps_lines_read_before_an_error() {
        let (tx, rx) = mpsc::channel();
        drain(BrokenPipe { sent: false }, Stream::Stderr, tx)
            .join()
            .unwrap();
        let lines: Vec<_> = rx.into_iter().collect();
        assert_eq!(lines, vec![(Stream::Stderr, "partial\n".to_string())]);
    }

    #[test]
    fn empty_argv_is_refused() {
        let err = SystemRunner::new().run(&Invocation::new(Vec::new())).unwrap_err();
        assert!(matches!(err, DockwrightError::Precondition { .. }));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let inv = Invocation::new(argv(&["dockwright-no-such-binary-xyz"]));
        let err = SystemRunner::new().run(&inv).unwrap_err();
        assert!(matches!(err, DockwrightError::Spawn { .. }));
    }
}
