//! Scripted process runner for unit tests.

#![allow(clippy::panic)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dockwright_common::config::EngineConfig;
use dockwright_common::constants::KILLED_EXIT_CODE;
use dockwright_common::error::Result;
use dockwright_common::types::ProcessResult;

use crate::engine::Engine;
use crate::process::{Invocation, ProcessRunner};

/// Canned outcome for the next invocation.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    exit_code: i32,
    stdout: String,
    stderr: String,
    timed_out: bool,
}

impl Reply {
    pub fn exit(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::default()
        }
    }

    pub fn timeout() -> Self {
        Self {
            exit_code: KILLED_EXIT_CODE,
            timed_out: true,
            ..Self::default()
        }
    }

    pub fn stdout(mut self, text: &str) -> Self {
        self.stdout = text.into();
        self
    }

    pub fn stderr(mut self, text: &str) -> Self {
        self.stderr = text.into();
        self
    }
}

/// Records every invocation and answers with queued replies in order.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn engine(self: &Arc<Self>) -> Engine {
        Engine::with_runner(EngineConfig::default(), Box::new(Arc::clone(self)))
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessResult> {
        self.calls.lock().unwrap().push(invocation.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected invocation: {:?}", invocation.argv));
        Ok(ProcessResult {
            argv: invocation.argv.clone(),
            exit_code: reply.exit_code,
            logs: format!("{}{}", reply.stdout, reply.stderr),
            stdout: reply.stdout,
            stderr: reply.stderr,
            env: invocation.env.clone(),
            timed_out: reply.timed_out,
            expected: invocation.expected,
            duration: Duration::ZERO,
        })
    }
}
