// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution seam.
//!
//! Every external command the engine issues (runtime engine CLI,
//! container-manager CLI, editor launch) goes through [`CommandRunner`].
//! Production uses [`SystemRunner`]; tests script outcomes with
//! [`FakeRunner`] and assert on the recorded invocations.

use crate::error::EngineError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;

/// One subprocess invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
    /// Redirect combined stdout/stderr to this file (append) instead of
    /// capturing. Used for build logs.
    pub log_path: Option<PathBuf>,
}

impl Invocation {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            envs: Vec::new(),
            log_path: None,
        }
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Program and arguments joined for logging and test matching.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status code (-1 when terminated by signal).
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self { status: 0, stdout: stdout.into(), stderr: String::new() }
    }

    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self { status, stdout: String::new(), stderr: stderr.into() }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Executes subprocesses.
///
/// `Err` means the program could not be executed at all; a command that
/// ran and exited nonzero is `Ok` with a nonzero status, so callers
/// decide which failures are fatal.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: Invocation) -> Result<CommandOutput, EngineError>;
}

/// Runs subprocesses on the host via `tokio::process`.
#[derive(Clone, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: Invocation) -> Result<CommandOutput, EngineError> {
        let mut command = tokio::process::Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(ref dir) = invocation.cwd {
            command.current_dir(dir);
        }
        for (key, value) in &invocation.envs {
            command.env(key, value);
        }

        if let Some(ref log_path) = invocation.log_path {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)
                .map_err(|e| EngineError::io(log_path.clone(), e))?;
            let err_file = file.try_clone().map_err(|e| EngineError::io(log_path.clone(), e))?;
            command.stdout(Stdio::from(file));
            command.stderr(Stdio::from(err_file));
            command.stdin(Stdio::null());

            let status = command.status().await.map_err(|e| EngineError::Exec {
                program: invocation.program.clone(),
                source: e,
            })?;
            return Ok(CommandOutput {
                status: status.code().unwrap_or(-1),
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        let output = command.output().await.map_err(|e| EngineError::Exec {
            program: invocation.program.clone(),
            source: e,
        })?;
        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeRunner;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    enum Response {
        Output(CommandOutput),
        ExecError,
    }

    struct Rule {
        pattern: String,
        response: Response,
    }

    /// Scripted command runner for tests.
    ///
    /// Rules match when the pattern is a substring of the joined command
    /// line; first match wins. Unmatched invocations succeed with empty
    /// output. All invocations are recorded for assertions.
    #[derive(Clone, Default)]
    pub struct FakeRunner {
        rules: Arc<Mutex<Vec<Rule>>>,
        calls: Arc<Mutex<Vec<Invocation>>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Succeed with the given stdout for matching command lines.
        pub fn respond(&self, pattern: impl Into<String>, stdout: impl Into<String>) {
            self.rules.lock().push(Rule {
                pattern: pattern.into(),
                response: Response::Output(CommandOutput::ok(stdout)),
            });
        }

        /// Exit nonzero with the given stderr for matching command lines.
        pub fn fail(&self, pattern: impl Into<String>, status: i32, stderr: impl Into<String>) {
            self.rules.lock().push(Rule {
                pattern: pattern.into(),
                response: Response::Output(CommandOutput::failed(status, stderr)),
            });
        }

        /// Simulate a missing binary for matching command lines.
        pub fn exec_error(&self, pattern: impl Into<String>) {
            self.rules
                .lock()
                .push(Rule { pattern: pattern.into(), response: Response::ExecError });
        }

        /// Joined command lines of every recorded invocation, in order.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().iter().map(Invocation::command_line).collect()
        }

        /// Full recorded invocations (for asserting on envs/cwd/log paths).
        pub fn invocations(&self) -> Vec<Invocation> {
            self.calls.lock().clone()
        }

        /// Number of recorded invocations whose command line contains `pattern`.
        pub fn count_calls(&self, pattern: &str) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|inv| inv.command_line().contains(pattern))
                .count()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, invocation: Invocation) -> Result<CommandOutput, EngineError> {
            let line = invocation.command_line();
            self.calls.lock().push(invocation.clone());

            let rules = self.rules.lock();
            for rule in rules.iter() {
                if line.contains(&rule.pattern) {
                    return match &rule.response {
                        Response::Output(output) => Ok(output.clone()),
                        Response::ExecError => Err(EngineError::Exec {
                            program: invocation.program,
                            source: std::io::Error::new(
                                std::io::ErrorKind::NotFound,
                                "scripted exec error",
                            ),
                        }),
                    };
                }
            }
            Ok(CommandOutput::ok(""))
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
