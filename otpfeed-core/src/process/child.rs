//! Child process sink backed by `tokio::process`
//!
//! Manages the login CLI from spawn to exit. Output is inherited so the
//! user sees the CLI's own prompts and messages.

use crate::error::ProcessError;
use crate::process::ProcessSink;
use crate::types::SecretValue;
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

/// Login process launched as a child with a piped stdin
#[derive(Debug)]
pub struct ChildProcessSink {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, SecretValue)>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl ChildProcessSink {
    /// Create a sink for `program` with its arguments; nothing is spawned yet
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            envs: Vec::new(),
            child: None,
            stdin: None,
        }
    }

    /// Add an environment variable for the child only
    pub fn env(mut self, key: impl Into<String>, value: SecretValue) -> Self {
        self.envs.push((key.into(), value));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Process ID of the running child
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().and_then(|child| child.id())
    }

    /// Close stdin and wait for the process to exit
    pub async fn wait(&mut self) -> Result<i32, ProcessError> {
        drop(self.stdin.take());

        let child = self.child.as_mut().ok_or_else(not_started)?;
        let status = child
            .wait()
            .await
            .map_err(|e| ProcessError::StatusUnavailable {
                reason: e.to_string(),
            })?;
        Ok(exit_code_of(status))
    }

    /// Ask the process to stop (SIGKILL on Unix)
    pub fn terminate(&mut self) -> Result<(), ProcessError> {
        drop(self.stdin.take());

        if let Some(child) = self.child.as_mut() {
            if child.try_wait().ok().flatten().is_none() {
                child
                    .start_kill()
                    .map_err(|e| ProcessError::StatusUnavailable {
                        reason: format!("Failed to kill process: {}", e),
                    })?;
                tracing::warn!("Killed login process {:?}", child.id());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ProcessSink for ChildProcessSink {
    async fn start(&mut self) -> Result<(), ProcessError> {
        let executable = which::which(&self.program).map_err(|_| ProcessError::NotFound {
            program: self.program.clone(),
        })?;

        let mut cmd = Command::new(executable);
        cmd.args(&self.args)
            .envs(
                self.envs
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.expose())),
            )
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|e| ProcessError::SpawnFailed {
            reason: format!("Failed to spawn {}: {}", self.program, e),
        })?;

        tracing::debug!("Login process spawned with PID: {:?}", child.id());
        self.stdin = child.stdin.take();
        self.child = Some(child);
        Ok(())
    }

    fn try_exit_code(&mut self) -> Result<Option<i32>, ProcessError> {
        let child = self.child.as_mut().ok_or_else(not_started)?;
        let status = child
            .try_wait()
            .map_err(|e| ProcessError::StatusUnavailable {
                reason: e.to_string(),
            })?;
        Ok(status.map(exit_code_of))
    }

    /// Writes the line and keeps stdin open so the process can finish reading
    async fn write_line(&mut self, line: &str) -> Result<(), ProcessError> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or(ProcessError::StdinUnavailable)?;

        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ProcessError::WriteFailed {
                reason: format!("Failed to write line to stdin: {}", e),
            })?;

        stdin
            .write_all(b"\n")
            .await
            .map_err(|e| ProcessError::WriteFailed {
                reason: format!("Failed to write newline to stdin: {}", e),
            })?;

        stdin.flush().await.map_err(|e| ProcessError::WriteFailed {
            reason: format!("Failed to flush stdin: {}", e),
        })?;

        Ok(())
    }
}

fn not_started() -> ProcessError {
    ProcessError::StatusUnavailable {
        reason: "process has not been started".to_string(),
    }
}

/// Exit code of a finished process; signal deaths map to 128 + signal on Unix
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
