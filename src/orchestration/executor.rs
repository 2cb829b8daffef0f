//! Subprocess execution
//!
//! The orchestrator only ever needs two things from a subprocess: run it
//! to completion with the parent's stdio, or run it and capture its
//! output. Both sit behind [`Executor`] so tests can substitute a double.

use crate::error::{JavelinError, JavelinResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Abstract subprocess runner
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run `bin args...` in `dir`, streaming to this process's stdout/stderr
    async fn run(&self, bin: &Path, dir: &Path, args: &[String]) -> JavelinResult<()>;

    /// Run `bin args...` in `dir` and return stdout followed by stderr
    async fn output(&self, bin: &Path, dir: &Path, args: &[String]) -> JavelinResult<String>;
}

/// Executor spawning real processes via tokio
#[derive(Debug, Clone, Default)]
pub struct SystemExecutor {
    /// Deadline after which the child is killed
    timeout: Option<Duration>,
}

impl SystemExecutor {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn command(bin: &Path, dir: &Path, args: &[String]) -> Command {
        let mut cmd = Command::new(bin);
        cmd.args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Executor for SystemExecutor {
    async fn run(&self, bin: &Path, dir: &Path, args: &[String]) -> JavelinResult<()> {
        let command = format_command(bin, args);
        info!("Running {}", command);

        let mut cmd = Self::command(bin, dir, args);
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        let mut child = cmd.spawn().map_err(|e| JavelinError::BuildSpawn {
            command: command.clone(),
            source: e,
        })?;

        let status = match self.timeout {
            None => child.wait().await,
            Some(timeout) => match tokio::time::timeout(timeout, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    let _ = child.kill().await;
                    return Err(JavelinError::BuildTimedOut { command, timeout });
                }
            },
        }
        .map_err(|e| JavelinError::io(format!("waiting for {}", command), e))?;

        if !status.success() {
            return Err(JavelinError::BuildFailed {
                command,
                code: status.code(),
            });
        }

        Ok(())
    }

    async fn output(&self, bin: &Path, dir: &Path, args: &[String]) -> JavelinResult<String> {
        let command = format_command(bin, args);
        debug!("Executing: {}", command);

        let mut cmd = Self::command(bin, dir, args);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let pending = cmd.output();

        let output = match self.timeout {
            None => pending.await,
            Some(timeout) => tokio::time::timeout(timeout, pending)
                .await
                .map_err(|_| JavelinError::BuildTimedOut {
                    command: command.clone(),
                    timeout,
                })?,
        }
        .map_err(|e| JavelinError::BuildSpawn {
            command: command.clone(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(JavelinError::BuildFailed {
                command,
                code: output.status.code(),
            });
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(combined)
    }
}

/// Render a command line for logs and errors
pub fn format_command(bin: &Path, args: &[String]) -> String {
    std::iter::once(bin.display().to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}
