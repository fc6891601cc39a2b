//! Helper-command execution seam.
//!
//! Discovery queries spawn short-lived helper processes (`pgrep`) through
//! the [`CommandRunner`] trait so tests can substitute canned output for a
//! live process-utility toolchain.

use async_trait::async_trait;
use procctl_common::{ProcessError, ProcessResult};
use std::process::Stdio;
use tokio::process::Command;

/// Captured output of a completed helper process.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, if the helper exited normally.
    pub exit_code: Option<i32>,
    /// Standard output, split into lines.
    pub stdout: Vec<String>,
    /// Standard error, split into lines.
    pub stderr: Vec<String>,
}

/// Runs a helper command to completion and captures its output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &[String]) -> ProcessResult<CommandOutput>;
}

/// [`CommandRunner`] that spawns real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &[String]) -> ProcessResult<CommandOutput> {
        let (executable, args) = command.split_first().ok_or_else(|| {
            ProcessError::invalid_argument("command must contain at least an executable")
        })?;

        // Output is drained until the helper closes its pipes; no separate
        // read timeout is applied.
        let output = Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ProcessError::launch_failed(command.join(" "), e.to_string()))?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: split_lines(&output.stdout),
            stderr: split_lines(&output.stderr),
        })
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}
