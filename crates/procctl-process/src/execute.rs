//! Process launching and bounded exit waits.
//!
//! [`launch`] spawns one OS process per call and hands back exclusive
//! ownership of its handle. The wait functions block the caller up to an
//! explicit timeout and never block indefinitely.

use procctl_common::{ProcessError, ProcessResult};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::time::timeout;
use tracing::debug;

/// Exit code reported when a process outcome could not be determined.
pub const EXIT_CODE_UNKNOWN: i32 = -1;

/// Handle to a spawned OS process.
///
/// Exclusively owned by the caller that launched it. The exit code becomes
/// observable through [`wait_for_exit`] once the OS reports termination.
pub struct ProcessHandle {
    child: Child,
    pid: i64,
    command: String,
}

impl ProcessHandle {
    /// OS-assigned process id.
    pub fn pid(&self) -> i64 {
        self.pid
    }

    /// The command line this process was launched with.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Takes the process's standard output pipe. Returns `None` if already
    /// taken.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Takes the process's standard error pipe. Returns `None` if already
    /// taken.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }
}

/// Spawns an OS process from a command line and optional working directory.
///
/// The first token is the executable, the rest are its arguments. Stdout and
/// stderr are piped, stdin is closed. Fails with
/// [`ProcessError::LaunchFailed`] if the OS cannot create the process.
pub fn launch(command: &[String], working_directory: Option<&Path>) -> ProcessResult<ProcessHandle> {
    let (executable, args) = command.split_first().ok_or_else(|| {
        ProcessError::invalid_argument("command must contain at least an executable")
    })?;

    let mut cmd = Command::new(executable);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null());

    if let Some(dir) = working_directory {
        cmd.current_dir(dir);
    }

    let rendered = command.join(" ");
    match cmd.spawn() {
        Ok(child) => {
            let pid = child.id().map(i64::from).unwrap_or(0);
            debug!("Spawned `{}` (PID: {})", rendered, pid);
            Ok(ProcessHandle {
                child,
                pid,
                command: rendered,
            })
        }
        Err(e) => Err(ProcessError::launch_failed(rendered, e.to_string())),
    }
}

/// Waits up to `wait_timeout` for the process to exit.
///
/// Returns `Some(exit_code)` if it terminated in time and `None` if the
/// timeout elapsed. Does not terminate the process as a side effect. A
/// signal-terminated process reports `128 + signum`.
pub async fn wait_for_exit(
    handle: &mut ProcessHandle,
    wait_timeout: Duration,
) -> ProcessResult<Option<i32>> {
    match timeout(wait_timeout, handle.child.wait()).await {
        Ok(Ok(status)) => Ok(Some(exit_code_of(status))),
        Ok(Err(e)) => Err(ProcessError::wait_failed(handle.pid, e.to_string())),
        Err(_) => Ok(None),
    }
}

/// Sends SIGKILL directly through the handle and waits up to `wait_timeout`
/// for OS-level exit confirmation.
///
/// Returns whether the process exited in time.
pub async fn forcibly_kill(
    handle: &mut ProcessHandle,
    wait_timeout: Duration,
) -> ProcessResult<bool> {
    if let Err(e) = handle.child.start_kill() {
        // InvalidInput means the child was already reaped; confirmation below
        // will return immediately in that case.
        if e.kind() != std::io::ErrorKind::InvalidInput {
            return Err(ProcessError::signal_failed(handle.pid, e.to_string()));
        }
    }

    match timeout(wait_timeout, handle.child.wait()).await {
        Ok(Ok(status)) => {
            debug!(
                "Forcibly killed `{}` (PID: {}, status: {})",
                handle.command, handle.pid, status
            );
            Ok(true)
        }
        Ok(Err(e)) => Err(ProcessError::wait_failed(handle.pid, e.to_string())),
        Err(_) => Ok(false),
    }
}

fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signum| 128 + signum))
        .unwrap_or(EXIT_CODE_UNKNOWN)
}
