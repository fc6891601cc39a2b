//! Command-based process termination with a timeout escalation policy.
//!
//! A termination request spawns a `kill` helper process, waits a bounded
//! time for the helper to exit, and on timeout dispatches exactly one of
//! the [`TimeoutAction`] escalation branches.

use crate::check::process_exists;
use crate::execute::{self, ProcessHandle, EXIT_CODE_UNKNOWN};
use crate::signal::Signal;
use procctl_common::{ProcessError, ProcessResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Default wait for the `kill` helper before escalation.
pub const DEFAULT_SIGNAL_TIMEOUT: Duration = Duration::from_secs(5);

const FORCE_KILL_GRACE: Duration = Duration::from_secs(1);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(25);
const HELPER_REAP_TIMEOUT: Duration = Duration::from_millis(100);

/// What to do when a termination request does not complete in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutAction {
    /// SIGKILL the target directly and require exit within a short grace
    /// period; failure to confirm is fatal.
    ForceKill,
    /// Log a warning and report [`EXIT_CODE_UNKNOWN`]; never raises.
    NoOp,
    /// Fail with [`ProcessError::TimeoutPolicy`].
    ThrowOnTimeout,
}

/// Per-request termination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KillOptions {
    /// Signal delivered by the `kill` helper.
    pub signal: Signal,
    /// How long to wait for the helper before escalating.
    pub timeout: Duration,
    /// Escalation branch taken when the wait times out.
    pub on_timeout: TimeoutAction,
}

impl Default for KillOptions {
    fn default() -> Self {
        Self {
            signal: Signal::Term,
            timeout: DEFAULT_SIGNAL_TIMEOUT,
            on_timeout: TimeoutAction::ForceKill,
        }
    }
}

/// Terminates `pid` with the default options (SIGTERM, 5 s, force kill).
pub async fn kill(pid: i64) -> ProcessResult<i32> {
    kill_with_options(pid, &KillOptions::default()).await
}

/// Terminates `pid` according to `options`.
pub async fn kill_with_options(pid: i64, options: &KillOptions) -> ProcessResult<i32> {
    kill_with_signal(pid, options.signal, options.timeout, options.on_timeout).await
}

/// Sends `signal` to `pid` by spawning a `kill` helper process, waits up to
/// `timeout`, and on timeout executes `action`.
///
/// When the helper exits in time, the returned value is the helper's own
/// exit code: it reflects whether the signal-send itself succeeded, which
/// is the information available through this command-based design.
pub async fn kill_with_signal(
    pid: i64,
    signal: Signal,
    timeout: Duration,
    action: TimeoutAction,
) -> ProcessResult<i32> {
    kill_via("kill", pid, signal, timeout, action).await
}

/// Sends `signal` directly to `pid` without spawning a helper process.
pub fn send_signal(pid: i64, signal: Signal) -> ProcessResult<()> {
    use nix::sys::signal::{kill as nix_kill, Signal as NixSignal};
    use nix::unistd::Pid;

    let nix_signal = match signal {
        Signal::Hup => NixSignal::SIGHUP,
        Signal::Int => NixSignal::SIGINT,
        Signal::Quit => NixSignal::SIGQUIT,
        Signal::Kill => NixSignal::SIGKILL,
        Signal::Term => NixSignal::SIGTERM,
    };

    nix_kill(Pid::from_raw(pid as i32), nix_signal)
        .map_err(|e| ProcessError::signal_failed(pid, e.to_string()))
}

async fn kill_via(
    kill_program: &str,
    pid: i64,
    signal: Signal,
    timeout: Duration,
    action: TimeoutAction,
) -> ProcessResult<i32> {
    let command = vec![
        kill_program.to_string(),
        signal.as_kill_flag(),
        pid.to_string(),
    ];

    let mut helper = execute::launch(&command, None)?;
    debug!(
        "Sending {} to PID {} via helper PID {}",
        signal,
        pid,
        helper.pid()
    );

    if let Some(code) = execute::wait_for_exit(&mut helper, timeout).await? {
        return Ok(code);
    }

    reap_stalled_helper(&mut helper).await;

    match action {
        TimeoutAction::ForceKill => {
            info!(
                "Signal delivery to PID {} not confirmed within {:?}, force killing",
                pid, timeout
            );
            force_kill_and_confirm(pid).await
        }
        TimeoutAction::NoOp => {
            warn!(
                "Signal delivery to PID {} not confirmed within {:?}; outcome unknown",
                pid, timeout
            );
            Ok(EXIT_CODE_UNKNOWN)
        }
        TimeoutAction::ThrowOnTimeout => Err(ProcessError::TimeoutPolicy { pid, timeout }),
    }
}

/// SIGKILLs the target directly and polls for exit within the grace period.
///
/// Targets reached through this path are usually not our children, so a
/// successful kill makes them disappear from the process table once their
/// parent reaps them.
async fn force_kill_and_confirm(pid: i64) -> ProcessResult<i32> {
    if let Err(err) = send_signal(pid, Signal::Kill) {
        // ESRCH here means the target exited between the timed-out wait and
        // the escalation, which is the outcome we wanted.
        if process_exists(pid)? {
            return Err(err);
        }
    }

    let deadline = Instant::now() + FORCE_KILL_GRACE;
    loop {
        if !process_exists(pid)? {
            return Ok(128 + Signal::Kill.number());
        }
        if Instant::now() >= deadline {
            return Err(ProcessError::EscalationFailed {
                pid,
                grace: FORCE_KILL_GRACE,
            });
        }
        sleep(EXIT_POLL_INTERVAL).await;
    }
}

/// Best-effort reap of a `kill` helper that outlived its wait. Failures are
/// logged and discarded.
async fn reap_stalled_helper(helper: &mut ProcessHandle) {
    match execute::forcibly_kill(helper, HELPER_REAP_TIMEOUT).await {
        Ok(true) => {}
        Ok(false) => warn!(
            "Stalled kill helper (PID {}) did not exit after SIGKILL",
            helper.pid()
        ),
        Err(err) => warn!(
            "Could not reap stalled kill helper (PID {}): {}",
            helper.pid(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    /// Writes a `kill` stand-in that hangs instead of exiting.
    fn hanging_kill_stub(dir: &tempfile::TempDir) -> String {
        let path = dir.path().join("kill");
        std::fs::write(&path, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    /// Spawns a `sleep` that is not our child: its parent is a `sh` that
    /// stays in `wait` and reaps it as soon as it dies, so the process
    /// table reflects the target's death promptly.
    async fn spawn_reaped_sleep(seconds: u32) -> (ProcessHandle, i64) {
        use tokio::io::{AsyncBufReadExt, BufReader};

        let mut handle = execute::launch(
            &argv(&["sh", "-c", &format!("sleep {seconds} & echo $!; wait $!")]),
            None,
        )
        .unwrap();
        let stdout = handle.take_stdout().unwrap();
        let line = BufReader::new(stdout)
            .lines()
            .next_line()
            .await
            .unwrap()
            .unwrap();
        let target_pid = line.trim().parse().unwrap();
        (handle, target_pid)
    }

    #[tokio::test]
    async fn test_kill_returns_helper_exit_code_on_success() {
        let mut target = execute::launch(&argv(&["sleep", "30"]), None).unwrap();

        let code = kill_with_signal(
            target.pid(),
            Signal::Term,
            DEFAULT_SIGNAL_TIMEOUT,
            TimeoutAction::ThrowOnTimeout,
        )
        .await
        .unwrap();
        assert_eq!(code, 0);

        // SIGTERM terminates sleep; the wait also reaps it.
        let exit = execute::wait_for_exit(&mut target, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(exit, Some(128 + 15));
    }

    #[tokio::test]
    async fn test_kill_nonexistent_pid_reports_helper_failure() {
        // No action fires: the helper exits in time, just unsuccessfully.
        let code = kill_with_signal(
            99_999_999,
            Signal::Term,
            DEFAULT_SIGNAL_TIMEOUT,
            TimeoutAction::ThrowOnTimeout,
        )
        .await
        .unwrap();
        assert_ne!(code, 0);
    }

    #[tokio::test]
    async fn test_noop_action_returns_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let stub = hanging_kill_stub(&dir);
        let mut target = execute::launch(&argv(&["sleep", "30"]), None).unwrap();

        let code = kill_via(
            &stub,
            target.pid(),
            Signal::Term,
            Duration::from_millis(100),
            TimeoutAction::NoOp,
        )
        .await
        .unwrap();
        assert_eq!(code, EXIT_CODE_UNKNOWN);

        // NoOp must not touch the target.
        assert!(process_exists(target.pid()).unwrap());
        execute::forcibly_kill(&mut target, Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_throw_on_timeout_carries_pid_and_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let stub = hanging_kill_stub(&dir);
        let mut target = execute::launch(&argv(&["sleep", "30"]), None).unwrap();
        let timeout = Duration::from_millis(100);

        let err = kill_via(
            &stub,
            target.pid(),
            Signal::Term,
            timeout,
            TimeoutAction::ThrowOnTimeout,
        )
        .await
        .unwrap_err();

        match &err {
            ProcessError::TimeoutPolicy { pid, timeout: t } => {
                assert_eq!(*pid, target.pid());
                assert_eq!(*t, timeout);
            }
            other => panic!("Expected TimeoutPolicy, got {other:?}"),
        }
        let message = format!("{}", err);
        assert!(message.contains(&target.pid().to_string()));
        assert!(message.contains("100ms"));

        execute::forcibly_kill(&mut target, Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_force_kill_action_terminates_target() {
        let dir = tempfile::tempdir().unwrap();
        let stub = hanging_kill_stub(&dir);
        let (mut parent, target_pid) = spawn_reaped_sleep(300).await;
        assert!(process_exists(target_pid).unwrap());

        let code = kill_via(
            &stub,
            target_pid,
            Signal::Term,
            Duration::from_millis(100),
            TimeoutAction::ForceKill,
        )
        .await
        .unwrap();
        assert_eq!(code, 128 + 9);
        assert!(!process_exists(target_pid).unwrap());

        execute::wait_for_exit(&mut parent, Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_force_kill_on_already_exited_target() {
        let (mut parent, target_pid) = spawn_reaped_sleep(300).await;
        send_signal(target_pid, Signal::Kill).unwrap();
        // Give the parent shell a moment to reap the target.
        sleep(Duration::from_millis(200)).await;

        let code = force_kill_and_confirm(target_pid).await.unwrap();
        assert_eq!(code, 128 + 9);

        execute::wait_for_exit(&mut parent, Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[test]
    fn test_default_kill_options() {
        let options = KillOptions::default();
        assert_eq!(options.signal, Signal::Term);
        assert_eq!(options.timeout, DEFAULT_SIGNAL_TIMEOUT);
        assert_eq!(options.on_timeout, TimeoutAction::ForceKill);
    }
}
