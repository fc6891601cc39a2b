//! `pgrep` flag dialect detection.
//!
//! Some process-utility implementations list pid plus full command line
//! with `pgrep -fa`, others with `pgrep -fl`. This module probes the host
//! once per process lifetime by launching a disposable sleep with a
//! distinctive duration and checking which flag set reports it.

use procctl_process::execute::{self, ProcessHandle};
use procctl_process::runner::{CommandRunner, SystemRunner};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Sleep duration used as the probe's matching fingerprint. Distinctive
/// enough that no unrelated process is plausibly sleeping for it.
const PROBE_SLEEP_SECS: u32 = 123;

/// Candidate flag sets in priority order; the first that works wins.
const FLAG_CANDIDATES: [&str; 2] = ["-fa", "-fl"];

/// Adopted when no candidate works.
const FALLBACK_FLAGS: &str = "-fa";

const PROBE_CLEANUP_TIMEOUT: Duration = Duration::from_secs(1);

/// Which `pgrep` flag dialect the host understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgrepCapabilities {
    /// Flag token that lists pid plus full command line.
    pub flags: &'static str,
    /// Whether detection found a working dialect. When `false`, `flags`
    /// holds a best-effort fallback and `pgrep`-based queries may behave
    /// unpredictably.
    pub detection_succeeded: bool,
}

static CAPABILITIES: OnceCell<PgrepCapabilities> = OnceCell::const_new();

/// Returns the host's `pgrep` capabilities, probing on first call.
///
/// The probe runs at most once per process lifetime; concurrent first
/// callers coalesce onto a single detection run and every caller observes
/// the same result.
pub async fn pgrep_capabilities() -> PgrepCapabilities {
    *CAPABILITIES
        .get_or_init(|| async { detect(&SystemRunner).await })
        .await
}

/// Runs the detection probe against `runner`. Not memoized; prefer
/// [`pgrep_capabilities`] outside of tests.
///
/// Detection never fails: if no candidate works (or the probe target cannot
/// be launched), the fallback flag set is adopted with
/// `detection_succeeded = false`.
pub async fn detect(runner: &dyn CommandRunner) -> PgrepCapabilities {
    let expected_command = format!("sleep {PROBE_SLEEP_SECS}");
    let probe_command = vec!["sleep".to_string(), PROBE_SLEEP_SECS.to_string()];

    let mut probe = match execute::launch(&probe_command, None) {
        Ok(handle) => handle,
        Err(err) => {
            warn!(
                "Could not launch pgrep probe target: {}; adopting fallback flags {}",
                err, FALLBACK_FLAGS
            );
            return PgrepCapabilities {
                flags: FALLBACK_FLAGS,
                detection_succeeded: false,
            };
        }
    };

    let capabilities = evaluate_candidates(runner, probe.pid(), &expected_command).await;
    cleanup_probe(&mut probe).await;
    capabilities
}

async fn evaluate_candidates(
    runner: &dyn CommandRunner,
    probe_pid: i64,
    expected_command: &str,
) -> PgrepCapabilities {
    for flags in FLAG_CANDIDATES {
        let command = vec!["pgrep".to_string(), flags.to_string(), "sleep".to_string()];
        match runner.run(&command).await {
            Ok(output) => {
                if output
                    .stdout
                    .iter()
                    .any(|line| line_matches(line, probe_pid, expected_command))
                {
                    debug!("pgrep lists pid and command with {}", flags);
                    return PgrepCapabilities {
                        flags,
                        detection_succeeded: true,
                    };
                }
            }
            Err(err) => debug!("pgrep {} probe failed: {}", flags, err),
        }
    }

    warn!(
        "No pgrep flag dialect lists pid and command on this host; \
         adopting fallback flags {} (pgrep-based queries may be unreliable)",
        FALLBACK_FLAGS
    );
    PgrepCapabilities {
        flags: FALLBACK_FLAGS,
        detection_succeeded: false,
    }
}

/// A line matches when its whitespace tokens include the probe pid and the
/// expected command text appears verbatim.
fn line_matches(line: &str, probe_pid: i64, expected_command: &str) -> bool {
    let pid_token = probe_pid.to_string();
    line.split_whitespace().any(|token| token == pid_token) && line.contains(expected_command)
}

/// Best-effort probe cleanup. Failures are logged and discarded so they can
/// never mask the detection result.
async fn cleanup_probe(probe: &mut ProcessHandle) {
    match execute::forcibly_kill(probe, PROBE_CLEANUP_TIMEOUT).await {
        Ok(true) => {}
        Ok(false) => warn!(
            "pgrep probe target (PID {}) did not exit after SIGKILL",
            probe.pid()
        ),
        Err(err) => warn!(
            "Could not clean up pgrep probe target (PID {}): {}",
            probe.pid(),
            err
        ),
    }
}
