//! `pgrep`-backed process queries.
//!
//! Builds and runs `pgrep` invocations (optionally scoped to a user) and
//! parses their output into pid lists or (pid, command) pairs.

use crate::capability;
use procctl_common::{ProcessError, ProcessResult};
use procctl_process::runner::{CommandRunner, SystemRunner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One matched process: its pid and the command line `pgrep` reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMatch {
    pub pid: i64,
    pub command: String,
}

/// Runs `pgrep` pattern queries.
pub struct ProcessQuery {
    runner: Arc<dyn CommandRunner>,
}

impl Default for ProcessQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessQuery {
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemRunner))
    }

    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Finds all pids whose full command line matches `pattern`, optionally
    /// restricted to processes owned by `user`.
    ///
    /// Runs `pgrep [-u user] -f pattern`.
    pub async fn find_pids(&self, user: Option<&str>, pattern: &str) -> ProcessResult<Vec<i64>> {
        let command = build_pgrep_command(user, "-f", pattern)?;
        let output = self.runner.run(&command).await?;
        let pids = parse_pid_lines(&output.stdout)?;
        debug!("pgrep matched {} process(es) for `{}`", pids.len(), pattern);
        Ok(pids)
    }

    /// Finds (pid, command) pairs for every process whose full command line
    /// matches `pattern`.
    ///
    /// Runs `pgrep [-u user] <detected-flags> pattern`, where the flag
    /// token comes from the one-time capability probe. Each output line is
    /// split on its first whitespace run; the remainder is kept verbatim as
    /// the matched command.
    pub async fn find_pids_with_command(
        &self,
        user: Option<&str>,
        pattern: &str,
    ) -> ProcessResult<Vec<ProcessMatch>> {
        let capabilities = capability::pgrep_capabilities().await;
        let command = build_pgrep_command(user, capabilities.flags, pattern)?;
        let output = self.runner.run(&command).await?;
        parse_match_lines(&output.stdout)
    }

    /// Variant of [`find_pids`] for call sites expecting at most one match.
    ///
    /// Returns `None` for zero matches, the sole pid for exactly one, and
    /// [`ProcessError::Multiplicity`] (carrying the full match list) for
    /// more.
    pub async fn find_single_pid(
        &self,
        user: Option<&str>,
        pattern: &str,
    ) -> ProcessResult<Option<i64>> {
        let pids = self.find_pids(user, pattern).await?;
        single_or_error(pids, pattern)
    }
}

/// Builds a `pgrep` argv. The flag token must be a single argument with no
/// embedded whitespace; violating that fails before any process is spawned.
pub fn build_pgrep_command(
    user: Option<&str>,
    flags: &str,
    pattern: &str,
) -> ProcessResult<Vec<String>> {
    if flags.chars().any(char::is_whitespace) {
        return Err(ProcessError::invalid_argument(format!(
            "pgrep flag token {flags:?} must not contain whitespace"
        )));
    }

    let mut command = vec!["pgrep".to_string()];
    if let Some(user) = user {
        command.push("-u".to_string());
        command.push(user.to_string());
    }
    command.push(flags.to_string());
    command.push(pattern.to_string());
    Ok(command)
}

/// Parses bare-pid output, one pid per non-blank line.
pub(crate) fn parse_pid_lines(lines: &[String]) -> ProcessResult<Vec<i64>> {
    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| parse_pid_token(line, line))
        .collect()
}

/// Parses pid+command output, one [`ProcessMatch`] per non-blank line,
/// preserving input order.
pub(crate) fn parse_match_lines(lines: &[String]) -> ProcessResult<Vec<ProcessMatch>> {
    lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_match_line(line))
        .collect()
}

/// Reduces a pid list to the 0/1/many contract shared by the single-result
/// queries.
pub(crate) fn single_or_error(pids: Vec<i64>, query: &str) -> ProcessResult<Option<i64>> {
    match pids.as_slice() {
        [] => Ok(None),
        [pid] => Ok(Some(*pid)),
        _ => Err(ProcessError::multiplicity(query, pids)),
    }
}

fn parse_match_line(raw: &str) -> ProcessResult<ProcessMatch> {
    let line = raw.trim_start();
    let pid_end = line
        .find(char::is_whitespace)
        .unwrap_or(line.len());
    let (pid_token, remainder) = line.split_at(pid_end);
    let pid = parse_pid_token(pid_token, raw)?;
    Ok(ProcessMatch {
        pid,
        command: remainder.trim_start().to_string(),
    })
}

fn parse_pid_token(token: &str, line: &str) -> ProcessResult<i64> {
    match token.parse::<i64>() {
        Ok(pid) if pid >= 0 => Ok(pid),
        _ => Err(ProcessError::parse_failure(line)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_build_pgrep_command() {
        assert_eq!(
            build_pgrep_command(None, "-f", "java").unwrap(),
            vec!["pgrep", "-f", "java"]
        );
        assert_eq!(
            build_pgrep_command(Some("deploy"), "-fa", "java").unwrap(),
            vec!["pgrep", "-u", "deploy", "-fa", "java"]
        );
    }

    #[test]
    fn test_whitespace_flag_token_rejected() {
        let result = build_pgrep_command(None, "-f l", "java");
        assert!(matches!(result, Err(ProcessError::InvalidArgument { .. })));
    }

    #[test]
    fn test_parse_pid_lines() {
        assert_eq!(
            parse_pid_lines(&lines(&["100", "200", "", "300"])).unwrap(),
            vec![100, 200, 300]
        );
        assert!(parse_pid_lines(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_pid_lines_rejects_garbage() {
        let err = parse_pid_lines(&lines(&["100", "nope"])).unwrap_err();
        match err {
            ProcessError::ParseFailure { line } => assert_eq!(line, "nope"),
            other => panic!("Expected ParseFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_match_line_example() {
        let matches = parse_match_lines(&lines(&["12345 java -jar app.jar"])).unwrap();
        assert_eq!(
            matches,
            vec![ProcessMatch {
                pid: 12345,
                command: "java -jar app.jar".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_match_lines_preserve_order_and_skip_blanks() {
        let matches = parse_match_lines(&lines(&[
            "100 java -jar app.jar",
            "",
            "200 sh -c sleep 5",
            "   ",
            "300 nginx: worker process",
        ]))
        .unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].pid, 100);
        assert_eq!(matches[1].pid, 200);
        assert_eq!(matches[2].pid, 300);
        assert_eq!(matches[2].command, "nginx: worker process");
    }

    #[test]
    fn test_parse_match_line_keeps_embedded_whitespace_verbatim() {
        let matches = parse_match_lines(&lines(&["42 watch -n 5  df -h"])).unwrap();
        assert_eq!(matches[0].command, "watch -n 5  df -h");
    }

    #[test]
    fn test_parse_match_line_without_command() {
        let matches = parse_match_lines(&lines(&["42"])).unwrap();
        assert_eq!(matches[0].pid, 42);
        assert_eq!(matches[0].command, "");
    }

    #[test]
    fn test_parse_match_line_rejects_negative_pid() {
        let result = parse_match_lines(&lines(&["-1 java"]));
        assert!(matches!(result, Err(ProcessError::ParseFailure { .. })));
    }

    #[test]
    fn test_single_or_error() {
        assert_eq!(single_or_error(vec![], "java").unwrap(), None);
        assert_eq!(single_or_error(vec![42], "java").unwrap(), Some(42));

        let err = single_or_error(vec![1, 2, 3], "java").unwrap_err();
        match err {
            ProcessError::Multiplicity { query, matches } => {
                assert_eq!(query, "java");
                assert_eq!(matches, vec![1, 2, 3]);
            }
            other => panic!("Expected Multiplicity, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_find_pids_via_stub_runner() {
        use async_trait::async_trait;
        use procctl_process::runner::CommandOutput;

        struct StubRunner;

        #[async_trait]
        impl CommandRunner for StubRunner {
            async fn run(&self, command: &[String]) -> ProcessResult<CommandOutput> {
                assert_eq!(command, &["pgrep", "-u", "deploy", "-f", "java"]);
                Ok(CommandOutput {
                    // pgrep exits 1 on no matches; a successful match list
                    // exits 0.
                    exit_code: Some(0),
                    stdout: vec!["100".to_string(), "200".to_string()],
                    stderr: Vec::new(),
                })
            }
        }

        let query = ProcessQuery::with_runner(Arc::new(StubRunner));
        let pids = query.find_pids(Some("deploy"), "java").await.unwrap();
        assert_eq!(pids, vec![100, 200]);
    }
}
