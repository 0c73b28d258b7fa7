//! Static-analysis step.
//!
//! Runs the configured lint command and captures stdout and stderr through a
//! single pipe, so the captured text keeps the interleaving a terminal shows.
//! A non-zero exit is an advisory failure that carries the captured output.
use crate::report::FailureKind;
use crate::util::truncate_string;
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

pub const DEFAULT_LINT_COMMAND: &str = "golangci-lint run";

const LOG_PREVIEW_BYTES: usize = 512;

/// Combined output of a finished lint process.
#[derive(Debug)]
pub struct LintCapture {
    pub output: String,
    pub status: ExitStatus,
}

/// The lint process ran and exited non-zero.
#[derive(Debug)]
pub struct LintFailed {
    pub output: String,
    pub code: Option<i32>,
}

impl fmt::Display for LintFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "linting issues detected: {}", self.output)
    }
}

impl std::error::Error for LintFailed {}

/// Run the lint command and fail with [`LintFailed`] on a non-zero exit.
pub fn run_static_analysis(command: &str) -> Result<LintCapture> {
    let capture = run_lint_command(command)?;
    if !capture.status.success() {
        return Err(LintFailed {
            output: capture.output,
            code: capture.status.code(),
        }
        .into());
    }
    Ok(capture)
}

/// Run the lint command and return its combined output whatever the exit status.
pub fn run_lint_command(command: &str) -> Result<LintCapture> {
    let args =
        shell_words::split(command).with_context(|| format!("parse lint command: {command}"))?;
    let Some((program, rest)) = args.split_first() else {
        return Err(anyhow!("lint command is empty"));
    };
    let resolved =
        which::which(program).with_context(|| format!("locate lint program {program}"))?;

    let start = Instant::now();
    let (mut reader, writer) = std::io::pipe().context("create lint output pipe")?;
    let mut child = {
        // The command holds the write ends; it must drop before we read to EOF.
        let mut cmd = Command::new(&resolved);
        cmd.args(rest)
            .stdin(Stdio::null())
            .stdout(writer.try_clone().context("clone lint output pipe")?)
            .stderr(writer);
        cmd.spawn().with_context(|| format!("spawn lint command: {program}"))?
    };

    let mut bytes = Vec::new();
    let read = reader.read_to_end(&mut bytes).context("read lint output");
    let status = child.wait().context("wait for lint command")?;
    read?;
    let output = String::from_utf8_lossy(&bytes).into_owned();

    tracing::info!(
        elapsed_ms = start.elapsed().as_millis(),
        output_bytes = bytes.len(),
        exit_code = ?status.code(),
        "lint command complete"
    );
    tracing::debug!(
        output = %truncate_string(&output, LOG_PREVIEW_BYTES),
        "lint output"
    );

    Ok(LintCapture { output, status })
}

/// Classify an error returned by [`run_static_analysis`].
pub fn failure_kind(err: &anyhow::Error) -> FailureKind {
    if err.downcast_ref::<LintFailed>().is_some() {
        FailureKind::LintFailed
    } else {
        FailureKind::LintUnavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::find_in_path;

    #[test]
    fn passing_command_captures_stdout() {
        if find_in_path("sh").is_none() {
            return;
        }
        let capture = run_static_analysis("sh -c 'echo clean'").expect("lint passes");
        assert!(capture.status.success());
        assert_eq!(capture.output.trim(), "clean");
    }

    #[test]
    fn failing_command_carries_combined_output() {
        if find_in_path("sh").is_none() {
            return;
        }
        let err = run_static_analysis("sh -c 'echo first; echo second >&2; exit 3'")
            .expect_err("non-zero exit fails");
        assert_eq!(failure_kind(&err), FailureKind::LintFailed);

        let failed = err.downcast_ref::<LintFailed>().expect("lint failure");
        assert_eq!(failed.code, Some(3));
        assert_eq!(failed.output, "first\nsecond\n");
        assert!(err
            .to_string()
            .starts_with("linting issues detected: first"));
    }

    #[test]
    fn run_lint_command_keeps_output_on_failure() {
        if find_in_path("sh").is_none() {
            return;
        }
        let capture = run_lint_command("sh -c 'echo issue >&2; exit 1'").expect("process runs");
        assert!(!capture.status.success());
        assert_eq!(capture.output, "issue\n");
    }

    #[test]
    fn missing_program_is_unavailable() {
        let err = run_static_analysis("definitely-not-a-real-linter-7f3a run")
            .expect_err("missing program");
        assert_eq!(failure_kind(&err), FailureKind::LintUnavailable);
        assert!(err.to_string().contains("locate lint program"));
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = run_static_analysis("   ").expect_err("empty command");
        assert_eq!(err.to_string(), "lint command is empty");
    }

    #[test]
    fn unbalanced_quotes_fail_to_parse() {
        let err = run_static_analysis("golangci-lint 'run").expect_err("bad quoting");
        assert!(err.to_string().starts_with("parse lint command"));
    }
}
