//! The pre-flight pipeline: lint, predict, manifest, strictly in that order.
//!
//! Step failures are printed and recorded, never propagated. Only console
//! write errors escape [`run_pipeline`].
use crate::config::PipelineConfig;
use crate::lint;
use crate::manifest::{self, ManifestReport};
use crate::predict::{self, PredictClient, Prediction};
use crate::report::{FailureKind, RunSummary, StepName, StepOutcome, Tag};
use anyhow::Result;
use std::io::Write;

pub const BANNER: &str = "Starting AI CI/CD Optimizer...";
const LINT_PASSED: &str = "Static analysis passed!";
const LINT_FAILED: &str = "Static analysis failed:";
const PREDICT_FAILED: &str = "Failed to get AI prediction:";
const CRITICAL_RISK: &str = "High failure risk detected! Consider fixing before running tests.";
const MISSING_PROBES: &str = "Missing liveness or readiness probes in Kubernetes deployment!";
const MANIFEST_DONE: &str = "Kubernetes manifest check completed.";
const MANIFEST_FAILED: &str = "Kubernetes manifest analysis failed:";

/// Run every step against `config`, writing tagged lines to `out`.
pub fn run_pipeline<W: Write>(config: &PipelineConfig, out: &mut W) -> Result<RunSummary> {
    writeln!(out, "{BANNER}")?;

    let lint = lint_step(&config.lint_command, out)?;
    let (predict, prediction) = predict_step(config, out)?;
    let critical_risk = prediction
        .as_ref()
        .is_some_and(|prediction| prediction.is_critical(config.critical_threshold));
    let (manifest, report) = manifest_step(config, out)?;

    Ok(RunSummary::new(
        vec![lint, predict, manifest],
        prediction,
        critical_risk,
        report,
    ))
}

fn lint_step<W: Write>(command: &str, out: &mut W) -> Result<StepOutcome> {
    match lint::run_static_analysis(command) {
        Ok(_) => {
            emit(out, Tag::Ok, LINT_PASSED)?;
            Ok(StepOutcome::ok(StepName::Lint, LINT_PASSED))
        }
        Err(err) => {
            let detail = error_detail(&err);
            let exit_code = err
                .downcast_ref::<lint::LintFailed>()
                .and_then(|failed| failed.code);
            tracing::warn!(error = %detail, ?exit_code, "static analysis failed");
            emit(out, Tag::Warning, &format!("{LINT_FAILED} {detail}"))?;
            Ok(StepOutcome::failed(
                StepName::Lint,
                lint::failure_kind(&err),
                detail,
            ))
        }
    }
}

fn predict_step<W: Write>(
    config: &PipelineConfig,
    out: &mut W,
) -> Result<(StepOutcome, Option<Prediction>)> {
    let client = PredictClient::new(&config.predict_url, config.predict_timeout());
    match client.fetch() {
        Ok(prediction) => {
            let line = prediction.summary_line();
            writeln!(out, "{line}")?;
            if prediction.is_critical(config.critical_threshold) {
                emit(out, Tag::Critical, CRITICAL_RISK)?;
            }
            Ok((StepOutcome::ok(StepName::Predict, line), Some(prediction)))
        }
        Err(err) => {
            let detail = error_detail(&err);
            let kind = predict::failure_kind(&err);
            tracing::warn!(error = %detail, ?kind, "prediction failed");
            emit(out, Tag::Error, &format!("{PREDICT_FAILED} {detail}"))?;
            Ok((StepOutcome::failed(StepName::Predict, kind, detail), None))
        }
    }
}

fn manifest_step<W: Write>(
    config: &PipelineConfig,
    out: &mut W,
) -> Result<(StepOutcome, Option<ManifestReport>)> {
    match manifest::analyze_manifest(&config.manifest) {
        Ok(report) => {
            let outcome = if report.probes_complete() {
                StepOutcome::ok(StepName::Manifest, MANIFEST_DONE)
            } else {
                emit(out, Tag::Warning, MISSING_PROBES)?;
                StepOutcome::warning(StepName::Manifest, MISSING_PROBES)
            };
            emit(out, Tag::Ok, MANIFEST_DONE)?;
            Ok((outcome, Some(report)))
        }
        Err(err) => {
            let detail = error_detail(&err);
            tracing::warn!(error = %detail, "manifest analysis failed");
            emit(out, Tag::Warning, &format!("{MANIFEST_FAILED} {detail}"))?;
            Ok((
                StepOutcome::failed(
                    StepName::Manifest,
                    FailureKind::ManifestUnreadable,
                    detail,
                ),
                None,
            ))
        }
    }
}

/// Full error chain, without the trailing newline captured tool output ends with.
fn error_detail(err: &anyhow::Error) -> String {
    format!("{err:#}").trim_end().to_string()
}

fn emit<W: Write>(out: &mut W, tag: Tag, message: &str) -> Result<()> {
    writeln!(out, "{} {message}", tag.label())?;
    Ok(())
}
