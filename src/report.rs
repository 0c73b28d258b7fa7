//! Step outcomes, the run summary, and the exit-code policy.
//!
//! Steps never decide the process exit status themselves. They record an
//! outcome here and the configured [`ExitPolicy`] folds the summary into a code.
use crate::manifest::ManifestReport;
use crate::predict::Prediction;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Exit status when a step failed under `fail-on-failure`.
pub const EXIT_STEP_FAILED: u8 = 1;
/// Exit status when the predicted failure risk crossed the threshold.
pub const EXIT_CRITICAL_RISK: u8 = 2;

/// Severity tag prefixed to console lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tag {
    Ok,
    Warning,
    Error,
    Critical,
}

impl Tag {
    pub fn label(self) -> &'static str {
        match self {
            Tag::Ok => "[OK]",
            Tag::Warning => "[Warning]",
            Tag::Error => "[Error]",
            Tag::Critical => "[Critical]",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Lint,
    Predict,
    Manifest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    /// The step ran but found something worth flagging.
    Warning,
    Failed,
}

/// Why a step failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    LintFailed,
    LintUnavailable,
    Transport,
    Timeout,
    Decode,
    ManifestUnreadable,
}

#[derive(Clone, Debug, Serialize)]
pub struct StepOutcome {
    pub step: StepName,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    pub detail: String,
}

impl StepOutcome {
    pub fn ok(step: StepName, detail: impl Into<String>) -> Self {
        Self {
            step,
            status: StepStatus::Ok,
            failure: None,
            detail: detail.into(),
        }
    }

    pub fn warning(step: StepName, detail: impl Into<String>) -> Self {
        Self {
            step,
            status: StepStatus::Warning,
            failure: None,
            detail: detail.into(),
        }
    }

    pub fn failed(step: StepName, kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            step,
            status: StepStatus::Failed,
            failure: Some(kind),
            detail: detail.into(),
        }
    }
}

/// Policy mapping a finished run onto a process exit status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ExitPolicy {
    /// Informational mode: always exit 0.
    #[default]
    AlwaysZero,
    /// Exit non-zero only when the prediction crossed the critical threshold.
    FailOnCritical,
    /// Exit non-zero on critical risk or any failed/warning step.
    FailOnFailure,
}

/// Everything one pipeline run observed.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub generated_at_epoch_ms: u128,
    pub tool_version: String,
    pub steps: Vec<StepOutcome>,
    pub prediction: Option<Prediction>,
    pub critical_risk: bool,
    pub manifest: Option<ManifestReport>,
}

impl RunSummary {
    pub fn new(
        steps: Vec<StepOutcome>,
        prediction: Option<Prediction>,
        critical_risk: bool,
        manifest: Option<ManifestReport>,
    ) -> Self {
        let generated_at_epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at_epoch_ms,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            steps,
            prediction,
            critical_risk,
            manifest,
        }
    }

    /// True when any step did not finish cleanly.
    pub fn has_problems(&self) -> bool {
        self.steps
            .iter()
            .any(|outcome| outcome.status != StepStatus::Ok)
    }

    pub fn exit_code(&self, policy: ExitPolicy) -> u8 {
        match policy {
            ExitPolicy::AlwaysZero => 0,
            ExitPolicy::FailOnCritical if self.critical_risk => EXIT_CRITICAL_RISK,
            ExitPolicy::FailOnCritical => 0,
            ExitPolicy::FailOnFailure if self.critical_risk => EXIT_CRITICAL_RISK,
            ExitPolicy::FailOnFailure if self.has_problems() => EXIT_STEP_FAILED,
            ExitPolicy::FailOnFailure => 0,
        }
    }
}
