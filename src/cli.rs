//! CLI argument parsing.
//!
//! Running without a subcommand is the same as `run`; pipeline flags are
//! accepted at the root so `cicd-optimizer --manifest k8s/app.yaml` works.
use crate::report::ExitPolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cicd-optimizer",
    version,
    about = "CI pre-flight: lint, failure-risk prediction, and manifest probe checks",
    after_help = "Commands:\n  run        Run lint, prediction, and manifest checks (default)\n  workflow   Print the bundled example CI workflow\n  config     Print the effective configuration as JSON\n\nExamples:\n  cicd-optimizer\n  cicd-optimizer run --manifest k8s/deployment.yaml --exit-policy fail-on-critical\n  cicd-optimizer run --predict-url http://127.0.0.1:8080/predict --report out/run.json\n  cicd-optimizer workflow > .github/workflows/ci.yml",
    args_conflicts_with_subcommands = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run lint, prediction, and manifest checks in order
    Run(RunArgs),
    /// Print the bundled example CI workflow definition
    Workflow,
    /// Print the effective configuration as JSON
    Config(RunArgs),
}

/// Pipeline inputs. Unset flags fall back to the config file, the
/// environment, then built-in defaults.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// JSON config file (default: ./cicd-optimizer.json when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Static-analysis command, split with shell quoting rules
    #[arg(long, value_name = "CMD")]
    pub lint_command: Option<String>,

    /// Failure prediction endpoint
    #[arg(long, value_name = "URL")]
    pub predict_url: Option<String>,

    /// Overall timeout for the prediction request
    #[arg(long, value_name = "SECS")]
    pub predict_timeout_secs: Option<u64>,

    /// Probability above which the risk is reported as critical
    #[arg(long, value_name = "P")]
    pub critical_threshold: Option<f64>,

    /// Deployment manifest to check for probes
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// How findings map onto the exit status
    #[arg(long, value_enum, value_name = "POLICY")]
    pub exit_policy: Option<ExitPolicy>,

    /// Write a JSON run summary to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Emit debug logs on stderr
    #[arg(long)]
    pub verbose: bool,
}
