use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod config;
mod lint;
mod manifest;
mod pipeline;
mod predict;
mod report;
#[cfg(test)]
mod test_support;
mod util;

use cli::{Command, RootArgs, RunArgs};

/// Example CI workflow shipped with the tool. Never read by the pipeline.
const GITHUB_WORKFLOW: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/github-workflow.yml"
));

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();
    let command = args.command.unwrap_or(Command::Run(args.run));

    let verbose = match &command {
        Command::Run(run) | Command::Config(run) => run.verbose,
        Command::Workflow => false,
    };
    init_tracing(verbose);

    match command {
        Command::Run(run) => cmd_run(&run),
        Command::Workflow => cmd_workflow(),
        Command::Config(run) => cmd_config(&run),
    }
}

/// Logs go to stderr; stdout carries the tagged report lines.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn cmd_run(args: &RunArgs) -> Result<ExitCode> {
    let config = resolve(args)?;
    tracing::debug!(?config, "resolved pipeline config");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = pipeline::run_pipeline(&config, &mut out)?;
    out.flush().context("flush stdout")?;

    if let Some(path) = &args.report {
        util::write_json(path, &summary)?;
        tracing::info!(path = %path.display(), "wrote run report");
    }

    let code = summary.exit_code(config.exit_policy);
    if code != 0 {
        tracing::warn!(
            code,
            policy = ?config.exit_policy,
            critical_risk = summary.critical_risk,
            "exit policy failed the run"
        );
    }
    Ok(ExitCode::from(code))
}

fn cmd_workflow() -> Result<ExitCode> {
    let mut out = io::stdout().lock();
    out.write_all(GITHUB_WORKFLOW.as_bytes())
        .context("write workflow")?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_config(args: &RunArgs) -> Result<ExitCode> {
    let config = resolve(args)?;
    let text = serde_json::to_string_pretty(&config).context("serialize config")?;
    println!("{text}");
    Ok(ExitCode::SUCCESS)
}

fn resolve(args: &RunArgs) -> Result<config::PipelineConfig> {
    let cwd = std::env::current_dir().context("resolve cwd")?;
    config::resolve_config(args, &cwd, |key| std::env::var(key).ok())
}
