//! Pipeline configuration.
//!
//! Each setting resolves in priority order: CLI flag, JSON config file,
//! environment variable, built-in default.
use crate::cli::RunArgs;
use crate::lint::DEFAULT_LINT_COMMAND;
use crate::manifest::DEFAULT_MANIFEST;
use crate::predict::{DEFAULT_CRITICAL_THRESHOLD, DEFAULT_PREDICT_URL, DEFAULT_TIMEOUT_SECS};
use crate::report::ExitPolicy;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_CONFIG_FILE: &str = "cicd-optimizer.json";

pub const ENV_LINT_COMMAND: &str = "CICD_LINT_COMMAND";
pub const ENV_PREDICT_URL: &str = "CICD_PREDICT_URL";
pub const ENV_MANIFEST: &str = "CICD_MANIFEST";

/// Fully resolved settings for one run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub lint_command: String,
    pub predict_url: String,
    pub predict_timeout_secs: u64,
    pub critical_threshold: f64,
    pub manifest: PathBuf,
    pub exit_policy: ExitPolicy,
}

impl PipelineConfig {
    pub fn predict_timeout(&self) -> Duration {
        Duration::from_secs(self.predict_timeout_secs)
    }
}

/// On-disk config. Every setting is optional so a file can override a subset.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub schema_version: u32,
    #[serde(default)]
    pub lint_command: Option<String>,
    #[serde(default)]
    pub predict_url: Option<String>,
    #[serde(default)]
    pub predict_timeout_secs: Option<u64>,
    #[serde(default)]
    pub critical_threshold: Option<f64>,
    #[serde(default)]
    pub manifest: Option<PathBuf>,
    #[serde(default)]
    pub exit_policy: Option<ExitPolicy>,
}

pub fn default_config() -> PipelineConfig {
    PipelineConfig {
        lint_command: DEFAULT_LINT_COMMAND.to_string(),
        predict_url: DEFAULT_PREDICT_URL.to_string(),
        predict_timeout_secs: DEFAULT_TIMEOUT_SECS,
        critical_threshold: DEFAULT_CRITICAL_THRESHOLD,
        manifest: PathBuf::from(DEFAULT_MANIFEST),
        exit_policy: ExitPolicy::AlwaysZero,
    }
}

pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let file: ConfigFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    if file.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {} in {}",
            file.schema_version,
            path.display()
        ));
    }
    Ok(file)
}

/// Resolve the effective config for `args`.
///
/// `cwd` anchors the default config file lookup; `env` reads environment
/// variables so callers can substitute a fixed map.
pub fn resolve_config<F>(args: &RunArgs, cwd: &Path, env: F) -> Result<PipelineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match &args.config {
        Some(path) => load_config_file(path)?,
        None => {
            let candidate = cwd.join(DEFAULT_CONFIG_FILE);
            if candidate.is_file() {
                load_config_file(&candidate)?
            } else {
                ConfigFile::default()
            }
        }
    };

    let mut config = default_config();
    if let Some(value) = env(ENV_LINT_COMMAND) {
        config.lint_command = value;
    }
    if let Some(value) = env(ENV_PREDICT_URL) {
        config.predict_url = value;
    }
    if let Some(value) = env(ENV_MANIFEST) {
        config.manifest = PathBuf::from(value);
    }

    apply_layer(
        &mut config,
        ConfigLayer {
            lint_command: file.lint_command,
            predict_url: file.predict_url,
            predict_timeout_secs: file.predict_timeout_secs,
            critical_threshold: file.critical_threshold,
            manifest: file.manifest,
            exit_policy: file.exit_policy,
        },
    );
    apply_layer(
        &mut config,
        ConfigLayer {
            lint_command: args.lint_command.clone(),
            predict_url: args.predict_url.clone(),
            predict_timeout_secs: args.predict_timeout_secs,
            critical_threshold: args.critical_threshold,
            manifest: args.manifest.clone(),
            exit_policy: args.exit_policy,
        },
    );

    validate_config(&config)?;
    Ok(config)
}

struct ConfigLayer {
    lint_command: Option<String>,
    predict_url: Option<String>,
    predict_timeout_secs: Option<u64>,
    critical_threshold: Option<f64>,
    manifest: Option<PathBuf>,
    exit_policy: Option<ExitPolicy>,
}

fn apply_layer(config: &mut PipelineConfig, layer: ConfigLayer) {
    if let Some(value) = layer.lint_command {
        config.lint_command = value;
    }
    if let Some(value) = layer.predict_url {
        config.predict_url = value;
    }
    if let Some(value) = layer.predict_timeout_secs {
        config.predict_timeout_secs = value;
    }
    if let Some(value) = layer.critical_threshold {
        config.critical_threshold = value;
    }
    if let Some(value) = layer.manifest {
        config.manifest = value;
    }
    if let Some(value) = layer.exit_policy {
        config.exit_policy = value;
    }
}

pub fn validate_config(config: &PipelineConfig) -> Result<()> {
    if config.lint_command.trim().is_empty() {
        return Err(anyhow!("lint_command must be non-empty"));
    }
    let url = config.predict_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(anyhow!(
            "predict_url must be an http:// or https:// URL (got {:?})",
            config.predict_url
        ));
    }
    if config.predict_timeout_secs == 0 {
        return Err(anyhow!("predict_timeout_secs must be greater than zero"));
    }
    if !(0.0..=1.0).contains(&config.critical_threshold) {
        return Err(anyhow!(
            "critical_threshold must be within [0, 1] (got {})",
            config.critical_threshold
        ));
    }
    if config.manifest.as_os_str().is_empty() {
        return Err(anyhow!("manifest path must be non-empty"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
