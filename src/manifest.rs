//! Deployment manifest probe check.
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MANIFEST: &str = "deployment.yaml";
pub const LIVENESS_MARKER: &str = "livenessProbe";
pub const READINESS_MARKER: &str = "readinessProbe";

/// Which health-check declarations a manifest contains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ManifestReport {
    pub path: PathBuf,
    pub liveness_probe: bool,
    pub readiness_probe: bool,
}

impl ManifestReport {
    /// Scan raw manifest bytes; the content need not be valid UTF-8.
    pub fn scan(path: &Path, content: &[u8]) -> Self {
        Self {
            path: path.to_path_buf(),
            liveness_probe: contains(content, LIVENESS_MARKER.as_bytes()),
            readiness_probe: contains(content, READINESS_MARKER.as_bytes()),
        }
    }

    pub fn probes_complete(&self) -> bool {
        self.liveness_probe && self.readiness_probe
    }
}

/// Read the manifest at `path` and report which probes it declares.
pub fn analyze_manifest(path: &Path) -> Result<ManifestReport> {
    let content = fs::read(path).with_context(|| format!("read manifest {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        bytes = content.len(),
        "manifest loaded"
    );
    Ok(ManifestReport::scan(path, &content))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}
