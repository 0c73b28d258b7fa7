//! Build-failure risk prediction over HTTP.
//!
//! A single GET against the configured endpoint, decoded into a [`Prediction`].
//! The request is bounded by an overall timeout; there is no retry.
use crate::report::FailureKind;
use crate::util::truncate_string;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io;
use std::time::{Duration, Instant};

pub const DEFAULT_PREDICT_URL: &str = "https://mock-ai-api.com/predict";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 0.7;

const LOG_PREVIEW_BYTES: usize = 256;

/// Response body of the prediction endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Likelihood in [0, 1] that the change breaks the build. Not validated.
    pub failure_probability: f64,
    pub suggestion: String,
}

impl Prediction {
    pub fn summary_line(&self) -> String {
        format!(
            "AI Prediction: {:.2}% failure probability. Suggestion: {}",
            self.failure_probability * 100.0,
            self.suggestion
        )
    }

    /// Strictly above `threshold`.
    pub fn is_critical(&self, threshold: f64) -> bool {
        self.failure_probability > threshold
    }
}

pub struct PredictClient {
    agent: ureq::Agent,
    url: String,
}

impl PredictClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        // Error statuses still carry a body worth decoding.
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            url: url.into(),
        }
    }

    pub fn fetch(&self) -> Result<Prediction> {
        let start = Instant::now();
        let mut response = self
            .agent
            .get(&self.url)
            .call()
            .with_context(|| format!("GET {}", self.url))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .context("read prediction response body")?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            status,
            body_bytes = body.len(),
            "prediction request complete"
        );
        if !(200..300).contains(&status) {
            tracing::debug!(
                status,
                body = %truncate_string(&String::from_utf8_lossy(&body), LOG_PREVIEW_BYTES),
                "prediction endpoint returned error status"
            );
        }

        parse_prediction(&body)
    }
}

/// Decode a response body. Only a JSON object is accepted; invalid UTF-8 is
/// replaced with U+FFFD before decoding.
pub fn parse_prediction(body: &[u8]) -> Result<Prediction> {
    let text = String::from_utf8_lossy(body);
    let object: Map<String, Value> =
        serde_json::from_str(&text).context("decode prediction response")?;
    serde_json::from_value(Value::Object(object)).context("decode prediction response")
}

/// Classify an error returned by [`PredictClient::fetch`].
pub fn failure_kind(err: &anyhow::Error) -> FailureKind {
    if let Some(err) = err.downcast_ref::<ureq::Error>() {
        return match err {
            ureq::Error::Timeout(_) => FailureKind::Timeout,
            ureq::Error::Io(source) if source.kind() == io::ErrorKind::TimedOut => {
                FailureKind::Timeout
            }
            _ => FailureKind::Transport,
        };
    }
    if err.downcast_ref::<serde_json::Error>().is_some() {
        return FailureKind::Decode;
    }
    FailureKind::Transport
}
