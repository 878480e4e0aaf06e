//! Client for the Tesults results API.
//!
//! A single `POST /results` per run. There is no retry: the status the
//! service returns is handed back to the caller as-is.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ReportError, ReportResult};
use crate::model::{Report, SubmitStatus};

pub const DEFAULT_URL: &str = "https://www.tesults.com";

const USER_AGENT_VALUE: &str = concat!("tesults-rs/", env!("CARGO_PKG_VERSION"));

/// Something that accepts a finished report.
#[async_trait]
pub trait ResultsSink: Send + Sync {
    async fn submit(&self, report: &Report) -> ReportResult<SubmitStatus>;
}

/// Connection settings for [`TesultsClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

impl ClientConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// HTTP implementation of [`ResultsSink`].
#[derive(Debug, Clone)]
pub struct TesultsClient {
    client: reqwest::Client,
    base_url: String,
}

impl TesultsClient {
    pub fn new(config: ClientConfig) -> ReportResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ReportError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn results_url(&self) -> String {
        format!("{}/results", self.base_url)
    }
}

#[async_trait]
impl ResultsSink for TesultsClient {
    async fn submit(&self, report: &Report) -> ReportResult<SubmitStatus> {
        let url = self.results_url();
        debug!(url = %url, cases = report.results.cases.len(), "submitting results");

        let response = self.client.post(&url).json(report).send().await?;
        let status = response.status();
        let body = response.text().await.map_err(|e| ReportError::Network {
            message: format!("failed to read response body: {}", e),
        })?;
        debug!(status = status.as_u16(), "results service responded");

        parse_response(&body).ok_or_else(|| ReportError::InvalidResponse {
            message: format!("HTTP {}: {}", status.as_u16(), truncate(&body, 200)),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    data: Option<Outcome>,
    #[serde(default)]
    error: Option<Outcome>,
}

#[derive(Debug, Deserialize)]
struct Outcome {
    #[serde(default)]
    message: String,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    errors: Vec<String>,
}

/// `{"data": {...}}` is success, `{"error": {...}}` is rejection.
fn parse_response(body: &str) -> Option<SubmitStatus> {
    let parsed: ResponseBody = serde_json::from_str(body).ok()?;
    let (success, outcome) = match (parsed.data, parsed.error) {
        (_, Some(error)) => (false, error),
        (Some(data), None) => (true, data),
        (None, None) => return None,
    };
    let mut errors = outcome.errors;
    if !success && errors.is_empty() && !outcome.message.is_empty() {
        errors.push(outcome.message.clone());
    }
    Some(SubmitStatus {
        success,
        message: outcome.message,
        warnings: outcome.warnings,
        errors,
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
