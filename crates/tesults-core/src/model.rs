//! Wire model for the Tesults results API.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result of a single case as Tesults understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseResult {
    Pass,
    Fail,
    #[default]
    Unknown,
}

impl CaseResult {
    /// Map the runner's outcome vocabulary (`passed`, `failed`, ...).
    pub fn from_outcome(outcome: &str) -> Self {
        match outcome {
            "passed" => Self::Pass,
            "failed" => Self::Fail,
            _ => Self::Unknown,
        }
    }

    /// Coerce a user-supplied build result; anything unrecognised is `unknown`.
    pub fn coerce(value: &str) -> Self {
        match value {
            "pass" => Self::Pass,
            "fail" => Self::Fail,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finalized test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,

    pub result: CaseResult,

    /// Start of execution, ms since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,

    /// End of execution, ms since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,

    /// Empty for passing cases, the rendered failure otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    /// Never `Some(vec![])`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<PathBuf>>,

    /// Custom tags, keys already carry the `_` prefix.
    #[serde(flatten)]
    pub custom: BTreeMap<String, String>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, result: CaseResult) -> Self {
        Self {
            name: name.into(),
            suite: None,
            result,
            start: None,
            end: None,
            reason: None,
            params: None,
            desc: None,
            files: None,
            custom: BTreeMap::new(),
        }
    }

    /// Wall-clock duration, when both bounds are known.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// Outbound payload for `POST /results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub target: String,
    pub results: Results,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Results {
    pub cases: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub integration_name: String,
    pub integration_version: String,
    pub test_framework: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            integration_name: "tesults-rs".to_string(),
            integration_version: env!("CARGO_PKG_VERSION").to_string(),
            test_framework: "libtest".to_string(),
        }
    }
}

/// Status returned by the results service for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmitStatus {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}
