//! Error types for the reporting pipeline.

/// Reporting errors.
///
/// None of these are allowed to fail the host test run; callers log them and
/// carry on with whatever was resolved so far.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Config file missing, unreadable or malformed.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Filesystem error while discovering or writing attachments.
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Network error talking to the results service.
    #[error("network error: {message}")]
    Network { message: String },

    /// The results service answered with something we could not interpret.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

impl From<reqwest::Error> for ReportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for reporting operations.
pub type ReportResult<T> = Result<T, ReportError>;
