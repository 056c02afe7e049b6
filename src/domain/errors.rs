//! Error taxonomy for the lead ingestion pipeline
//!
//! Fetch errors stay local to one page and are never surfaced by the
//! pipeline. Configuration and storage errors are the only failures a caller
//! of [`crate::application::IngestionPipeline`] ever sees.

use thiserror::Error;

/// Failure of a single page fetch after the retry budget was spent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Request timed out: {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Empty response body from {url}")]
    EmptyBody { url: String },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => {
                matches!(status, 429 | 500 | 502 | 503 | 504)
            }
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::EmptyBody { .. } | Self::InvalidUrl { .. } => false,
        }
    }
}

/// Invalid invocation parameters or configuration, raised before any network activity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Invalid spreadsheet identifier: '{0}'")]
    InvalidSpreadsheetId(String),

    #[error("Invalid source mode '{0}' (expected one of: directories, google, both)")]
    InvalidSourceMode(String),

    #[error("Lead count must be a positive integer, got {0}")]
    InvalidTargetCount(i64),

    #[error("City name must not be empty")]
    EmptyCity,

    #[error("Invalid {name} pattern '{pattern}': {reason}")]
    InvalidPattern {
        name: String,
        pattern: String,
        reason: String,
    },

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid delay range: min {min_ms}ms is greater than max {max_ms}ms")]
    InvalidDelayRange { min_ms: u64, max_ms: u64 },

    #[error("User agent pool must contain at least one entry")]
    EmptyUserAgentPool,

    #[error("Retry budget must allow at least one attempt")]
    InvalidRetryBudget,

    #[error("Header schema does not match the lead table layout: {0:?}")]
    HeaderSchemaMismatch(Vec<String>),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Table backend unreachable, rejecting a write, or holding an unexpected layout
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Table backend error: {0}")]
    Backend(String),

    #[error("Table '{table}' has an unexpected header {found:?}; refusing to modify it")]
    SchemaMismatch { table: String, found: Vec<String> },

    #[error("Table '{0}' not found")]
    TableNotFound(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Backend(format!("row encoding: {err}"))
    }
}

/// Errors surfaced by an ingestion run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        for status in [429, 500, 502, 503, 504] {
            let err = FetchError::Status { status, url: "https://x.test".into() };
            assert!(err.is_retryable(), "{status} should be retryable");
        }
        for status in [400, 401, 403, 404, 410] {
            let err = FetchError::Status { status, url: "https://x.test".into() };
            assert!(!err.is_retryable(), "{status} should not be retryable");
        }
    }

    #[test]
    fn test_transport_errors_are_retryable() {
        assert!(FetchError::Timeout { url: "u".into() }.is_retryable());
        assert!(
            FetchError::Network { url: "u".into(), message: "refused".into() }.is_retryable()
        );
        assert!(!FetchError::EmptyBody { url: "u".into() }.is_retryable());
    }

    #[test]
    fn test_ingestion_error_wraps_layers() {
        let err: IngestionError = ConfigurationError::EmptyCity.into();
        assert!(matches!(err, IngestionError::Configuration(_)));
        assert_eq!(err.to_string(), "City name must not be empty");

        let err: IngestionError = StorageError::Backend("down".into()).into();
        assert!(matches!(err, IngestionError::Storage(_)));
    }
}
