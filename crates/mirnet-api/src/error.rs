//! Error types for the API boundary
//!
//! `ApiError` covers every way a request can fail:
//! - Transport failures (connection refused, timeout)
//! - Non-success HTTP statuses
//! - Bodies that do not decode into the expected shape
//!
//! Its `Display` text is what the client shows to the user.

use std::path::PathBuf;

/// Failure of a single API request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Transport failure before a response arrived
    #[error("network error: {0}")]
    Network(String),

    /// Service answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body text (may be empty)
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    Decode(String),

    /// Request could not be built
    #[error("invalid request: {0}")]
    Request(String),
}

impl ApiError {
    /// Build a status error
    #[inline]
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::Request(err.to_string())
        } else if let Some(status) = err.status() {
            Self::status(status.as_u16(), err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for `ClientConfig`
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// API base is not an absolute http(s) URL
    #[error("invalid api base {base:?}: {reason}")]
    InvalidUrl {
        /// Offending value
        base: String,
        /// Why it was rejected
        reason: String,
    },
}
