//! Error types for TravelKit

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while collecting travel data
#[derive(Debug, Error)]
pub enum TravelError {
    /// Reading or writing a local file failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A local JSON document did not have the expected shape
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// SERVICE_KEY is not configured
    #[error("Missing required configuration: SERVICE_KEY")]
    MissingServiceKey,

    /// Some other configuration value is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Upstream answered with something other than 200
    #[error("Unexpected status code: {0}")]
    HttpStatus(u16),

    /// Response body could not be read
    #[error("Failed to read response body: {0}")]
    BodyRead(String),
}

impl TravelError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TravelError::Timeout
        } else if err.is_connect() {
            TravelError::ConnectError(err)
        } else {
            TravelError::RequestError(err.to_string())
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TravelError::Io {
            path: path.into(),
            source,
        }
    }
}
