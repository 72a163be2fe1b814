//! Metadata client errors

use thiserror::Error;

/// Errors that can occur when reading instance metadata
#[derive(Debug, Error)]
pub enum MetadataError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The metadata endpoint answered with an error status
    #[error("Metadata API error: {0}")]
    Api(String),

    /// JSON deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
