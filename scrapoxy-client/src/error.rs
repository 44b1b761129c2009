//! Scrapoxy client error types and status classification.

use http::StatusCode;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type for Scrapoxy client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Opaque transport failure, passed through without interpretation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Message of [`ApiError::Decode`], raised when a success body is not JSON.
pub const DECODE_FAILURE: &str = "Can not decode response.";

/// Scrapoxy client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API rejected the credential (HTTP 403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The endpoint or resource does not exist (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other error status.
    #[error("API error: {0}")]
    Api(String),

    /// A success response whose body is not valid JSON.
    #[error("API error: {}", DECODE_FAILURE)]
    Decode,

    /// The request never produced a complete response.
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// The request payload could not be serialized.
    #[error("Failed to encode request payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// The client could not be configured.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// Build the error raised for a success response whose body is not JSON.
    pub fn decode_failure() -> Self {
        Self::Decode
    }

    /// Check if the credential was rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Check if the resource was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if a success response could not be decoded.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::Decode)
    }

    /// Check if this failure came from the transport rather than the API.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Raw response body (or fixed message) for status-derived errors.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(message) | Self::NotFound(message) | Self::Api(message) => {
                Some(message)
            }
            Self::Decode => Some(DECODE_FAILURE),
            _ => None,
        }
    }
}

/// Map a terminal status code (>= 400) and its raw body to an error.
///
/// Classification looks only at the status; the body is carried verbatim.
pub fn classify(status: StatusCode, body: String) -> ApiError {
    match status.as_u16() {
        403 => ApiError::Unauthorized(body),
        404 => ApiError::NotFound(body),
        _ => ApiError::Api(body),
    }
}
