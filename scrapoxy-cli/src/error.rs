//! Error types for the Scrapoxy CLI.

use std::fmt;

use scrapoxy_client::ApiError;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types.
#[derive(Debug)]
pub enum CliError {
    /// The commander call failed.
    Api(ApiError),

    /// Invalid argument
    InvalidArgument(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Api(ApiError::Unauthorized(_)) => 3,
            CliError::Api(ApiError::NotFound(_)) => 4,
            CliError::Api(_) => 1,
            CliError::InvalidArgument(_) => 2,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Api(e) => write!(f, "{}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Api(e) => Some(e),
            CliError::InvalidArgument(_) => None,
        }
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        CliError::Api(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::InvalidArgument(err.to_string())
    }
}
