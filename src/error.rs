//! Error types for sprintsync
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, bad config)
//! - 3: Authentication required (no session, expired session, 401)
//! - 4: Operation failed (network error, server-side rejection)

use thiserror::Error;

/// Exit codes for the sprintsync CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const AUTH_REQUIRED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for sprintsync operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    // Authentication (exit code 3)
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Authentication required: {0}")]
    AuthRequired(String),

    // Operation failures (exit code 4)
    /// The server answered with a non-success envelope or HTTP status.
    #[error("Server rejected request ({status_code}): {message}")]
    Api { status_code: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::TaskNotFound(_)
            | Error::UserNotFound(_) => exit_codes::USER_ERROR,

            // Authentication
            Error::NotLoggedIn | Error::AuthRequired(_) => exit_codes::AUTH_REQUIRED,

            // Operation failures
            Error::Api { .. }
            | Error::Http(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for sprintsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: None,
        }
    }
}
