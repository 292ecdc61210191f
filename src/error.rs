//! Error types for taskboard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, bad config, unknown task)
//! - 3: Blocked by policy (rejected transition, admin-only operation)
//! - 4: Operation failed (transport error, API error, I/O)

use thiserror::Error;

use crate::policy::Rejection;

/// Exit codes for the taskboard CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskboard operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("No board column for status '{0}'")]
    NoColumn(String),

    // Policy blocks (exit code 3)
    #[error("Transition rejected: {0}")]
    TransitionRejected(#[from] Rejection),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Operation failures (exit code 4)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("API rejected request: {0}")]
    ApiRejected(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

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
            | Error::NoColumn(_) => exit_codes::USER_ERROR,

            // Policy blocks
            Error::TransitionRejected(_) | Error::Forbidden(_) => exit_codes::POLICY_BLOCKED,

            // Operation failures
            Error::Http(_)
            | Error::Api { .. }
            | Error::ApiRejected(_)
            | Error::InvalidResponse(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error output, when the variant carries any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Api { status, .. } => Some(serde_json::json!({ "status": status })),
            Error::TransitionRejected(rejection) => serde_json::to_value(rejection).ok(),
            _ => None,
        }
    }

    /// True when the failure happened before any request reached the API.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfig(_)
                | Error::InvalidArgument(_)
                | Error::TaskNotFound(_)
                | Error::NoColumn(_)
                | Error::TransitionRejected(_)
                | Error::Forbidden(_)
        )
    }
}

/// Result type alias for taskboard operations
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
            details: err.details(),
        }
    }
}
