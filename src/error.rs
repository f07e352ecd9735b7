use thiserror::Error;

/// Errors surfaced by the suite core and its supporting layers.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("test case not found for file_id: {0}")]
    CaseNotFound(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("duplicate file_id in registry: {0}")]
    DuplicateCaseId(String),

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("invalid configuration for `{key}`: {message}")]
    Config { key: &'static str, message: String },

    #[error("invalid URL `{url}`: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unauthorized")]
    Unauthorized,

    #[error("authentication failed with status {status}: {body}")]
    AuthFailed { status: u16, body: String },

    #[error("authentication succeeded but no token was returned")]
    TokenMissing,

    #[error("failed to parse response body as JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("failed to {action} `{path}`: {message}")]
    Io {
        action: &'static str,
        path: String,
        message: String,
    },
}
