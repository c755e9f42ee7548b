/// Unified error types for the Chatlog system.
use thiserror::Error;

/// Top-level error type for the Chatlog system.
#[derive(Debug, Error)]
pub enum ChatlogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No channel found for username '{0}'")]
    ChannelNotFound(String),

    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error("A fetch session is already running")]
    SessionRunning,

    #[error("No fetch session is running")]
    NoSession,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Problems with what the user typed into the page.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("username is required")]
    EmptyUsername,

    #[error("invalid timestamp '{0}', expected YYYY-MM-DD HH:MM:SS")]
    InvalidTimestamp(String),
}

/// Result type alias for Chatlog operations.
pub type ChatlogResult<T> = Result<T, ChatlogError>;
