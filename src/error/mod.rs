use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Subscription stream errors.
///
/// The taxonomy matters to callers: `Parse` is recovered locally (the line
/// is skipped and the stream continues), `Transport` and `Timeout` are
/// recovered by the client's automatic reconnect, and `Application` is
/// terminal - the producer has rejected the query and a retry would be
/// rejected the same way.
#[derive(Debug, Error, Clone)]
pub enum StreamError {
    #[error("Malformed stream message: {message}")]
    Parse { message: String },

    #[error("Connection error: {message}")]
    Transport { message: String },

    #[error("Reasoning engine rejected the request: {message}")]
    Application { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl StreamError {
    /// Wrap an HTTP error as a transport failure, preserving timeouts.
    pub fn from_http(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            StreamError::Timeout { timeout_ms }
        } else {
            StreamError::Transport {
                message: err.to_string(),
            }
        }
    }

    /// Whether the client's reconnect loop may retry after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StreamError::Transport { .. } | StreamError::Timeout { .. } | StreamError::Api { .. }
        )
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for stream operations
pub type StreamResult<T> = Result<T, StreamError>;
