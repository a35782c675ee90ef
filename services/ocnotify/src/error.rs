//! Error types for ocnotify

/// Errors that can occur while resolving configuration or delivering a notification
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dry-run probe failed (status {status:?}): {output}")]
    Probe { status: Option<i32>, output: String },

    #[error("Channel '{0}' is not configured for the local CLI")]
    ChannelUnconfigured(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Result type alias for ocnotify operations
pub type Result<T> = std::result::Result<T, NotifyError>;
