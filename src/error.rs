#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Missing element: {0}")]
    MissingElement(String),
    #[error("Unsupported question type: {0}")]
    UnsupportedQuestionType(String),
    #[error("Invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("Navigation failed: {0}")]
    Navigation(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("Serialization error")]
    Serialize(#[from] serde_json::Error),
    #[error("HTTP error")]
    Http(#[from] reqwest::Error),
    #[error("Rejected with status {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Extraction is already running")]
    AlreadyRunning,
    #[error("Failed to flush results")]
    SinkFlush(#[from] SinkError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at most {max_ms}ms, got {value_ms}ms")]
    DelayOutOfRange {
        field: &'static str,
        value_ms: u64,
        max_ms: u64,
    },
}
