use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScreenError>;

/// Failure of a single remote lookup. Every variant marks the identifier as
/// "no result"; none of them abort a batch.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("no result for {0}")]
    NoResult(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("portal responded with status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("portal rejected query: {0}")]
    Rejected(String),

    #[error("malformed {field} value '{value}'")]
    MalformedNumber { field: &'static str, value: String },

    #[error("unexpected response shape: {0}")]
    Response(String),

    #[error("download handoff failed: {0}")]
    Io(#[from] std::io::Error),
}

impl QueryError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::NoResult(_) => "no_result",
            QueryError::Timeout(_) => "timeout",
            QueryError::Http(_) | QueryError::Status { .. } => "http",
            QueryError::Rejected(_) => "rejected",
            QueryError::MalformedNumber { .. } => "malformed_number",
            QueryError::Response(_) => "response",
            QueryError::Io(_) => "io",
        }
    }
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;
