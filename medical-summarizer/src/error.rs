use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single call to the completion provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authentication with the provider failed ({status})")]
    Authentication { status: u16 },

    #[error("rate limited by the provider")]
    RateLimited,

    #[error("provider request timed out")]
    Timeout,

    #[error("provider returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("provider request error: {0}")]
    Request(#[source] reqwest::Error),
}

/// Which way a provider call failed, kept on failed records and audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Authentication,
    RateLimited,
    Timeout,
    Http,
    Malformed,
    Request,
}

impl ProviderError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Authentication { .. } => ProviderErrorKind::Authentication,
            ProviderError::RateLimited => ProviderErrorKind::RateLimited,
            ProviderError::Timeout => ProviderErrorKind::Timeout,
            ProviderError::Http { .. } => ProviderErrorKind::Http,
            ProviderError::Malformed(_) => ProviderErrorKind::Malformed,
            ProviderError::Request(_) => ProviderErrorKind::Request,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::Malformed(e.to_string())
        } else {
            ProviderError::Request(e)
        }
    }
}

#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("Directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to read file {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("All {failed} notes failed to summarize; first error: {first_error}")]
    BatchFailed { failed: usize, first_error: String },

    #[error("Storage error on {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SummarizerError {
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SummarizerError::Storage {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SummarizerError>;
