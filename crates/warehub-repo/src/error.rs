//! Error types for fetching, building and storing

use thiserror::Error;
use warehub_core::CoreError;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Per-repository Errors ============
    #[error("Repository not found: {path}")]
    RepositoryNotFound { path: String },

    #[error("Authentication failed for {url} (HTTP {status})")]
    Authentication { url: String, status: u16 },

    #[error("Rate limited by server. Retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    // ============ Network Errors ============
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timeout after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    #[error("Asset {url} exceeds the {limit} byte download limit")]
    AssetTooLarge { url: String, limit: u64 },

    #[error("Downloaded {file} has SHA-256 {actual}, but the API reports {expected}")]
    DigestMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    // ============ Whole-run Errors ============
    #[error("Duplicate package name '{name}': produced by both {first} and {second}")]
    DuplicatePackageName {
        name: String,
        first: String,
        second: String,
    },

    #[error("Registry store {path} is locked by another writer")]
    ConcurrentModification { path: String },

    #[error("Invalid registry store {path}: {message}")]
    InvalidStore { path: String, message: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // ============ Other ============
    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl RepoError {
    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepoError::RateLimited { .. })
    }

    /// Whether the error aborts the whole run rather than one repository
    pub fn is_run_fatal(&self) -> bool {
        match self {
            RepoError::DuplicatePackageName { .. }
            | RepoError::ConcurrentModification { .. }
            | RepoError::InvalidStore { .. }
            | RepoError::Io(_)
            | RepoError::Serialization(_)
            | RepoError::Cancelled => true,
            RepoError::Core(core) => !matches!(core, CoreError::MissingSecret { .. }),
            _ => false,
        }
    }

    /// Server-requested wait before retrying, in seconds
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            RepoError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RepoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RepoError::Timeout { seconds: 0 }
        } else if e.is_connect() {
            RepoError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else if let Some(status) = e.status() {
            RepoError::HttpError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            RepoError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(e: serde_json::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}

impl From<url::ParseError> for RepoError {
    fn from(e: url::ParseError) -> Self {
        RepoError::NetworkError {
            message: format!("Invalid URL: {}", e),
        }
    }
}
