//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Requested secret not present: {key}")]
    MissingSecret { key: String },

    #[error("Invalid SECRETS value: {message}")]
    InvalidSecrets { message: String },

    #[error("Invalid config: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid repository '{path}': {reason}")]
    InvalidRepository { path: String, reason: String },

    #[error("Invalid repository request: {message}")]
    InvalidRequest { message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
