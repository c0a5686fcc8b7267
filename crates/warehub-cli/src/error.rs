//! CLI error types with exit code handling
//!
//! Library errors are folded into [`CliError`], which carries the help text
//! shown under the diagnostic and the process exit code.

use miette::Diagnostic;
use thiserror::Error;
use warehub_core::CoreError;
use warehub_engine::EngineError;
use warehub_repo::RepoError;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// `config.json` missing or invalid
    #[error("Config error: {message}")]
    #[diagnostic(code(warehub::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The registry store could not be read or written
    #[error("Store error: {message}")]
    #[diagnostic(code(warehub::cli::store))]
    Store {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A tracked repository or addition request is invalid
    #[error("Repository error: {message}")]
    #[diagnostic(code(warehub::cli::repository))]
    Repository {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// `SECRETS` missing a key or malformed
    #[error("Secrets error: {message}")]
    #[diagnostic(code(warehub::cli::secrets))]
    Secrets {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Site generation failed
    #[error("Generate error: {message}")]
    #[diagnostic(code(warehub::cli::generate))]
    Generate { message: String },

    /// Interrupted before anything was written
    #[error("Cancelled, nothing was written")]
    #[diagnostic(code(warehub::cli::cancelled))]
    Cancelled,

    /// Arguments that parse but do not make sense together
    #[error("{message}")]
    #[diagnostic(code(warehub::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(warehub::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(warehub::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            _ => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a usage error with help text
    pub fn usage(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    fn store(message: impl Into<String>, help: Option<&str>) -> Self {
        Self::Store {
            message: message.into(),
            help: help.map(str::to_string),
        }
    }

    fn repository(message: impl Into<String>, help: Option<&str>) -> Self {
        Self::Repository {
            message: message.into(),
            help: help.map(str::to_string),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::MissingSecret { .. } => CliError::Secrets {
                message,
                help: Some("Add the key to the JSON object in the SECRETS environment variable".into()),
            },
            CoreError::InvalidSecrets { .. } => CliError::Secrets {
                message,
                help: Some(r#"SECRETS must be a JSON object of strings, e.g. {"USERNAME": "..."}"#.into()),
            },
            CoreError::InvalidConfig { .. } => CliError::Config {
                message,
                help: Some(
                    r#"config.json needs at least {"title": "...", "url": "..."}; see --config"#.into(),
                ),
            },
            CoreError::InvalidRepository { .. } => {
                CliError::repository(message, Some("Repositories are given as owner/name"))
            }
            CoreError::InvalidRequest { .. } => CliError::repository(
                message,
                Some("Requests are lines of the form '- **Repository:** owner/name'"),
            ),
            CoreError::JsonParse(_) => CliError::Internal { message },
            CoreError::Io(_) => CliError::Io { message },
        }
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        let message = err.to_string();
        match err {
            RepoError::Core(core) => core.into(),
            RepoError::ConcurrentModification { .. } => CliError::store(
                message,
                Some("Another warehub process is writing the store; retry once it has finished"),
            ),
            RepoError::InvalidStore { .. } => CliError::store(
                message,
                Some("Restore the file from version control, or move it aside to start over"),
            ),
            RepoError::DuplicatePackageName { .. } => CliError::repository(
                message,
                Some("Give one repository a distinct package name with `warehub add --name`"),
            ),
            RepoError::RepositoryNotFound { .. } => {
                CliError::repository(message, Some("See `warehub list` for tracked repositories"))
            }
            RepoError::Cancelled => CliError::Cancelled,
            RepoError::Io(_) => CliError::Io { message },
            _ => CliError::Internal { message },
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        CliError::Generate {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
