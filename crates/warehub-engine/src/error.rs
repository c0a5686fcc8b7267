//! Engine error types

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while rendering or writing the site
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error("Failed to render template '{template}': {message}")]
    #[diagnostic(code(warehub::engine::template))]
    Template { template: String, message: String },

    #[error("Failed to write '{}'", path.display())]
    #[diagnostic(code(warehub::engine::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output path '{}' is not a directory", path.display())]
    #[diagnostic(
        code(warehub::engine::output),
        help("Point --output at a directory, or at a path that does not exist yet")
    )]
    NotADirectory { path: PathBuf },

    #[error("Package name '{name}' cannot be published")]
    #[diagnostic(
        code(warehub::engine::package_name),
        help("Package names must be normalized PEP 508 names; fix the display name in the store")
    )]
    InvalidPackageName { name: String },

    #[error("JSON error: {0}")]
    #[diagnostic(code(warehub::engine::json))]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn template(template: &str, err: minijinja::Error) -> Self {
        // minijinja keeps the useful part in the detail chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Template {
            template: template.to_string(),
            message,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<minijinja::Error> for EngineError {
    fn from(err: minijinja::Error) -> Self {
        let template = err.name().unwrap_or("<unknown>").to_string();
        Self::template(&template, err)
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
