//! Repository-addition requests
//!
//! Operators ask for a repository to be indexed by opening an issue whose
//! body lists fields as markdown bullets:
//!
//! ```text
//! - **Domain:** https://api.github.com
//! - **Repository:** owner/name
//! - **Username:** %%USERNAME%%
//! - **Password:** %%PASSWORD%%
//! ```
//!
//! Unknown fields are ignored. Missing or empty fields take their defaults;
//! only `Repository` is required.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{CoreError, Result};
use crate::repository::{CredentialRef, DEFAULT_DOMAIN, TrackedRepository};
use crate::secrets::placeholder;

static FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \*\*(\w+):\*\*\s*(.*)$").expect("field pattern is valid"));

/// Parsed request fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdditionRequest {
    pub domain: Option<String>,
    pub repository: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl AdditionRequest {
    /// Parse an issue body
    pub fn parse(body: &str) -> Self {
        let mut request = Self::default();

        for line in body.replace('\r', "").lines() {
            let Some(caps) = FIELD.captures(line.trim_end()) else {
                continue;
            };
            let value = caps[2].trim();
            if value.is_empty() {
                continue;
            }
            let value = Some(value.to_string());

            match caps[1].to_lowercase().as_str() {
                "domain" => request.domain = value,
                "repository" => request.repository = value,
                "username" => request.username = value,
                "password" => request.password = value,
                "name" => request.name = value,
                _ => {}
            }
        }

        request
    }

    /// Extract the issue body from a GitHub Actions context
    /// (`GITHUB_CONTEXT` = `${{ toJSON(github) }}`) and parse it
    pub fn from_github_context(context: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(context)?;
        let body = value
            .pointer("/event/issue/body")
            .and_then(|b| b.as_str())
            .ok_or_else(|| CoreError::InvalidRequest {
                message: "GitHub context has no event.issue.body".to_string(),
            })?;
        Ok(Self::parse(body))
    }

    /// Build the repository, applying defaults
    pub fn into_repository(self) -> Result<TrackedRepository> {
        let path = self.repository.ok_or_else(|| CoreError::InvalidRequest {
            message: "missing required field 'Repository'".to_string(),
        })?;

        let credentials = CredentialRef::new(
            self.username.unwrap_or_else(|| placeholder("USERNAME")),
            self.password.unwrap_or_else(|| placeholder("PASSWORD")),
        );

        let mut repo = TrackedRepository::new(path)?
            .with_domain(self.domain.unwrap_or_else(|| DEFAULT_DOMAIN.to_string()))?
            .with_credentials(credentials);
        if let Some(name) = self.name {
            repo = repo.with_display_name(name)?;
        }
        repo.validate()?;
        Ok(repo)
    }
}
