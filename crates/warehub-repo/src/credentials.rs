//! Credential resolution and scoping
//!
//! Credentials are stored as written by the operator (usually `%%KEY%%`
//! placeholders) and resolved against the secrets map only when a fetch
//! starts. Resolved values are scoped to the repository's API origin and are
//! never sent after a cross-origin redirect.

use std::collections::HashMap;
use std::fmt;
use url::Url;
use warehub_core::{CredentialRef, SecretLookup, resolve};

use crate::error::Result;

/// Resolved credentials ready for use
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedCredentials {
    Basic { username: String, password: String },
    Bearer { token: String },
}

impl ResolvedCredentials {
    /// Resolve placeholders against the secrets map.
    ///
    /// Both values empty means anonymous access (`None`). A password without
    /// a username is sent as a bearer token.
    pub fn resolve<L: SecretLookup + ?Sized>(
        credentials: &CredentialRef,
        secrets: &L,
    ) -> Result<Option<Self>> {
        let username = resolve(&credentials.username, secrets)?;
        let password = resolve(&credentials.password, secrets)?;

        Ok(match (username.is_empty(), password.is_empty()) {
            (true, true) => None,
            (true, false) => Some(ResolvedCredentials::Bearer { token: password }),
            _ => Some(ResolvedCredentials::Basic { username, password }),
        })
    }

    /// Authorization header value
    pub fn auth_header(&self) -> String {
        match self {
            ResolvedCredentials::Basic { username, password } => {
                let encoded = base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    format!("{}:{}", username, password),
                );
                format!("Basic {}", encoded)
            }
            ResolvedCredentials::Bearer { token } => format!("Bearer {}", token),
        }
    }
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedCredentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            ResolvedCredentials::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// Scoped credentials - maps URL prefixes to credentials
/// SECURITY: Never sends credentials to URLs outside the scope
#[derive(Debug, Clone, Default)]
pub struct ScopedCredentials {
    scopes: HashMap<String, ResolvedCredentials>,
}

impl ScopedCredentials {
    /// Scope a single set of credentials to one URL prefix
    pub fn for_prefix(url_prefix: &str, credentials: Option<ResolvedCredentials>) -> Self {
        let mut scoped = Self::default();
        if let Some(credentials) = credentials {
            scoped.add(url_prefix, credentials);
        }
        scoped
    }

    /// Add credentials for a URL scope
    pub fn add(&mut self, url_prefix: &str, credentials: ResolvedCredentials) {
        let prefix = url_prefix.trim_end_matches('/').to_string();
        self.scopes.insert(prefix, credentials);
    }

    /// Get credentials for a URL (by longest matching prefix)
    pub fn for_url(&self, url: &str) -> Option<&ResolvedCredentials> {
        self.scopes
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, creds)| creds)
    }

    /// Check if two URLs are same-origin (for redirect safety)
    pub fn same_origin(url1: &str, url2: &str) -> bool {
        match (Url::parse(url1), Url::parse(url2)) {
            (Ok(u1), Ok(u2)) => {
                u1.scheme() == u2.scheme()
                    && u1.host() == u2.host()
                    && u1.port_or_known_default() == u2.port_or_known_default()
            }
            _ => false,
        }
    }
}
