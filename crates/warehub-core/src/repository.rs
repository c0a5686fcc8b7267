//! Tracked repository definitions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::name::{default_package_name, is_valid_name, normalize_name};
use crate::secrets::{SecretValue, placeholder};

/// GitHub REST API, used when a repository names no domain
pub const DEFAULT_DOMAIN: &str = "https://api.github.com";

/// A source repository whose releases feed the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedRepository {
    /// Hosting API base URL
    #[serde(default = "default_domain")]
    pub domain: String,

    /// `owner/name`
    pub path: String,

    /// Package name override (normalized before use)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Credentials, possibly as `%%KEY%%` placeholders
    #[serde(default)]
    pub credentials: CredentialRef,
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

impl TrackedRepository {
    /// Create a repository on the default domain with placeholder credentials
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into().trim().trim_matches('/').to_string();
        validate_path(&path)?;

        Ok(Self {
            domain: default_domain(),
            path,
            display_name: None,
            credentials: CredentialRef::default(),
        })
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Result<Self> {
        let domain = domain.into().trim().trim_end_matches('/').to_string();
        if !(domain.starts_with("http://") || domain.starts_with("https://")) {
            return Err(CoreError::InvalidRepository {
                path: self.path,
                reason: format!("domain must start with http:// or https://, got '{domain}'"),
            });
        }
        self.domain = domain;
        Ok(self)
    }

    /// Override the package name. The name must be a valid distribution
    /// name, since it ends up in site paths.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_string();
        if !is_valid_name(&name) {
            return Err(CoreError::InvalidRepository {
                path: self.path,
                reason: format!("'{name}' is not a valid package name"),
            });
        }
        self.display_name = Some(name);
        Ok(self)
    }

    pub fn with_credentials(mut self, credentials: CredentialRef) -> Self {
        self.credentials = credentials;
        self
    }

    /// Repository name without the owner
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn owner(&self) -> &str {
        self.path.split('/').next().unwrap_or_default()
    }

    /// Normalized package name this repository publishes
    pub fn package_name(&self) -> String {
        match &self.display_name {
            Some(name) => normalize_name(name),
            None => default_package_name(self.basename()),
        }
    }

    /// Check a repository that did not go through the builders, such as one
    /// read back from the store
    pub fn validate(&self) -> Result<()> {
        validate_path(&self.path)?;
        if let Some(name) = self.display_name.as_deref().filter(|n| !is_valid_name(n)) {
            return Err(CoreError::InvalidRepository {
                path: self.path.clone(),
                reason: format!("'{name}' is not a valid package name"),
            });
        }
        let package = self.package_name();
        if !is_valid_name(&package) {
            return Err(CoreError::InvalidRepository {
                path: self.path.clone(),
                reason: format!("derived package name '{package}' is not valid, set a display name"),
            });
        }
        Ok(())
    }

    /// Browser URL of the repository. GitHub Enterprise serves its API
    /// under `/api/v3` on the web host.
    pub fn web_url(&self) -> String {
        let domain = self.domain.trim_end_matches('/');
        let web = if domain == DEFAULT_DOMAIN {
            "https://github.com"
        } else {
            domain.strip_suffix("/api/v3").unwrap_or(domain)
        };
        format!("{}/{}", web, self.path)
    }

    /// Release listing endpoint
    pub fn releases_url(&self) -> String {
        format!(
            "{}/repos/{}/releases",
            self.domain.trim_end_matches('/'),
            self.path
        )
    }
}

fn validate_path(path: &str) -> Result<()> {
    let segments: Vec<&str> = path.split('/').collect();
    let valid = segments.len() == 2
        && segments.iter().all(|s| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        });

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidRepository {
            path: path.to_string(),
            reason: "expected the form owner/name".to_string(),
        })
    }
}

/// Username/password pair as written by the operator
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRef {
    pub username: String,
    pub password: String,
}

impl CredentialRef {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for CredentialRef {
    fn default() -> Self {
        Self {
            username: placeholder("USERNAME"),
            password: placeholder("PASSWORD"),
        }
    }
}

impl fmt::Debug for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if SecretValue::parse(&self.password).is_placeholder() {
            self.password.as_str()
        } else {
            "<redacted>"
        };
        f.debug_struct("CredentialRef")
            .field("username", &self.username)
            .field("password", &password)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_repository_defaults() {
        let repo = TrackedRepository::new("User123/PythonPackage").unwrap();
        assert_eq!(repo.domain, DEFAULT_DOMAIN);
        assert_eq!(repo.basename(), "PythonPackage");
        assert_eq!(repo.owner(), "User123");
        assert_eq!(repo.package_name(), "python-package");
        assert_eq!(repo.credentials.username, "%%USERNAME%%");
        assert_eq!(repo.credentials.password, "%%PASSWORD%%");
        assert_eq!(
            repo.releases_url(),
            "https://api.github.com/repos/User123/PythonPackage/releases"
        );
    }

    #[test]
    fn test_invalid_paths() {
        for path in ["", "owner", "a/b/c", "/b", "own er/repo", "owner/"] {
            assert!(TrackedRepository::new(path).is_err(), "accepted {path:?}");
        }
        assert_eq!(TrackedRepository::new("/o/r/").unwrap().path, "o/r");
    }

    #[test]
    fn test_display_name_override() {
        let repo = TrackedRepository::new("o/PythonPackage")
            .unwrap()
            .with_display_name("Other_Name")
            .unwrap();
        assert_eq!(repo.package_name(), "other-name");
        assert!(repo.validate().is_ok());
    }

    #[test]
    fn test_display_name_rejects_path_like_names() {
        let repo = TrackedRepository::new("o/r").unwrap();
        for name in ["", "   ", "a/b c", "../../etc", "-"] {
            assert!(
                matches!(
                    repo.clone().with_display_name(name),
                    Err(CoreError::InvalidRepository { .. })
                ),
                "accepted {name:?}"
            );
        }
    }

    #[test]
    fn test_validate_stored_repository() {
        let tampered: TrackedRepository =
            serde_json::from_str(r#"{"path":"o/r","displayName":"a/b c"}"#).unwrap();
        assert!(tampered.validate().is_err());

        let empty: TrackedRepository =
            serde_json::from_str(r#"{"path":"o/r","displayName":""}"#).unwrap();
        assert!(empty.validate().is_err());

        let underscore = TrackedRepository::new("o/_").unwrap();
        assert!(underscore.validate().is_err(), "basename normalizes to '-'");

        let fine: TrackedRepository = serde_json::from_str(r#"{"path":"o/r"}"#).unwrap();
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn test_with_domain() {
        let repo = TrackedRepository::new("o/r")
            .unwrap()
            .with_domain("https://git.example.com/api/v3/")
            .unwrap();
        assert_eq!(
            repo.releases_url(),
            "https://git.example.com/api/v3/repos/o/r/releases"
        );
        assert!(TrackedRepository::new("o/r").unwrap().with_domain("ftp://x").is_err());
        assert_eq!(repo.web_url(), "https://git.example.com/o/r");
        assert_eq!(
            TrackedRepository::new("o/r").unwrap().web_url(),
            "https://github.com/o/r"
        );
    }

    #[test]
    fn test_credential_debug_redacts_literals() {
        let literal = CredentialRef::new("me", "hunter2");
        assert!(!format!("{literal:?}").contains("hunter2"));

        let placeholder = CredentialRef::default();
        assert!(format!("{placeholder:?}").contains("%%PASSWORD%%"));
    }

    #[test]
    fn test_serde_defaults() {
        let repo: TrackedRepository = serde_json::from_str(r#"{"path":"o/r"}"#).unwrap();
        assert_eq!(repo.domain, DEFAULT_DOMAIN);
        assert_eq!(repo.credentials, CredentialRef::default());

        let json = serde_json::to_string(&repo).unwrap();
        assert!(!json.contains("displayName"));
    }
}
