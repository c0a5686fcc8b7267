//! Index presentation settings (`config.json`)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};

/// Homepage description used when the config leaves it unset
pub const DEFAULT_DESCRIPTION: &str = "Welcome to your private Python package index!";

/// Homepage image used when the config leaves it unset
pub const DEFAULT_IMAGE_URL: &str = "https://pypi.org/static/images/logo-small.95de8436.svg";

/// Global presentation settings, loaded once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Site title
    pub title: String,

    /// Public base URL the site is served from
    pub url: String,

    /// Homepage blurb
    #[serde(default = "default_description")]
    pub description: String,

    /// Homepage logo
    #[serde(default = "default_image_url")]
    pub image_url: String,
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

fn default_image_url() -> String {
    DEFAULT_IMAGE_URL.to_string()
}

impl IndexConfig {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: default_description(),
            image_url: default_image_url(),
        }
    }

    /// Load from a JSON file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::InvalidConfig {
                message: format!("config file not found: {}", path.display()),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| CoreError::InvalidConfig {
            message: e.to_string(),
        })?;

        if config.title.trim().is_empty() {
            return Err(CoreError::InvalidConfig {
                message: "config does not specify a title".to_string(),
            });
        }
        if config.url.trim().is_empty() {
            return Err(CoreError::InvalidConfig {
                message: "config does not specify a url".to_string(),
            });
        }

        Ok(config)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// URL pip should be pointed at
    pub fn simple_url(&self) -> String {
        format!("{}/simple/", self.base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config =
            IndexConfig::from_json(r#"{"title":"My PyPI Repository","url":"User123.github.io/MyRepo"}"#)
                .unwrap();
        assert_eq!(config.title, "My PyPI Repository");
        assert_eq!(config.url, "User123.github.io/MyRepo");
        assert_eq!(config.description, DEFAULT_DESCRIPTION);
        assert_eq!(config.image_url, DEFAULT_IMAGE_URL);
    }

    #[test]
    fn test_explicit_values_kept() {
        let config = IndexConfig::from_json(
            r#"{"title":"T","url":"https://x.io/","description":"D","image_url":"https://x.io/i.svg"}"#,
        )
        .unwrap();
        assert_eq!(config.description, "D");
        assert_eq!(config.image_url, "https://x.io/i.svg");
        assert_eq!(config.base_url(), "https://x.io");
        assert_eq!(config.simple_url(), "https://x.io/simple/");
    }

    #[test]
    fn test_required_keys() {
        let err = IndexConfig::from_json(r#"{"url":"x"}"#).unwrap_err();
        assert!(err.to_string().contains("title"));

        let err = IndexConfig::from_json(r#"{"title":"x"}"#).unwrap_err();
        assert!(err.to_string().contains("url"));

        assert!(IndexConfig::from_json(r#"{"title":" ","url":"x"}"#).is_err());
        assert!(IndexConfig::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"title":"T","url":"u"}"#).unwrap();
        assert_eq!(IndexConfig::load_from(&path).unwrap().title, "T");

        let missing = dir.path().join("nope.json");
        assert!(matches!(
            IndexConfig::load_from(&missing),
            Err(CoreError::InvalidConfig { .. })
        ));
    }
}
