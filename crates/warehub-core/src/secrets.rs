//! Secret placeholder resolution
//!
//! Repository credentials may be written as `%%KEY%%` placeholders instead of
//! literal values. At run time each placeholder is looked up in the secrets
//! map, which is loaded once from the `SECRETS` environment variable (a JSON
//! object of string to string, keys are case sensitive).
//!
//! ```
//! use warehub_core::{SecretsMap, resolve};
//!
//! let secrets = SecretsMap::from_json(r#"{"TOKEN": "hunter2"}"#).unwrap();
//! assert_eq!(resolve("%%TOKEN%%", &secrets).unwrap(), "hunter2");
//! assert_eq!(resolve("plain", &secrets).unwrap(), "plain");
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::error::{CoreError, Result};

/// Environment variable holding the secrets JSON object
pub const SECRETS_ENV: &str = "SECRETS";

const TOKEN: &str = "%%";

/// A configuration value, classified as literal text or a secret reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretValue<'a> {
    /// Used as-is
    Literal(&'a str),
    /// `%%KEY%%` - the key to look up
    Placeholder(&'a str),
}

impl<'a> SecretValue<'a> {
    /// Classify a value. Only an exact `%%KEY%%` match (KEY made of word
    /// characters) is a placeholder.
    pub fn parse(value: &'a str) -> Self {
        match value
            .strip_prefix(TOKEN)
            .and_then(|rest| rest.strip_suffix(TOKEN))
        {
            Some(key) if is_secret_key(key) => SecretValue::Placeholder(key),
            _ => SecretValue::Literal(value),
        }
    }

    /// Whether this value refers to a secret
    pub fn is_placeholder(&self) -> bool {
        matches!(self, SecretValue::Placeholder(_))
    }
}

fn is_secret_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Format a key as a placeholder (`USERNAME` -> `%%USERNAME%%`)
pub fn placeholder(key: &str) -> String {
    format!("{TOKEN}{key}{TOKEN}")
}

/// Source of secret values
pub trait SecretLookup {
    fn lookup(&self, key: &str) -> Option<&str>;
}

impl SecretLookup for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Resolve a possibly placeholder-encoded value
pub fn resolve<L: SecretLookup + ?Sized>(value: &str, secrets: &L) -> Result<String> {
    match SecretValue::parse(value) {
        SecretValue::Literal(literal) => Ok(literal.to_string()),
        SecretValue::Placeholder(key) => secrets
            .lookup(key)
            .map(str::to_string)
            .ok_or_else(|| CoreError::MissingSecret {
                key: key.to_string(),
            }),
    }
}

/// Process-wide secrets, loaded once per run
#[derive(Clone, Default)]
pub struct SecretsMap {
    values: HashMap<String, String>,
}

impl SecretsMap {
    /// Load from the `SECRETS` environment variable. An unset variable is an
    /// empty map.
    pub fn from_env() -> Result<Self> {
        match std::env::var(SECRETS_ENV) {
            Ok(json) => Self::from_json(&json),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(CoreError::InvalidSecrets {
                message: e.to_string(),
            }),
        }
    }

    /// Parse a JSON object of string to string
    pub fn from_json(json: &str) -> Result<Self> {
        let values: HashMap<String, String> =
            serde_json::from_str(json).map_err(|e| CoreError::InvalidSecrets {
                message: e.to_string(),
            })?;
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl From<HashMap<String, String>> for SecretsMap {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl SecretLookup for SecretsMap {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

// Values stay out of Debug output
impl fmt::Debug for SecretsMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("SecretsMap").field("keys", &keys).finish()
    }
}
