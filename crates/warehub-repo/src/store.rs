//! Registry store: tracked repositories and the last merged snapshot
//!
//! Persisted as one JSON document (`warehub.json`):
//!
//! ```json
//! {
//!   "version": 1,
//!   "repositories": [{ "domain": "...", "path": "owner/name", "credentials": {...} }],
//!   "packages": { "name": { ... } }
//! }
//! ```
//!
//! Readers load the file without locking; writes always replace the whole
//! file through a rename, so a reader sees either the old or the new
//! document. Writers go through [`RegistryStore`], which holds the advisory
//! lock for as long as it lives.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use warehub_core::{Snapshot, TrackedRepository};

use crate::builder::check_unique_names;
use crate::error::{RepoError, Result};
use crate::lock::StoreLock;

/// Store file name used when none is given
pub const DEFAULT_STORE_FILE: &str = "warehub.json";

/// Current document version
pub const STORE_VERSION: u32 = 1;

fn default_version() -> u32 {
    STORE_VERSION
}

/// The persisted document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub repositories: Vec<TrackedRepository>,

    /// Last merged snapshot, keyed by package name
    #[serde(default)]
    pub packages: Snapshot,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            repositories: Vec::new(),
            packages: Snapshot::new(),
        }
    }
}

impl Registry {
    /// Load from disk; a missing file is an empty registry
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let registry: Self = serde_json::from_str(&content).map_err(|e| RepoError::InvalidStore {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        if registry.version > STORE_VERSION {
            return Err(RepoError::InvalidStore {
                path: path.display().to_string(),
                message: format!(
                    "document version {} is newer than supported version {}",
                    registry.version, STORE_VERSION
                ),
            });
        }
        for repository in &registry.repositories {
            repository.validate().map_err(|e| RepoError::InvalidStore {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(registry)
    }

    /// Find a tracked repository by `owner/name` (case-insensitive, as on GitHub)
    pub fn get(&self, path: &str) -> Option<&TrackedRepository> {
        self.repositories
            .iter()
            .find(|r| r.path.eq_ignore_ascii_case(path.trim().trim_matches('/')))
    }

    /// Write the whole document to a temporary file beside `path`, then
    /// rename it over `path`
    pub fn save_atomic(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');

        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| RepoError::Io(e.error))?;
        Ok(())
    }
}

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added,
    /// Credentials of an existing entry changed
    Updated,
    Unchanged,
}

/// Locked, writable handle on the store
#[derive(Debug)]
pub struct RegistryStore {
    path: PathBuf,
    registry: Registry,
    _lock: StoreLock,
}

impl RegistryStore {
    /// Lock the store and load it. Fails with `ConcurrentModification` when
    /// another handle holds the lock.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let lock = StoreLock::acquire(&path)?;
        let registry = Registry::load(&path)?;

        Ok(Self {
            path,
            registry,
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tracked repositories in insertion order
    pub fn list_all(&self) -> &[TrackedRepository] {
        &self.registry.repositories
    }

    pub fn get(&self, path: &str) -> Option<&TrackedRepository> {
        self.registry.get(path)
    }

    /// Last merged snapshot
    pub fn snapshot(&self) -> &Snapshot {
        &self.registry.packages
    }

    /// Add a repository, or update the credentials of an existing one
    pub fn upsert(&mut self, repository: TrackedRepository) -> Result<UpsertOutcome> {
        repository.validate()?;
        self.mutate(|registry| {
            let position = registry
                .repositories
                .iter()
                .position(|r| r.path.eq_ignore_ascii_case(&repository.path));

            let Some(idx) = position else {
                let mut candidates = registry.repositories.clone();
                candidates.push(repository.clone());
                check_unique_names(&candidates)?;

                tracing::info!(repository = %repository.path, "repository added");
                registry.repositories.push(repository);
                return Ok(UpsertOutcome::Added);
            };

            let existing = &mut registry.repositories[idx];

            if existing.domain != repository.domain || existing.display_name != repository.display_name {
                tracing::warn!(
                    repository = %existing.path,
                    "repository already tracked, only credentials are updated"
                );
            }
            if existing.credentials == repository.credentials {
                return Ok(UpsertOutcome::Unchanged);
            }
            existing.credentials = repository.credentials;
            tracing::info!(repository = %existing.path, "credentials updated");
            Ok(UpsertOutcome::Updated)
        })
    }

    /// Stop tracking a repository and drop its package
    pub fn remove(&mut self, path: &str) -> Result<TrackedRepository> {
        let path = path.trim().trim_matches('/').to_string();
        self.mutate(|registry| {
            let idx = registry
                .repositories
                .iter()
                .position(|r| r.path.eq_ignore_ascii_case(&path))
                .ok_or_else(|| RepoError::RepositoryNotFound { path: path.clone() })?;

            let removed = registry.repositories.remove(idx);
            registry.packages.retain(|_, record| record.repository != removed.path);
            tracing::info!(repository = %removed.path, "repository removed");
            Ok(removed)
        })
    }

    /// Store a freshly merged snapshot
    pub fn replace_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        self.mutate(|registry| {
            registry.packages = snapshot;
            Ok(())
        })
    }

    /// Read-modify-write: re-read the file, apply `change`, commit, and
    /// only then adopt the result in memory
    fn mutate<T>(&mut self, change: impl FnOnce(&mut Registry) -> Result<T>) -> Result<T> {
        let mut registry = Registry::load(&self.path)?;
        let outcome = change(&mut registry)?;
        registry.save_atomic(&self.path)?;
        self.registry = registry;
        Ok(outcome)
    }
}
