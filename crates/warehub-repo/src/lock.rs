//! Advisory write lock for the registry store
//!
//! The lock lives beside the store (`warehub.json.lock`) and is held for the
//! lifetime of a [`StoreLock`]. The lock file itself is left in place when
//! released.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{RepoError, Result};

/// Exclusive, non-blocking lock on a store path
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Take the lock for `store_path`, failing immediately if another
    /// handle holds it
    pub fn acquire(store_path: &Path) -> Result<Self> {
        let path = lock_path(store_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        if FileExt::try_lock_exclusive(&file).is_err() {
            return Err(RepoError::ConcurrentModification {
                path: store_path.display().to_string(),
            });
        }

        // Owner pid, for whoever finds the lock file
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;

        tracing::debug!(lock = %path.display(), "acquired store lock");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// `<store>.lock`
pub fn lock_path(store_path: &Path) -> PathBuf {
    let mut name = store_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path() {
        assert_eq!(
            lock_path(Path::new("/srv/index/warehub.json")),
            PathBuf::from("/srv/index/warehub.json.lock")
        );
    }

    #[test]
    fn test_second_writer_rejected() {
        let dir = TempDir::new().unwrap();
        let store = dir.path().join("warehub.json");

        let first = StoreLock::acquire(&store).unwrap();
        assert!(first.path().exists());
        assert!(matches!(
            StoreLock::acquire(&store),
            Err(RepoError::ConcurrentModification { .. })
        ));

        drop(first);
        assert!(StoreLock::acquire(&store).is_ok());
    }
}
