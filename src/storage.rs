//! Durable key/value storage for the session snapshot.
//!
//! DESIGN
//! ======
//! Two tiers mirror browser storage: a *session* tier that should not
//! outlive the machine session and a *persistent* tier for "remember me".
//! A value lives in exactly one tier at a time; reads prefer the session
//! tier. Backends are behind the `Storage` trait so tests use
//! `MemoryStorage` and the CLI uses `FileStorage`.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("storage io failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// String key/value store. Implementations must be safe to share.
pub trait Storage: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// One JSON file per key under `dir`. Writes go through a temp file and a
/// rename so a crash never leaves a half-written snapshot behind.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io { path: self.dir.clone(), source })?;

        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        write_private(&tmp, value).map_err(|source| StorageError::Io { path: tmp.clone(), source })?;
        std::fs::rename(&tmp, &path).map_err(|source| StorageError::Io { path, source })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// Snapshots may carry a session cookie, so keep them owner-readable only.
fn write_private(path: &Path, value: &str) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

// =============================================================================
// TIERS
// =============================================================================

/// How long a stored value should survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Until the machine session ends (browser session storage).
    Session,
    /// Until explicitly cleared (browser local storage).
    Persistent,
}

impl Retention {
    #[must_use]
    pub fn from_remember(remember: bool) -> Self {
        if remember { Self::Persistent } else { Self::Session }
    }
}

pub struct TieredStorage {
    session: Box<dyn Storage>,
    persistent: Box<dyn Storage>,
}

impl TieredStorage {
    #[must_use]
    pub fn new(session: Box<dyn Storage>, persistent: Box<dyn Storage>) -> Self {
        Self { session, persistent }
    }

    /// Both tiers in memory; nothing survives the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()), Box::new(MemoryStorage::new()))
    }

    /// Both tiers on disk.
    #[must_use]
    pub fn on_disk(session_dir: impl Into<PathBuf>, persistent_dir: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(FileStorage::new(session_dir)), Box::new(FileStorage::new(persistent_dir)))
    }

    #[must_use]
    pub fn tier(&self, retention: Retention) -> &dyn Storage {
        match retention {
            Retention::Session => self.session.as_ref(),
            Retention::Persistent => self.persistent.as_ref(),
        }
    }

    /// Read `key`, session tier first. Unreadable tiers are logged and
    /// treated as empty.
    #[must_use]
    pub fn load(&self, key: &str) -> Option<String> {
        [Retention::Session, Retention::Persistent]
            .into_iter()
            .find_map(|retention| match self.tier(retention).get(key) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(?retention, key, error = %e, "storage read failed");
                    None
                }
            })
    }

    /// Write `key` into the tier for `retention` and drop it from the other.
    ///
    /// # Errors
    ///
    /// Returns the first backend failure.
    pub fn save(&self, retention: Retention, key: &str, value: &str) -> Result<(), StorageError> {
        let other = match retention {
            Retention::Session => Retention::Persistent,
            Retention::Persistent => Retention::Session,
        };
        self.tier(retention).set(key, value)?;
        self.tier(other).remove(key)
    }

    /// Remove `key` from both tiers, attempting both even if one fails.
    ///
    /// # Errors
    ///
    /// Returns the first backend failure.
    pub fn clear(&self, key: &str) -> Result<(), StorageError> {
        let session = self.session.remove(key);
        let persistent = self.persistent.remove(key);
        session.and(persistent)
    }
}
