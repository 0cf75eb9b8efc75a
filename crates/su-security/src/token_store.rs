//! ---
//! su_section: "06-security-access-control"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Role permissions, session lifecycle and route guarding."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
//! Persisted credential token storage.
//!
//! The console keeps its token in a small key/value file that plays the part
//! of browser local storage: one TOML table, the token under [`TOKEN_KEY`],
//! any other keys left untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, warn};

/// Fixed key the token is stored under.
pub const TOKEN_KEY: &str = "token";

/// Errors raised by token storage backends.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// Reading or writing the backing file failed.
    #[error("token storage {path}: {source}")]
    Io {
        /// Backing file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The backing file is not a valid key/value table.
    #[error("token storage {path} is corrupt: {message}")]
    Corrupt {
        /// Backing file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

/// Storage backend for the persisted credential token.
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// Read the persisted token, `None` when absent.
    fn load(&self) -> Result<Option<String>, TokenStoreError>;

    /// Persist `token`, replacing any previous value.
    fn store(&self, token: &str) -> Result<(), TokenStoreError>;

    /// Delete the persisted token. Succeeds when nothing was stored.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// In-memory token storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.token.read().clone())
    }

    fn store(&self, token: &str) -> Result<(), TokenStoreError> {
        *self.token.write() = Some(token.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        self.token.write().take();
        Ok(())
    }
}

/// File-backed local storage.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Use `path` as the local storage file. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> TokenStoreError {
        TokenStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, TokenStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(self.io_error(err)),
        };
        toml::from_str(&raw).map_err(|err| TokenStoreError::Corrupt {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }

    /// Entries to rewrite; a corrupt file is replaced by an empty table.
    fn entries_for_update(&self) -> Result<BTreeMap<String, String>, TokenStoreError> {
        match self.read_entries() {
            Err(err @ TokenStoreError::Corrupt { .. }) => {
                warn!(error = %err, "discarding unreadable token storage");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let serialized = toml::to_string(entries).map_err(|err| TokenStoreError::Corrupt {
            path: self.path.clone(),
            message: err.to_string(),
        })?;
        let mut file = open_private(&self.path).map_err(|err| self.io_error(err))?;
        file.write_all(serialized.as_bytes())
            .map_err(|err| self.io_error(err))?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self
            .read_entries()?
            .remove(TOKEN_KEY)
            .filter(|token| !token.is_empty()))
    }

    fn store(&self, token: &str) -> Result<(), TokenStoreError> {
        let mut entries = self.entries_for_update()?;
        entries.insert(TOKEN_KEY.to_owned(), token.to_owned());
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), "token persisted");
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(err @ TokenStoreError::Corrupt { .. }) => {
                warn!(error = %err, "removing unreadable token storage");
                return match fs::remove_file(&self.path) {
                    Ok(()) => Ok(()),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                    Err(err) => Err(self.io_error(err)),
                };
            }
            Err(err) => return Err(err),
        };
        if entries.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), "token cleared");
        Ok(())
    }
}

/// Open `path` for writing, truncated, readable by the owner only.
///
/// The mode applies from creation; a pre-existing file is tightened too.
#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.store("abc").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.toml");
        FileTokenStore::new(&path).store("jwt-1").unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.load().unwrap().as_deref(), Some("jwt-1"));
        reopened.clear().unwrap();
        assert_eq!(FileTokenStore::new(&path).load().unwrap(), None);
    }

    #[test]
    fn file_store_keeps_foreign_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.toml");
        fs::write(&path, "theme = \"dark\"\n").unwrap();

        let store = FileTokenStore::new(&path);
        store.store("jwt-2").unwrap();
        store.clear().unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("theme"));
        assert!(!raw.contains("jwt-2"));
    }

    #[test]
    fn corrupt_file_is_replaced_on_store_and_removed_on_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.toml");
        fs::write(&path, "this is = = not toml").unwrap();
        let store = FileTokenStore::new(&path);

        store.store("jwt-4").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("jwt-4"));

        fs::write(&path, "this is = = not toml").unwrap();
        store.clear().unwrap();
        assert!(!path.exists());
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn missing_file_loads_as_empty_and_corrupt_file_errors() {
        let dir = tempdir().unwrap();
        assert_eq!(
            FileTokenStore::new(dir.path().join("absent.toml")).load().unwrap(),
            None
        );

        let corrupt = dir.path().join("corrupt.toml");
        fs::write(&corrupt, "token = [1, 2").unwrap();
        assert!(matches!(
            FileTokenStore::new(&corrupt).load(),
            Err(TokenStoreError::Corrupt { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.toml");
        FileTokenStore::new(&path).store("jwt-3").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let loose = dir.path().join("loose.toml");
        fs::write(&loose, "").unwrap();
        fs::set_permissions(&loose, fs::Permissions::from_mode(0o644)).unwrap();
        FileTokenStore::new(&loose).store("jwt-5").unwrap();
        let mode = fs::metadata(&loose).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
