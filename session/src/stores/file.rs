//! JSON file key-value store.
//!
//! The whole map lives in one JSON object. Every write replaces the file by
//! writing a sibling `*.next` file and renaming it over the original, so a
//! crash mid-write leaves either the old or the new map on disk.
//!
//! Every read goes back to the file, so a sign-out or sign-in made by
//! another process sharing the file is seen on the next lookup.

use crate::error::{Result, SessionError};
use crate::providers::KeyValueStore;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

type Entries = BTreeMap<String, String>;

/// Key-value store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: Arc<PathBuf>,
    /// Serializes access to the file within this process.
    lock: Arc<Mutex<()>>,
}

/// What was found on disk.
enum Contents {
    Entries(Entries),
    Corrupt(serde_json::Error),
}

fn storage_error(action: &str, path: &Path, e: impl std::fmt::Display) -> SessionError {
    SessionError::Storage(format!("{action} {}: {e}", path.display()))
}

/// Read the file. Missing or blank files hold no entries.
async fn read_contents(path: &Path) -> Result<Contents> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => {
            Ok(Contents::Entries(Entries::new()))
        }
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)
            .map_or_else(Contents::Corrupt, Contents::Entries)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Contents::Entries(Entries::new())),
        Err(e) => Err(storage_error("read", path, e)),
    }
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is an
    /// error; see [`FileStore::open_or_reset`] to start over instead.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the file exists but cannot be
    /// read or parsed, or the parent directory cannot be created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::prepare(path.into()).await?;

        match read_contents(&store.path).await? {
            Contents::Entries(entries) => {
                tracing::debug!(path = %store.path.display(), keys = entries.len(), "Opened file store");
                Ok(store)
            }
            Contents::Corrupt(e) => Err(storage_error("parse", &store.path, e)),
        }
    }

    /// Open the store at `path`, replacing a corrupt file with an empty map.
    ///
    /// A half-written or hand-edited file then reads as "nobody signed in"
    /// instead of blocking start-up.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the file cannot be read or
    /// rewritten, or the parent directory cannot be created.
    pub async fn open_or_reset(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::prepare(path.into()).await?;

        match read_contents(&store.path).await? {
            Contents::Entries(entries) => {
                tracing::debug!(path = %store.path.display(), keys = entries.len(), "Opened file store");
            }
            Contents::Corrupt(e) => {
                tracing::warn!(
                    path = %store.path.display(),
                    error = %e,
                    "Session store is corrupt, starting with an empty store"
                );
                store.flush(&Entries::new()).await?;
            }
        }

        Ok(store)
    }

    async fn prepare(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error("create", parent, e))?;
        }

        Ok(Self {
            path: Arc::new(path),
            lock: Arc::new(Mutex::new(())),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current entries on disk. A corrupt file is an error.
    async fn load(&self) -> Result<Entries> {
        match read_contents(&self.path).await? {
            Contents::Entries(entries) => Ok(entries),
            Contents::Corrupt(e) => Err(storage_error("parse", &self.path, e)),
        }
    }

    /// Write `entries` to disk, replacing the previous file.
    async fn flush(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| storage_error("serialize", &self.path, e))?;

        let mut next = self.path.as_os_str().to_owned();
        next.push(".next");
        let next = PathBuf::from(next);

        tokio::fs::write(&next, &json)
            .await
            .map_err(|e| storage_error("write", &next, e))?;
        tokio::fs::rename(&next, self.path.as_path())
            .await
            .map_err(|e| storage_error("rename", &next, e))?;

        Ok(())
    }

    /// Apply `change` to the map on disk and write it back if it changed.
    ///
    /// A corrupt file is overwritten: the change starts from an empty map.
    async fn update(&self, change: impl FnOnce(&mut Entries) -> bool) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut entries = match read_contents(&self.path).await? {
            Contents::Entries(entries) => entries,
            Contents::Corrupt(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Overwriting corrupt session store");
                Entries::new()
            }
        };

        if !change(&mut entries) {
            return Ok(());
        }

        self.flush(&entries).await
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string()).as_deref() != Some(value)
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| entries.remove(key).is_some()).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("store.json");

        let store = FileStore::open(&path).await.unwrap();
        store.set("token", "a.b.c").await.unwrap();
        store.set("role", "ADMIN").await.unwrap();
        store.remove("role").await.unwrap();
        drop(store);

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("token").await.unwrap().as_deref(), Some("a.b.c"));
        assert_eq!(reopened.get("role").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_and_blank_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();

        let missing = FileStore::open(dir.path().join("absent.json")).await.unwrap();
        assert_eq!(missing.get("token").await.unwrap(), None);

        let blank_path = dir.path().join("blank.json");
        tokio::fs::write(&blank_path, b"\n").await.unwrap();
        let blank = FileStore::open(&blank_path).await.unwrap();
        assert_eq!(blank.get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let result = FileStore::open(&path).await;
        assert!(matches!(result, Err(SessionError::Storage(_))));
    }

    #[tokio::test]
    async fn test_no_temporary_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::open(&path).await.unwrap();
        store.set("username", "alice").await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["store.json".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        tokio::fs::write(&path, b"{\"token\": \"a.b").await.unwrap();

        let store = FileStore::open_or_reset(&path).await.unwrap();

        assert_eq!(store.get("token").await.unwrap(), None);
        let on_disk: Entries = serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert!(on_disk.is_empty());
    }

    #[tokio::test]
    async fn test_reads_see_changes_from_another_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let ours = FileStore::open(&path).await.unwrap();
        ours.set("token", "a.b.c").await.unwrap();
        ours.set("role", "USER").await.unwrap();

        // Another process signs out, then someone else signs in
        let theirs = FileStore::open(&path).await.unwrap();
        theirs.remove("token").await.unwrap();
        assert_eq!(ours.get("token").await.unwrap(), None);

        theirs.set("token", "d.e.f").await.unwrap();
        assert_eq!(ours.get("token").await.unwrap().as_deref(), Some("d.e.f"));
        assert_eq!(ours.get("role").await.unwrap().as_deref(), Some("USER"));
    }

    #[tokio::test]
    async fn test_writes_keep_keys_written_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let ours = FileStore::open(&path).await.unwrap();
        let theirs = FileStore::open(&path).await.unwrap();

        theirs.set("username", "alice").await.unwrap();
        ours.set("role", "USER").await.unwrap();

        assert_eq!(theirs.get("role").await.unwrap().as_deref(), Some("USER"));
        assert_eq!(ours.get("username").await.unwrap().as_deref(), Some("alice"));
    }
}
