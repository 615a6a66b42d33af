//! Key-value backends for running the repository outside a browser.

use pilot_engine::{KeyValueStore, PilotProfile, ProfileObserver};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// In-process store used by the scenarios.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    /// Overwrite a key directly, bypassing the repository.
    pub fn seed(&self, key: &str, value: impl Into<String>) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.peek(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.seed(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl KeyValueStore for FileStore {
    type Error = FileStoreError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FileStoreError::Read { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir)
            .and_then(|()| fs::write(&path, value))
            .map_err(|source| FileStoreError::Write { path, source })
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Err(err) if err.kind() != ErrorKind::NotFound => {
                Err(FileStoreError::Write { path, source: err })
            }
            _ => Ok(()),
        }
    }
}

/// Counts change notifications so scenarios can assert on broadcasts.
#[derive(Debug, Default)]
pub struct CountingObserver {
    notifications: Cell<usize>,
}

impl CountingObserver {
    #[must_use]
    pub fn count(&self) -> usize {
        self.notifications.get()
    }
}

impl ProfileObserver for CountingObserver {
    fn profile_changed(&self, profile: Option<&PilotProfile>) {
        self.notifications.set(self.notifications.get() + 1);
        log::debug!(
            "profile update broadcast ({})",
            profile.map_or("cleared", |p| p.callsign.as_str())
        );
    }
}
