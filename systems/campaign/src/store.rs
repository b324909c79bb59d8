//! Key-value backends that hold persisted campaign records.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Failure raised by a [`KeyValueStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading the value stored under `key` failed.
    #[error("failed to read `{key}`")]
    Read {
        /// Key that was being read.
        key: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Writing the value stored under `key` failed.
    #[error("failed to write `{key}`")]
    Write {
        /// Key that was being written.
        key: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The record could not be encoded.
    #[error("failed to encode campaign record")]
    Encode(#[from] serde_json::Error),
}

/// Minimal string storage keyed by name.
pub trait KeyValueStore {
    /// Value stored under `key`, or `None` when nothing was saved yet.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the value stored under `key`.
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes the value stored under `key`; missing keys are not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Volatile store backed by a hash map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let _ = self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let _ = self.entries.remove(key);
        Ok(())
    }
}

/// Store that keeps one `<key>.json` file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`; the directory is created on first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the stored files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    // Bytes that are not UTF-8 come back lossily decoded, so the caller sees a
    // corrupt record rather than a read failure.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let write_error = |source| StoreError::Write {
            key: key.to_owned(),
            source,
        };
        fs::create_dir_all(&self.root).map_err(write_error)?;
        fs::write(self.path_for(key), value).map_err(write_error)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write {
                key: key.to_owned(),
                source,
            }),
        }
    }
}
