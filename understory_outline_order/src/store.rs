// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Durable key-value storage for persisted records.

use alloc::collections::BTreeMap;
use alloc::string::String;

use crate::error::StoreError;

/// A simple string key-value store.
///
/// Values are opaque strings (the ledger writes JSON). Reads never fail: an
/// unreadable entry is reported as absent, which callers treat the same as
/// "nothing stored yet".
pub trait KeyValueStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes the value stored under `key`. Removing an absent key succeeds.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// In-memory store, useful for tests and for hosts without durable storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    /// Create an empty, writable store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that rejects every write with [`StoreError::ReadOnly`].
    pub fn read_only() -> Self {
        Self {
            entries: BTreeMap::new(),
            read_only: true,
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.entries.insert(key.into(), value.into());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(feature = "std")]
pub use file::FileStore;

#[cfg(feature = "std")]
mod file {
    use alloc::format;
    use alloc::string::String;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use super::KeyValueStore;
    use crate::error::StoreError;

    /// Directory-backed store: each key lives in `<dir>/<key>.json`.
    ///
    /// Keys are used verbatim as file stems and must not contain path separators.
    /// Writes go to a temporary sibling file that is then renamed over the
    /// target, so a crash mid-write leaves the previous value intact.
    #[derive(Clone, Debug)]
    pub struct FileStore {
        dir: PathBuf,
    }

    impl FileStore {
        /// Create a store rooted at `dir`. The directory is created on first write.
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into() }
        }

        /// The directory holding the stored files.
        pub fn dir(&self) -> &Path {
            &self.dir
        }

        fn path_for(&self, key: &str) -> PathBuf {
            self.dir.join(format!("{key}.json"))
        }
    }

    impl KeyValueStore for FileStore {
        fn get(&self, key: &str) -> Option<String> {
            let path = self.path_for(key);
            match std::fs::read_to_string(&path) {
                Ok(value) => Some(value),
                Err(err) => {
                    if err.kind() != ErrorKind::NotFound {
                        tracing::warn!(error = %err, path = %path.display(), "failed to read stored record");
                    }
                    None
                }
            }
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            std::fs::create_dir_all(&self.dir)?;
            let path = self.path_for(key);
            let tmp = self.dir.join(format!("{key}.json.tmp"));
            std::fs::write(&tmp, value)?;
            std::fs::rename(&tmp, &path)?;
            tracing::trace!(path = %path.display(), bytes = value.len(), "stored record");
            Ok(())
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            match std::fs::remove_file(self.path_for(key)) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err.into()),
            }
        }
    }
}
