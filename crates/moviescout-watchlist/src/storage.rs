//! Key-value storage port and an in-memory implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Failure reported by a [`Storage`] backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The backend is absent or cannot be opened.
    #[error("storage backend is unavailable")]
    Unavailable,
    /// The backend refused the write for lack of space.
    #[error("storage quota exceeded")]
    QuotaExceeded,
    /// The backend denied access.
    #[error("storage access denied")]
    AccessDenied,
    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// String key-value storage holding persisted snapshots.
pub trait Storage: Send + Sync + fmt::Debug {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backend rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// In-memory [`Storage`] with failure injection.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
    unavailable: bool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage whose every call fails with [`StorageError::Unavailable`].
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Seeds a value.
    #[must_use]
    pub fn with_value(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.into(), value.into());
        }
        self
    }

    /// Makes subsequent writes fail with [`StorageError::QuotaExceeded`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw stored value, bypassing failure injection.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        let values = self.values.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::QuotaExceeded);
        }
        let mut values = self.values.lock().map_err(|_| StorageError::Unavailable)?;
        values.insert(String::from(key), String::from(value));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_memory_storage_get_set() {
        // Arrange
        let storage = MemoryStorage::new();

        // Act
        storage.set("k", "[1]").unwrap();

        // Assert
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("[1]"));
        assert_eq!(storage.get("missing").unwrap(), None);
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn test_unavailable_storage_fails_everything() {
        // Arrange
        let storage = MemoryStorage::unavailable();

        // Act & Assert
        assert_eq!(storage.get("k").unwrap_err(), StorageError::Unavailable);
        assert_eq!(storage.set("k", "v").unwrap_err(), StorageError::Unavailable);
    }

    #[test]
    fn test_fail_writes_keeps_previous_value() {
        // Arrange
        let storage = MemoryStorage::new().with_value("k", "old");
        storage.set_fail_writes(true);

        // Act
        let err = storage.set("k", "new").unwrap_err();

        // Assert
        assert_eq!(err, StorageError::QuotaExceeded);
        assert_eq!(storage.raw("k").as_deref(), Some("old"));
        assert_eq!(storage.write_count(), 0);
    }
}
