//! `SqliteStorage` - the watchlist [`Storage`] port over the `kv_store` table.

use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use chrono::Utc;
use moviescout_watchlist::{Storage, StorageError};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};

use super::connection::open_db;

/// Key-value storage in a single `SQLite` table.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Wraps an already migrated connection.
    #[must_use]
    pub const fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens the database file at `path` (see [`open_db`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(open_db(path)?))
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Unavailable)?;
        conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(storage_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Unavailable)?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )
        .map_err(storage_error)?;
        tracing::trace!(key, bytes = value.len(), "kv_store updated");
        Ok(())
    }
}

/// Maps `SQLite` failures onto the storage port's categories.
fn storage_error(err: rusqlite::Error) -> StorageError {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
        match failure.code {
            ErrorCode::DiskFull => return StorageError::QuotaExceeded,
            ErrorCode::ReadOnly
            | ErrorCode::PermissionDenied
            | ErrorCode::AuthorizationForStatementDenied => return StorageError::AccessDenied,
            ErrorCode::CannotOpen | ErrorCode::NotADatabase => return StorageError::Unavailable,
            _ => {}
        }
    }
    StorageError::Backend(err.to_string())
}
