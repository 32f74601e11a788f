//! Opening the watchlist database.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::migrations::run_migrations;

/// How long a write waits for another process holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) the database file at `path` and brings its schema up
/// to date. Missing parent directories are created.
///
/// Two `moviescout` processes may share one file; a writer waits up to
/// [`BUSY_TIMEOUT`] for the other to finish.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or migrations fail.
pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open watchlist database {}", path.display()))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("failed to set database busy timeout")?;

    run_migrations(&conn)
        .with_context(|| format!("failed to migrate {}", path.display()))?;
    tracing::debug!(path = %path.display(), "watchlist database ready");

    Ok(conn)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_open_creates_nested_directories() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("moviescout").join("watchlist.db");

        // Act
        let conn = open_db(&path).unwrap();

        // Assert
        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
        assert!(path.exists());
    }

    #[test]
    fn test_reopen_keeps_schema_version() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moviescout.db");
        drop(open_db(&path).unwrap());

        // Act
        let conn = open_db(&path).unwrap();

        // Assert
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'kv_store'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        // Act
        let result = open_db(&blocker.join("moviescout.db"));

        // Assert
        assert!(result.is_err());
    }
}
