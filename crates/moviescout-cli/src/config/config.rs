//! `AppConfig` struct and TOML loading.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// TMDB client settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
    /// Watchlist settings.
    #[serde(default)]
    pub watchlist: WatchlistConfig,
}

/// TMDB client configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TmdbConfig {
    /// v3 API key. `TMDB_API_KEY` takes precedence.
    pub api_key: Option<String>,
    /// Response language.
    pub language: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Poster size token used when printing image URLs.
    pub image_size: String,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            language: String::from("en-US"),
            timeout_secs: 10,
            max_retries: 2,
            image_size: String::from("w500"),
        }
    }
}

impl TmdbConfig {
    /// Per-request timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Effective API key: a non-blank `env_key` wins over the file value.
    pub fn api_key(&self, env_key: Option<String>) -> Option<String> {
        env_key
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.api_key.clone())
    }
}

/// Watchlist configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatchlistConfig {
    /// Key the serialized list is stored under.
    pub storage_key: String,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            storage_key: String::from(moviescout_watchlist::DEFAULT_STORAGE_KEY),
        }
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_default_config() {
        // Arrange & Act
        let config = AppConfig::default();

        // Assert
        assert_eq!(config.tmdb.api_key, None);
        assert_eq!(config.tmdb.language, "en-US");
        assert_eq!(config.tmdb.timeout(), Duration::from_secs(10));
        assert_eq!(config.tmdb.max_retries, 2);
        assert_eq!(config.watchlist.storage_key, "movieScoutWatchlist");
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        // Arrange
        let config = AppConfig {
            tmdb: TmdbConfig {
                api_key: Some(String::from("abc123")),
                language: String::from("ja-JP"),
                timeout_secs: 5,
                max_retries: 0,
                image_size: String::from("w185"),
            },
            watchlist: WatchlistConfig {
                storage_key: String::from("custom"),
            },
        };

        // Act
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        // Assert
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_partial_config() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tmdb]\nlanguage = \"fr-FR\"\n").unwrap();

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config.tmdb.language, "fr-FR");
        assert_eq!(config.tmdb.timeout_secs, 10);
        assert_eq!(config.watchlist, WatchlistConfig::default());
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tmdb\n").unwrap();

        // Act
        let result = AppConfig::load(&path);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_env_key_overrides_file_key() {
        // Arrange
        let tmdb = TmdbConfig {
            api_key: Some(String::from("from-file")),
            ..TmdbConfig::default()
        };

        // Act & Assert
        assert_eq!(
            tmdb.api_key(Some(String::from("from-env"))).as_deref(),
            Some("from-env")
        );
        assert_eq!(
            tmdb.api_key(Some(String::from("  "))).as_deref(),
            Some("from-file")
        );
        assert_eq!(tmdb.api_key(None).as_deref(), Some("from-file"));
    }
}
