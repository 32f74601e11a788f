//! Where moviescout keeps its config file and watchlist database.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Directory name under the platform config and data directories.
const APP_DIR: &str = "moviescout";

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Watchlist database file name.
const DATABASE_FILE_NAME: &str = "moviescout.db";

/// Resolved config and data directories.
///
/// `--dir` puts both files in one directory. Without it, the platform
/// directories from [`dirs`] are used (`~/.config/moviescout` and
/// `~/.local/share/moviescout` on Linux, honoring `XDG_CONFIG_HOME` and
/// `XDG_DATA_HOME`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppDirs {
    /// Resolves the directories from `--dir` or the platform defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if no override is given and the platform config or
    /// data directory cannot be determined.
    pub fn resolve(dir: Option<&Path>) -> Result<Self> {
        Self::from_bases(dir, dirs::config_dir(), dirs::data_dir())
    }

    fn from_bases(
        dir: Option<&Path>,
        config_base: Option<PathBuf>,
        data_base: Option<PathBuf>,
    ) -> Result<Self> {
        if let Some(dir) = dir {
            return Ok(Self {
                config_dir: dir.to_path_buf(),
                data_dir: dir.to_path_buf(),
            });
        }

        let config_base =
            config_base.context("could not determine the config directory; pass --dir")?;
        let data_base = data_base.context("could not determine the data directory; pass --dir")?;
        Ok(Self {
            config_dir: config_base.join(APP_DIR),
            data_dir: data_base.join(APP_DIR),
        })
    }

    /// Path of `config.toml`.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Path of the watchlist database.
    pub fn database_file(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }
}
