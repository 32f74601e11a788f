//! Application configuration module.
//!
//! Manages the TOML config file holding the TMDB credential, request
//! tuning and the watchlist storage key, and resolves where that file and
//! the watchlist database live.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::AppConfig;
pub use paths::AppDirs;
