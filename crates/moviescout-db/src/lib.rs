//! Database module for persisting the watchlist.
//!
//! Uses `rusqlite` (bundled `SQLite`) as a key-value backend for the
//! watchlist store.

mod connection;
/// Key-value storage backed by `SQLite`.
pub mod kv;
mod migrations;

#[allow(clippy::module_name_repetitions)]
pub use connection::open_db;
pub use kv::SqliteStorage;
