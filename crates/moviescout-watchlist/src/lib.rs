//! Watchlist store: an in-memory list mirrored to a key-value storage port.

mod entry;
mod storage;
mod store;
mod writer;

pub use entry::{WatchlistEntry, WatchlistStats};
pub use storage::{MemoryStorage, Storage, StorageError};
pub use store::{
    DEFAULT_STORAGE_KEY, LoadPhase, StoreError, WatchlistEvent, WatchlistState, WatchlistStore,
};
