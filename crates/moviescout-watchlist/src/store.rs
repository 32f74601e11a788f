//! `WatchlistStore` - the authoritative watchlist and its persistence.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use moviescout_model::{MediaItem, MediaKey, MediaType};
use serde_json::Value;
use tokio::sync::{broadcast, watch};

use crate::entry::{WatchlistEntry, WatchlistStats};
use crate::storage::{Storage, StorageError};
use crate::writer::{SnapshotWriter, WriteReport};

/// Storage key holding the serialized watchlist.
pub const DEFAULT_STORAGE_KEY: &str = "movieScoutWatchlist";

/// Title given to untyped items that carry neither `title` nor `name`.
const UNKNOWN_TITLE: &str = "Unknown";

/// Buffered events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 64;

/// Store lifecycle: `Uninitialized -> Loading -> Ready`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPhase {
    /// `load` has not been called.
    #[default]
    Uninitialized,
    /// Reading persisted data; mutations are rejected.
    Loading,
    /// Accepting mutations.
    Ready,
}

/// Non-fatal store error, readable through [`WatchlistStore::error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Persisted data could not be read or was corrupt; the list started empty.
    #[error("failed to load watchlist: {0}")]
    Load(String),
    /// The latest snapshot could not be written; changes live in memory only.
    #[error("failed to persist watchlist: {0}")]
    Persist(StorageError),
}

/// Snapshot published to subscribers after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchlistState {
    /// Entries in insertion order.
    pub entries: Vec<WatchlistEntry>,
    /// Lifecycle phase.
    pub phase: LoadPhase,
    /// Current non-fatal error.
    pub error: Option<StoreError>,
}

impl WatchlistState {
    /// Derived counts.
    #[must_use]
    pub fn stats(&self) -> WatchlistStats {
        WatchlistStats::from_entries(&self.entries)
    }

    /// Whether the initial load has not completed yet.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase != LoadPhase::Ready
    }
}

/// Outcome signal of a store operation, for user notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchlistEvent {
    /// An entry was appended.
    Added {
        /// Entry key.
        key: MediaKey,
        /// Entry title.
        title: String,
    },
    /// `add` found an entry with the same key.
    AlreadyPresent {
        /// Entry key.
        key: MediaKey,
        /// Title of the existing entry.
        title: String,
    },
    /// The item to add was rejected.
    Invalid {
        /// Why it was rejected.
        reason: String,
    },
    /// No entry matches the key.
    NotFound {
        /// Requested key.
        key: MediaKey,
    },
    /// An entry was removed.
    Removed {
        /// Entry key.
        key: MediaKey,
        /// Entry title.
        title: String,
    },
    /// An entry was marked watched.
    MarkedWatched {
        /// Entry key.
        key: MediaKey,
        /// Entry title.
        title: String,
    },
    /// The list was emptied.
    Cleared {
        /// Number of entries removed.
        removed: usize,
    },
    /// A mutation arrived before the store was ready.
    NotReady,
    /// Persisting failed; emitted once until a write succeeds again.
    PersistFailed {
        /// Backend failure.
        error: StorageError,
    },
}

type MutationResult = Result<WatchlistEvent, WatchlistEvent>;

/// In-memory watchlist mirrored to a [`Storage`] backend.
///
/// Mutations apply synchronously under the state lock and hand a full
/// snapshot to a background writer, so they never block on storage and never
/// fail because of it. Observers read through [`subscribe`](Self::subscribe)
/// and [`events`](Self::events).
#[derive(Debug)]
pub struct WatchlistStore {
    state: Arc<watch::Sender<WatchlistState>>,
    events: broadcast::Sender<WatchlistEvent>,
    storage: Arc<dyn Storage>,
    key: String,
    revision: AtomicU64,
    writer: SnapshotWriter,
}

impl WatchlistStore {
    /// Creates a store persisting under [`DEFAULT_STORAGE_KEY`].
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    /// Creates a store persisting under `key`.
    pub fn with_key(storage: impl Storage + 'static, key: impl Into<String>) -> Self {
        let storage: Arc<dyn Storage> = Arc::new(storage);
        let key = key.into();
        let state = Arc::new(watch::Sender::new(WatchlistState::default()));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let report = persist_reporter(Arc::clone(&state), events.clone());
        let writer = SnapshotWriter::spawn(Arc::clone(&storage), key.clone(), report);

        Self {
            state,
            events,
            storage,
            key,
            revision: AtomicU64::new(0),
            writer,
        }
    }

    /// Reads persisted data and moves the store to [`LoadPhase::Ready`].
    ///
    /// Storage or parse failures leave an empty list and a
    /// [`StoreError::Load`]. Calling it again after the first time does nothing.
    pub fn load(&self) {
        let started = self.state.send_if_modified(|state| {
            if state.phase != LoadPhase::Uninitialized {
                return false;
            }
            state.phase = LoadPhase::Loading;
            true
        });
        if !started {
            tracing::debug!("watchlist already loaded");
            return;
        }

        let loaded = self.read_persisted();
        self.state.send_modify(|state| {
            match loaded {
                Ok(entries) => {
                    tracing::info!(count = entries.len(), key = %self.key, "watchlist loaded");
                    state.entries = entries;
                }
                Err(error) => {
                    tracing::warn!(%error, "starting with an empty watchlist");
                    state.entries = Vec::new();
                    state.error = Some(error);
                }
            }
            state.phase = LoadPhase::Ready;
        });
    }

    fn read_persisted(&self) -> Result<Vec<WatchlistEntry>, StoreError> {
        let raw = self
            .storage
            .get(&self.key)
            .map_err(|e| StoreError::Load(format!("storage read failed: {e}")))?;
        let Some(raw) = raw else {
            return Ok(Vec::new());
        };

        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Load(format!("persisted watchlist is not JSON: {e}")))?;
        if !value.is_array() {
            return Err(StoreError::Load(String::from(
                "persisted watchlist is not a list",
            )));
        }
        let entries: Vec<WatchlistEntry> = serde_json::from_value(value).map_err(|e| {
            StoreError::Load(format!("persisted watchlist has malformed entries: {e}"))
        })?;

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(entries.len());
        for entry in entries {
            let key = entry.key();
            if seen.insert(key) {
                unique.push(entry);
            } else {
                tracing::warn!(%key, "dropping duplicate persisted watchlist entry");
            }
        }
        Ok(unique)
    }

    /// Appends `item` unless an entry with the same key exists.
    pub fn add(&self, item: &MediaItem) -> bool {
        self.apply(|entries| insert(entries, item.clone()))
    }

    /// Untyped [`add`](Self::add): rejects null, non-object and id-less values.
    ///
    /// Any other object is accepted. A missing `media_type` is inferred from
    /// `first_air_date`, and `name` stands in for a missing `title`, falling
    /// back to `"Unknown"`.
    pub fn add_json(&self, value: &Value) -> bool {
        let parsed = item_from_json(value);
        self.apply(|entries| {
            let item = parsed.map_err(|reason| WatchlistEvent::Invalid { reason })?;
            insert(entries, item)
        })
    }

    /// Removes the entry for `key`.
    pub fn remove(&self, key: MediaKey) -> bool {
        self.apply(|entries| {
            let position = entries
                .iter()
                .position(|e| e.key() == key)
                .ok_or(WatchlistEvent::NotFound { key })?;
            let removed = entries.remove(position);
            Ok(WatchlistEvent::Removed {
                key,
                title: removed.item.title,
            })
        })
    }

    /// Marks the entry for `key` watched. An already-watched entry keeps its
    /// `watched_at` and the call still succeeds.
    pub fn mark_watched(&self, key: MediaKey) -> bool {
        self.apply(|entries| {
            let entry = entries
                .iter_mut()
                .find(|e| e.key() == key)
                .ok_or(WatchlistEvent::NotFound { key })?;
            entry.mark_watched(Utc::now());
            Ok(WatchlistEvent::MarkedWatched {
                key,
                title: entry.item.title.clone(),
            })
        })
    }

    /// Empties the list.
    pub fn clear(&self) -> bool {
        self.apply(|entries| {
            let removed = entries.len();
            entries.clear();
            Ok(WatchlistEvent::Cleared { removed })
        })
    }

    /// Waits until every change made so far has reached the writer's storage
    /// call.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<WatchlistEntry> {
        self.state.borrow().entries.clone()
    }

    /// Entry for `key`.
    #[must_use]
    pub fn get(&self, key: MediaKey) -> Option<WatchlistEntry> {
        self.state
            .borrow()
            .entries
            .iter()
            .find(|e| e.key() == key)
            .cloned()
    }

    /// Whether an entry for `key` exists.
    #[must_use]
    pub fn contains(&self, key: MediaKey) -> bool {
        self.state.borrow().entries.iter().any(|e| e.key() == key)
    }

    /// Derived counts.
    #[must_use]
    pub fn stats(&self) -> WatchlistStats {
        self.state.borrow().stats()
    }

    /// Lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        self.state.borrow().phase
    }

    /// Whether the initial load has not completed yet.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Current non-fatal error.
    #[must_use]
    pub fn error(&self) -> Option<StoreError> {
        self.state.borrow().error.clone()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn snapshot(&self) -> WatchlistState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WatchlistState> {
        self.state.subscribe()
    }

    /// Receiver of operation outcome events.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<WatchlistEvent> {
        self.events.subscribe()
    }

    /// Runs `mutation` under the state lock and queues a snapshot on success.
    fn apply<F>(&self, mutation: F) -> bool
    where
        F: FnOnce(&mut Vec<WatchlistEntry>) -> MutationResult,
    {
        let mut outcome: MutationResult = Err(WatchlistEvent::NotReady);
        let mut enqueue_failure = None;

        self.state.send_if_modified(|state| {
            if state.phase != LoadPhase::Ready {
                return false;
            }
            outcome = mutation(&mut state.entries);
            if outcome.is_err() {
                return false;
            }
            if let Err(error) = self.enqueue_snapshot(&state.entries) {
                if !matches!(state.error, Some(StoreError::Persist(_))) {
                    enqueue_failure = Some(error.clone());
                }
                state.error = Some(StoreError::Persist(error));
            }
            true
        });

        if let Some(error) = enqueue_failure {
            tracing::warn!(%error, "watchlist snapshot not queued; keeping changes in memory");
            let _ = self.events.send(WatchlistEvent::PersistFailed { error });
        }

        match outcome {
            Ok(event) => {
                tracing::debug!(?event, "watchlist updated");
                let _ = self.events.send(event);
                true
            }
            Err(WatchlistEvent::NotReady) => {
                tracing::warn!("watchlist is not ready; mutation rejected");
                let _ = self.events.send(WatchlistEvent::NotReady);
                false
            }
            Err(event) => {
                tracing::debug!(?event, "watchlist mutation rejected");
                let _ = self.events.send(event);
                false
            }
        }
    }

    fn enqueue_snapshot(&self, entries: &[WatchlistEntry]) -> Result<(), StorageError> {
        let payload =
            serde_json::to_string(entries).map_err(|e| StorageError::Backend(e.to_string()))?;
        let revision = self.revision.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if self.writer.submit(revision, payload) {
            Ok(())
        } else {
            Err(StorageError::Unavailable)
        }
    }
}

/// Reports writer outcomes back into the shared state.
///
/// A successful write clears any error, a pending `Load` included, since the
/// stored list now matches memory. A failed write records `Persist`.
fn persist_reporter(
    state: Arc<watch::Sender<WatchlistState>>,
    events: broadcast::Sender<WatchlistEvent>,
) -> WriteReport {
    Box::new(move |revision, result| match result {
        Ok(()) => {
            tracing::debug!(revision, "watchlist snapshot persisted");
            state.send_if_modified(|s| s.error.take().is_some());
        }
        Err(error) => {
            tracing::warn!(revision, %error, "failed to persist watchlist; keeping changes in memory");
            let mut first_failure = false;
            state.send_modify(|s| {
                first_failure = !matches!(s.error, Some(StoreError::Persist(_)));
                s.error = Some(StoreError::Persist(error.clone()));
            });
            if first_failure {
                let _ = events.send(WatchlistEvent::PersistFailed { error });
            }
        }
    })
}

fn insert(entries: &mut Vec<WatchlistEntry>, item: MediaItem) -> MutationResult {
    if item.id == 0 {
        return Err(WatchlistEvent::Invalid {
            reason: String::from("item has no id"),
        });
    }

    let key = item.key();
    if let Some(existing) = entries.iter().find(|e| e.key() == key) {
        return Err(WatchlistEvent::AlreadyPresent {
            key,
            title: existing.item.title.clone(),
        });
    }

    let title = item.title.clone();
    entries.push(WatchlistEntry::new(item, Utc::now()));
    Ok(WatchlistEvent::Added { key, title })
}

fn item_from_json(value: &Value) -> Result<MediaItem, String> {
    let object = match value {
        Value::Null => return Err(String::from("item is null")),
        Value::Object(object) => object,
        _ => return Err(String::from("item is not an object")),
    };
    let id = match object.get("id") {
        None | Some(Value::Null) => return Err(String::from("item has no id")),
        Some(id) => id
            .as_u64()
            .or_else(|| id.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| format!("item id {id} is not a TMDB id"))?,
    };

    // Null, blank and wrongly typed fields count as absent.
    let text = |field: &str| {
        object
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_owned)
    };
    let first_air_date = text("first_air_date");
    let media_type = text("media_type")
        .and_then(|t| t.parse::<MediaType>().ok())
        .unwrap_or(if first_air_date.is_some() {
            MediaType::Tv
        } else {
            MediaType::Movie
        });
    let title = text("title")
        .or_else(|| text("name"))
        .unwrap_or_else(|| String::from(UNKNOWN_TITLE));

    let mut item = MediaItem::new(id, media_type, title);
    item.poster_path = text("poster_path");
    item.overview = text("overview");
    item.vote_average = object.get("vote_average").and_then(Value::as_f64);
    item.release_date = text("release_date");
    item.first_air_date = first_air_date;
    Ok(item)
}
