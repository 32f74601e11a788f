//! Watchlist entries and derived statistics.

use chrono::{DateTime, Utc};
use moviescout_model::{MediaItem, MediaKey};
use serde::{Deserialize, Serialize};

/// A media item saved to the watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    /// The saved item.
    #[serde(flatten)]
    pub item: MediaItem,
    /// Set once at insertion.
    pub added_at: DateTime<Utc>,
    /// Whether the item has been watched.
    #[serde(default)]
    pub watched: bool,
    /// Set on the first transition to watched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<DateTime<Utc>>,
}

impl WatchlistEntry {
    /// Creates an unwatched entry.
    #[must_use]
    pub const fn new(item: MediaItem, added_at: DateTime<Utc>) -> Self {
        Self {
            item,
            added_at,
            watched: false,
            watched_at: None,
        }
    }

    /// Watchlist identity.
    #[must_use]
    pub const fn key(&self) -> MediaKey {
        self.item.key()
    }

    /// Marks the entry watched. Returns `false` if it already was, in which
    /// case `watched_at` keeps its first value.
    pub fn mark_watched(&mut self, now: DateTime<Utc>) -> bool {
        if self.watched {
            return false;
        }
        self.watched = true;
        self.watched_at = Some(now);
        true
    }
}

/// Counts derived from the current entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WatchlistStats {
    /// Number of entries.
    pub total: usize,
    /// Entries marked watched.
    pub watched: usize,
    /// Entries not yet watched.
    pub unwatched: usize,
}

impl WatchlistStats {
    /// Computes stats for a list of entries.
    #[must_use]
    pub fn from_entries(entries: &[WatchlistEntry]) -> Self {
        let total = entries.len();
        let watched = entries.iter().filter(|e| e.watched).count();
        Self {
            total,
            watched,
            unwatched: total.saturating_sub(watched),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::TimeZone;
    use moviescout_model::MediaType;

    use super::*;

    fn fight_club() -> MediaItem {
        MediaItem::new(550, MediaType::Movie, "Fight Club").release_date("1999-10-15")
    }

    #[test]
    fn test_mark_watched_keeps_first_timestamp() {
        // Arrange
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        let mut entry = WatchlistEntry::new(fight_club(), first);

        // Act
        let changed = entry.mark_watched(first);
        let changed_again = entry.mark_watched(later);

        // Assert
        assert!(changed);
        assert!(!changed_again);
        assert_eq!(entry.watched_at, Some(first));
    }

    #[test]
    fn test_entry_json_is_flat() {
        // Arrange
        let added_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let entry = WatchlistEntry::new(fight_club(), added_at);

        // Act
        let value = serde_json::to_value(&entry).unwrap();

        // Assert
        assert_eq!(value["id"], 550);
        assert_eq!(value["media_type"], "movie");
        assert_eq!(value["title"], "Fight Club");
        assert_eq!(value["watched"], false);
        assert_eq!(value["added_at"], "2024-03-01T08:30:00Z");
        assert!(value.get("watched_at").is_none());
    }

    #[test]
    fn test_entry_missing_watched_defaults_to_false() {
        // Arrange
        let json = r#"{"id":1399,"media_type":"tv","title":"Game of Thrones","added_at":"2024-01-01T00:00:00Z"}"#;

        // Act
        let entry: WatchlistEntry = serde_json::from_str(json).unwrap();

        // Assert
        assert!(!entry.watched);
        assert_eq!(entry.key(), MediaKey::tv(1399));
    }

    #[test]
    fn test_stats_from_entries() {
        // Arrange
        let now = Utc::now();
        let mut watched = WatchlistEntry::new(fight_club(), now);
        watched.mark_watched(now);
        let unwatched =
            WatchlistEntry::new(MediaItem::new(1399, MediaType::Tv, "Game of Thrones"), now);

        // Act
        let stats = WatchlistStats::from_entries(&[watched, unwatched]);
        let empty = WatchlistStats::from_entries(&[]);

        // Assert
        assert_eq!(
            stats,
            WatchlistStats {
                total: 2,
                watched: 1,
                unwatched: 1
            }
        );
        assert_eq!(empty, WatchlistStats::default());
    }
}
