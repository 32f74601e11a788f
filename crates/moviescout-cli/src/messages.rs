//! User-facing wording for gateway failures and watchlist outcomes.

use moviescout_api::tmdb::ErrorKind;
use moviescout_watchlist::{StorageError, StoreError, WatchlistEvent};

/// Message shown to the user for a failed TMDB request.
pub const fn user_facing(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Network => "Unable to reach TMDB. Check your internet connection and try again.",
        ErrorKind::Timeout => "TMDB took too long to respond. Please try again.",
        ErrorKind::Authentication => {
            "Service configuration issue: the TMDB API key is missing or invalid. Set TMDB_API_KEY or tmdb.api_key in config.toml."
        }
        ErrorKind::RateLimit => "Too many requests to TMDB. Try again shortly.",
        ErrorKind::NotFound => "The requested title could not be found.",
        ErrorKind::Server => "TMDB is having trouble right now. Please try again later.",
        ErrorKind::Validation => "Invalid request. Check the search term, id or page number.",
        ErrorKind::Unknown => "Something went wrong while talking to TMDB.",
    }
}

/// Message for a watchlist event.
pub fn describe_event(event: &WatchlistEvent) -> String {
    match event {
        WatchlistEvent::Added { title, .. } => format!("\"{title}\" added to your watchlist"),
        WatchlistEvent::AlreadyPresent { title, .. } => {
            format!("\"{title}\" is already in your watchlist")
        }
        WatchlistEvent::Invalid { reason } => format!("Cannot add this item: {reason}"),
        WatchlistEvent::NotFound { key } => format!("{key} is not in your watchlist"),
        WatchlistEvent::Removed { title, .. } => {
            format!("\"{title}\" removed from your watchlist")
        }
        WatchlistEvent::MarkedWatched { title, .. } => format!("\"{title}\" marked as watched"),
        WatchlistEvent::Cleared { removed } => format!("Watchlist cleared ({removed} removed)"),
        WatchlistEvent::NotReady => String::from("Watchlist is still loading. Try again."),
        WatchlistEvent::PersistFailed { error } => {
            format!("{} Changes are kept for this session only.", storage_hint(error))
        }
    }
}

/// Whether an event should be reported as a warning.
pub const fn is_problem(event: &WatchlistEvent) -> bool {
    matches!(
        event,
        WatchlistEvent::Invalid { .. }
            | WatchlistEvent::NotFound { .. }
            | WatchlistEvent::NotReady
            | WatchlistEvent::PersistFailed { .. }
    )
}

/// Message for a non-fatal store error.
pub fn describe_store_error(error: &StoreError) -> String {
    match error {
        StoreError::Load(_) => String::from(
            "Saved watchlist could not be read and was reset. New changes will be saved.",
        ),
        StoreError::Persist(storage) => {
            format!("{} Changes are kept for this session only.", storage_hint(storage))
        }
    }
}

const fn storage_hint(error: &StorageError) -> &'static str {
    match error {
        StorageError::Unavailable => "Watchlist storage is unavailable.",
        StorageError::QuotaExceeded => "Watchlist storage is full.",
        StorageError::AccessDenied => "Watchlist storage is read-only.",
        StorageError::Backend(_) => "Watchlist could not be saved.",
    }
}

#[cfg(test)]
mod tests {
    use moviescout_model::MediaKey;

    use super::*;

    #[test]
    fn test_every_kind_has_a_message() {
        // Arrange
        let kinds = [
            ErrorKind::Network,
            ErrorKind::Timeout,
            ErrorKind::Authentication,
            ErrorKind::RateLimit,
            ErrorKind::NotFound,
            ErrorKind::Server,
            ErrorKind::Validation,
            ErrorKind::Unknown,
        ];

        // Act & Assert
        for kind in kinds {
            assert!(!user_facing(kind).is_empty(), "{kind}");
        }
        assert!(user_facing(ErrorKind::RateLimit).contains("shortly"));
        assert!(user_facing(ErrorKind::Authentication).contains("configuration"));
    }

    #[test]
    fn test_describe_events() {
        // Arrange
        let added = WatchlistEvent::Added {
            key: MediaKey::movie(550),
            title: String::from("Fight Club"),
        };
        let missing = WatchlistEvent::NotFound {
            key: MediaKey::tv(1399),
        };

        // Act & Assert
        assert_eq!(describe_event(&added), "\"Fight Club\" added to your watchlist");
        assert_eq!(describe_event(&missing), "tv/1399 is not in your watchlist");
        assert!(!is_problem(&added));
        assert!(is_problem(&missing));
    }

    #[test]
    fn test_persist_failure_wording() {
        // Arrange
        let event = WatchlistEvent::PersistFailed {
            error: StorageError::QuotaExceeded,
        };

        // Act
        let message = describe_event(&event);

        // Assert
        assert!(message.starts_with("Watchlist storage is full."));
        assert_eq!(
            message,
            describe_store_error(&StoreError::Persist(StorageError::QuotaExceeded))
        );
    }
}
