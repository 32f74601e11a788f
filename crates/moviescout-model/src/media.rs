//! Media items as returned by search, trending and detail queries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of media a TMDB record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Feature film.
    Movie,
    /// Television series.
    Tv,
    /// Cast or crew member.
    Person,
}

impl MediaType {
    /// Returns the lowercase name used in TMDB paths and payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Person => "person",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`MediaType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown media type: {0:?}")]
pub struct ParseMediaTypeError(pub String);

impl FromStr for MediaType {
    type Err = ParseMediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "tv" => Ok(Self::Tv),
            "person" => Ok(Self::Person),
            _ => Err(ParseMediaTypeError(String::from(s))),
        }
    }
}

/// Identity of a media record: TMDB ids are only unique within a media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MediaKey {
    /// Media type the id belongs to.
    pub media_type: MediaType,
    /// TMDB id.
    pub id: u64,
}

impl MediaKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(media_type: MediaType, id: u64) -> Self {
        Self { media_type, id }
    }

    /// Key for a movie id.
    #[must_use]
    pub const fn movie(id: u64) -> Self {
        Self::new(MediaType::Movie, id)
    }

    /// Key for a TV series id.
    #[must_use]
    pub const fn tv(id: u64) -> Self {
        Self::new(MediaType::Tv, id)
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type, self.id)
    }
}

/// A normalized search, trending or detail result.
///
/// Movies carry `title`/`release_date` upstream and TV series carry
/// `name`/`first_air_date`; both are folded into `title` here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// TMDB id, unique within `media_type`.
    pub id: u64,
    /// Media type.
    pub media_type: MediaType,
    /// Display name.
    pub title: String,
    /// Poster image path (relative to the image CDN).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    /// Overview text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Vote average (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    /// Movie release date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// TV first air date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
}

impl MediaItem {
    /// Creates an item with only the required fields set.
    pub fn new(id: u64, media_type: MediaType, title: impl Into<String>) -> Self {
        Self {
            id,
            media_type,
            title: title.into(),
            poster_path: None,
            overview: None,
            vote_average: None,
            release_date: None,
            first_air_date: None,
        }
    }

    /// Sets the poster path.
    #[must_use]
    pub fn poster_path(mut self, path: impl Into<String>) -> Self {
        self.poster_path = Some(path.into());
        self
    }

    /// Sets the overview.
    #[must_use]
    pub fn overview(mut self, overview: impl Into<String>) -> Self {
        self.overview = Some(overview.into());
        self
    }

    /// Sets the vote average.
    #[must_use]
    pub const fn vote_average(mut self, vote: f64) -> Self {
        self.vote_average = Some(vote);
        self
    }

    /// Sets the release date.
    #[must_use]
    pub fn release_date(mut self, date: impl Into<String>) -> Self {
        self.release_date = Some(date.into());
        self
    }

    /// Sets the first air date.
    #[must_use]
    pub fn first_air_date(mut self, date: impl Into<String>) -> Self {
        self.first_air_date = Some(date.into());
        self
    }

    /// Watchlist identity of this item.
    #[must_use]
    pub const fn key(&self) -> MediaKey {
        MediaKey::new(self.media_type, self.id)
    }

    /// Year of the release or first air date, if one is known.
    #[must_use]
    pub fn display_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .and_then(|date| date.get(..4))
            .filter(|year| year.bytes().all(|b| b.is_ascii_digit()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_media_type_from_str() {
        // Arrange & Act & Assert
        assert_eq!("movie".parse::<MediaType>().unwrap(), MediaType::Movie);
        assert_eq!(" TV ".parse::<MediaType>().unwrap(), MediaType::Tv);
        assert_eq!("person".parse::<MediaType>().unwrap(), MediaType::Person);
        assert_eq!(
            "anime".parse::<MediaType>().unwrap_err(),
            ParseMediaTypeError(String::from("anime"))
        );
    }

    #[test]
    fn test_media_key_display() {
        // Arrange
        let key = MediaKey::movie(550);

        // Act & Assert
        assert_eq!(key.to_string(), "movie/550");
        assert_ne!(key, MediaKey::tv(550));
    }

    #[test]
    fn test_display_year_prefers_release_date() {
        // Arrange
        let movie = MediaItem::new(550, MediaType::Movie, "Fight Club").release_date("1999-10-15");
        let show = MediaItem::new(1399, MediaType::Tv, "Game of Thrones").first_air_date("2011-04-17");
        let undated = MediaItem::new(1, MediaType::Movie, "Untitled").release_date("");

        // Act & Assert
        assert_eq!(movie.display_year(), Some("1999"));
        assert_eq!(show.display_year(), Some("2011"));
        assert_eq!(undated.display_year(), None);
    }

    #[test]
    fn test_optional_fields_are_skipped_when_absent() {
        // Arrange
        let item = MediaItem::new(550, MediaType::Movie, "Fight Club");

        // Act
        let json = serde_json::to_value(&item).unwrap();

        // Assert
        assert_eq!(
            json,
            serde_json::json!({"id": 550, "media_type": "movie", "title": "Fight Club"})
        );
    }
}
