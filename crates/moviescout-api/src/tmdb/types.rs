//! TMDB request enums, raw payloads and the normalized response shapes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use moviescout_model::{MediaItem, MediaType};
use serde::{Deserialize, Serialize};

use super::error::ApiError;

// --- Request enums ---

/// Media type filter for `trending/{media_type}/{time_window}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendingMediaType {
    /// Movies, TV and people mixed.
    All,
    /// Movies only.
    #[default]
    Movie,
    /// TV series only.
    Tv,
    /// People only.
    Person,
}

impl TrendingMediaType {
    /// Path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Person => "person",
        }
    }

    /// Media type every result shares, if the endpoint is scoped to one.
    pub(crate) const fn scoped(self) -> Option<MediaType> {
        match self {
            Self::All => None,
            Self::Movie => Some(MediaType::Movie),
            Self::Tv => Some(MediaType::Tv),
            Self::Person => Some(MediaType::Person),
        }
    }
}

impl fmt::Display for TrendingMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendingMediaType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "movie" => Ok(Self::Movie),
            "tv" => Ok(Self::Tv),
            "person" => Ok(Self::Person),
            _ => Err(ApiError::validation(format!(
                "invalid trending media type {s:?} (expected all, movie, tv or person)"
            ))),
        }
    }
}

/// Time window for trending lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    /// Last 24 hours.
    Day,
    /// Last 7 days.
    #[default]
    Week,
}

impl TimeWindow {
    /// Path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            _ => Err(ApiError::validation(format!(
                "invalid time window {s:?} (expected day or week)"
            ))),
        }
    }
}

/// Media kinds that have detail pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsKind {
    /// `movie/{id}`.
    Movie,
    /// `tv/{id}`.
    Tv,
}

impl DetailsKind {
    /// Path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    /// Corresponding media type.
    #[must_use]
    pub const fn media_type(self) -> MediaType {
        match self {
            Self::Movie => MediaType::Movie,
            Self::Tv => MediaType::Tv,
        }
    }
}

impl fmt::Display for DetailsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailsKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "tv" => Ok(Self::Tv),
            _ => Err(ApiError::validation(format!(
                "invalid media kind {s:?} (expected movie or tv)"
            ))),
        }
    }
}

// --- Raw list payloads ---

/// Paginated list response as TMDB sends it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPage<T> {
    pub page: Option<u32>,
    pub results: Option<Vec<T>>,
    pub total_pages: Option<u32>,
    pub total_results: Option<u32>,
}

/// One entry of a search, trending or similar-titles list.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawMediaResult {
    pub id: u64,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
}

impl RawMediaResult {
    /// Folds movie/TV naming differences into a [`MediaItem`].
    ///
    /// `scoped` is the media type implied by the endpoint, if any. Otherwise
    /// the payload's `media_type` wins, and when that is missing too the
    /// presence of `first_air_date` marks a TV series.
    pub(crate) fn into_item(self, scoped: Option<MediaType>) -> MediaItem {
        let media_type = scoped
            .or_else(|| self.media_type.as_deref().and_then(|t| t.parse().ok()))
            .unwrap_or(if self.first_air_date.is_some() {
                MediaType::Tv
            } else {
                MediaType::Movie
            });

        let title = self
            .title
            .filter(|t| !t.is_empty())
            .or(self.name)
            .unwrap_or_default();

        MediaItem {
            id: self.id,
            media_type,
            title,
            poster_path: self.poster_path.or(self.profile_path),
            overview: self.overview.filter(|o| !o.is_empty()),
            vote_average: self.vote_average,
            release_date: self.release_date.filter(|d| !d.is_empty()),
            first_air_date: self.first_air_date.filter(|d| !d.is_empty()),
        }
    }
}

// --- Normalized list envelope ---

/// Paginated envelope returned by list-producing operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Normalized results for this page.
    pub results: Vec<MediaItem>,
    /// Current page (>= 1).
    pub page: u32,
    /// Total number of pages (>= 1).
    pub total_pages: u32,
    /// Total number of results across all pages.
    pub total_results: u32,
}

impl QueryResult {
    /// Empty first page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            results: Vec::new(),
            page: 1,
            total_pages: 1,
            total_results: 0,
        }
    }

    /// Normalizes a raw page.
    pub(crate) fn from_raw(raw: RawPage<RawMediaResult>, scoped: Option<MediaType>) -> Self {
        let results: Vec<MediaItem> = raw
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.into_item(scoped))
            .collect();
        let listed = u32::try_from(results.len()).unwrap_or(u32::MAX);
        Self {
            page: raw.page.unwrap_or(1).max(1),
            total_pages: raw.total_pages.unwrap_or(1).max(1),
            total_results: raw.total_results.unwrap_or(listed).max(listed),
            results,
        }
    }

    /// Whether this page has no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Whether a following page exists.
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether a preceding page exists.
    #[must_use]
    pub const fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    /// Keeps only results of the given media type (client-side filter).
    pub fn retain_media_type(&mut self, media_type: MediaType) {
        self.results.retain(|item| item.media_type == media_type);
    }
}

// --- Details ---

/// Genre entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    /// Genre ID.
    pub id: u32,
    /// Genre name.
    pub name: String,
}

/// Raw `movie/{id}` or `tv/{id}` payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawDetails {
    #[serde(flatten)]
    pub base: RawMediaResult,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
}

/// A [`MediaItem`] plus the fields only detail pages carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaDetails {
    /// Normalized common fields.
    #[serde(flatten)]
    pub item: MediaItem,
    /// Genres.
    pub genres: Vec<Genre>,
    /// Runtime in minutes (movies) or typical episode runtime (TV).
    pub runtime: Option<u32>,
    /// Tagline.
    pub tagline: Option<String>,
    /// Production status (e.g. "Released", "Returning Series").
    pub status: Option<String>,
    /// IMDb id (movies only).
    pub imdb_id: Option<String>,
    /// Official homepage.
    pub homepage: Option<String>,
    /// Number of seasons (TV only).
    pub number_of_seasons: Option<u32>,
    /// Number of episodes (TV only).
    pub number_of_episodes: Option<u32>,
}

impl MediaDetails {
    pub(crate) fn from_raw(raw: RawDetails, kind: DetailsKind) -> Self {
        Self {
            item: raw.base.into_item(Some(kind.media_type())),
            genres: raw.genres,
            runtime: raw.runtime.or_else(|| raw.episode_run_time.first().copied()),
            tagline: raw.tagline.filter(|t| !t.is_empty()),
            status: raw.status,
            imdb_id: raw.imdb_id.filter(|i| !i.is_empty()),
            homepage: raw.homepage.filter(|h| !h.is_empty()),
            number_of_seasons: raw.number_of_seasons,
            number_of_episodes: raw.number_of_episodes,
        }
    }
}

// --- Videos ---

/// Response from `{kind}/{id}/videos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoList {
    /// Title id.
    pub id: u64,
    /// Videos.
    #[serde(default)]
    pub results: Vec<Video>,
}

/// A trailer, teaser or clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Video id.
    pub id: String,
    /// Site-specific key (e.g. the `YouTube` video id).
    pub key: String,
    /// Video title.
    pub name: String,
    /// Hosting site (e.g. "YouTube").
    pub site: String,
    /// Video type (e.g. "Trailer", "Teaser").
    #[serde(rename = "type")]
    pub video_type: String,
    /// Whether the video is an official upload.
    #[serde(default)]
    pub official: bool,
}

impl VideoList {
    /// First official `YouTube` trailer, falling back to any trailer.
    #[must_use]
    pub fn trailer(&self) -> Option<&Video> {
        let trailers = || self.results.iter().filter(|v| v.video_type == "Trailer");
        trailers()
            .find(|v| v.official && v.site == "YouTube")
            .or_else(|| trailers().next())
    }
}

// --- Watch providers ---

/// Response from `{kind}/{id}/watch/providers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchProviders {
    /// Title id.
    pub id: u64,
    /// Availability keyed by ISO 3166-1 region code.
    #[serde(default)]
    pub results: BTreeMap<String, WatchProviderRegion>,
}

/// Availability in one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchProviderRegion {
    /// TMDB/JustWatch landing page.
    #[serde(default)]
    pub link: Option<String>,
    /// Subscription streaming.
    #[serde(default)]
    pub flatrate: Vec<WatchProvider>,
    /// Digital rental.
    #[serde(default)]
    pub rent: Vec<WatchProvider>,
    /// Digital purchase.
    #[serde(default)]
    pub buy: Vec<WatchProvider>,
}

/// A streaming or retail provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchProvider {
    /// Provider id.
    pub provider_id: u64,
    /// Provider name.
    pub provider_name: String,
    /// Logo image path.
    #[serde(default)]
    pub logo_path: Option<String>,
}

impl WatchProviders {
    /// Availability for a region code (case-insensitive).
    #[must_use]
    pub fn region(&self, code: &str) -> Option<&WatchProviderRegion> {
        self.results.get(&code.to_ascii_uppercase())
    }
}

// --- Credits ---

/// Response from `{kind}/{id}/credits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credits {
    /// Title id.
    pub id: u64,
    /// Cast in billing order.
    #[serde(default)]
    pub cast: Vec<CastMember>,
    /// Crew.
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

/// A cast member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    /// Person id.
    pub id: u64,
    /// Person name.
    pub name: String,
    /// Character played.
    #[serde(default)]
    pub character: Option<String>,
    /// Profile image path.
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// A crew member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewMember {
    /// Person id.
    pub id: u64,
    /// Person name.
    pub name: String,
    /// Job title (e.g. "Director").
    #[serde(default)]
    pub job: Option<String>,
    /// Department.
    #[serde(default)]
    pub department: Option<String>,
}

impl Credits {
    /// Crew members credited as director.
    pub fn directors(&self) -> impl Iterator<Item = &CrewMember> {
        self.crew
            .iter()
            .filter(|member| member.job.as_deref() == Some("Director"))
    }
}

// --- Reviews ---

/// One page of `{kind}/{id}/reviews`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPage {
    /// Current page.
    #[serde(default = "first_page")]
    pub page: u32,
    /// Reviews on this page.
    #[serde(default)]
    pub results: Vec<Review>,
    /// Total number of pages.
    #[serde(default = "first_page")]
    pub total_pages: u32,
    /// Total number of reviews.
    #[serde(default)]
    pub total_results: u32,
}

/// A user review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Review id.
    pub id: String,
    /// Author display name.
    pub author: String,
    /// Review body.
    pub content: String,
    /// Review URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created_at: Option<String>,
}

const fn first_page() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;
    use crate::tmdb::ErrorKind;

    #[test]
    fn test_parse_search_multi_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/search_multi_inception.json");

        // Act
        let raw: RawPage<RawMediaResult> = serde_json::from_str(json).unwrap();
        let result = QueryResult::from_raw(raw, None);

        // Assert
        assert_eq!(result.page, 1);
        assert_eq!(result.total_results, 3);
        assert_eq!(result.results[0].id, 27_205);
        assert_eq!(result.results[0].media_type, MediaType::Movie);
        assert_eq!(result.results[0].title, "Inception");
        assert_eq!(result.results[1].media_type, MediaType::Tv);
        assert_eq!(result.results[1].title, "Inception: The Cobol Job");
        assert_eq!(result.results[2].media_type, MediaType::Person);
    }

    #[test]
    fn test_media_type_inferred_from_first_air_date() {
        // Arrange
        let raw: RawMediaResult = serde_json::from_str(
            r#"{"id":1399,"name":"Game of Thrones","first_air_date":"2011-04-17"}"#,
        )
        .unwrap();

        // Act
        let item = raw.into_item(None);

        // Assert
        assert_eq!(item.media_type, MediaType::Tv);
        assert_eq!(item.title, "Game of Thrones");
        assert_eq!(item.first_air_date.as_deref(), Some("2011-04-17"));
    }

    #[test]
    fn test_media_type_defaults_to_movie() {
        // Arrange
        let raw: RawMediaResult =
            serde_json::from_str(r#"{"id":550,"title":"Fight Club"}"#).unwrap();

        // Act
        let item = raw.into_item(None);

        // Assert
        assert_eq!(item.media_type, MediaType::Movie);
    }

    #[test]
    fn test_scoped_media_type_wins() {
        // Arrange
        let raw: RawMediaResult =
            serde_json::from_str(r#"{"id":1,"name":"x","media_type":"movie"}"#).unwrap();

        // Act
        let item = raw.into_item(Some(MediaType::Tv));

        // Assert
        assert_eq!(item.media_type, MediaType::Tv);
    }

    #[test]
    fn test_missing_results_is_empty_page() {
        // Arrange
        let raw: RawPage<RawMediaResult> = serde_json::from_str("{}").unwrap();

        // Act
        let result = QueryResult::from_raw(raw, None);

        // Assert
        assert_eq!(result, QueryResult::empty());
        assert!(!result.has_next_page());
        assert!(!result.has_previous_page());
    }

    #[test]
    fn test_retain_media_type() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/search_multi_inception.json");
        let raw: RawPage<RawMediaResult> = serde_json::from_str(json).unwrap();
        let mut result = QueryResult::from_raw(raw, None);

        // Act
        result.retain_media_type(MediaType::Tv);

        // Assert
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].id, 64_956);
    }

    #[test]
    fn test_parse_movie_details_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/movie_details_27205.json");

        // Act
        let raw: RawDetails = serde_json::from_str(json).unwrap();
        let details = MediaDetails::from_raw(raw, DetailsKind::Movie);

        // Assert
        assert_eq!(details.item.id, 27_205);
        assert_eq!(details.item.media_type, MediaType::Movie);
        assert_eq!(details.item.title, "Inception");
        assert_eq!(details.runtime, Some(148));
        assert_eq!(details.imdb_id.as_deref(), Some("tt1375666"));
        assert_eq!(details.genres.len(), 3);
        assert_eq!(details.number_of_seasons, None);
    }

    #[test]
    fn test_parse_tv_details_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/tv_details_1399.json");

        // Act
        let raw: RawDetails = serde_json::from_str(json).unwrap();
        let details = MediaDetails::from_raw(raw, DetailsKind::Tv);

        // Assert
        assert_eq!(details.item.media_type, MediaType::Tv);
        assert_eq!(details.item.title, "Game of Thrones");
        assert_eq!(details.runtime, Some(60));
        assert_eq!(details.number_of_seasons, Some(8));
        assert_eq!(details.number_of_episodes, Some(73));
    }

    #[test]
    fn test_parse_videos_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/movie_videos_27205.json");

        // Act
        let videos: VideoList = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(videos.results.len(), 2);
        assert_eq!(videos.trailer().unwrap().key, "YoHD9XEInc0");
    }

    #[test]
    fn test_parse_watch_providers_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/movie_watch_providers_27205.json");

        // Act
        let providers: WatchProviders = serde_json::from_str(json).unwrap();

        // Assert
        let us = providers.region("us").unwrap();
        assert_eq!(us.flatrate[0].provider_name, "Netflix");
        assert_eq!(us.rent.len(), 1);
        assert!(providers.region("JP").is_none());
    }

    #[test]
    fn test_credits_directors() {
        // Arrange
        let json = r#"{"id":27205,"cast":[{"id":6193,"name":"Leonardo DiCaprio","character":"Cobb"}],
            "crew":[{"id":525,"name":"Christopher Nolan","job":"Director","department":"Directing"},
                    {"id":947,"name":"Hans Zimmer","job":"Original Music Composer","department":"Sound"}]}"#;

        // Act
        let credits: Credits = serde_json::from_str(json).unwrap();

        // Assert
        let directors: Vec<&str> = credits.directors().map(|c| c.name.as_str()).collect();
        assert_eq!(directors, vec!["Christopher Nolan"]);
        assert_eq!(credits.cast[0].character.as_deref(), Some("Cobb"));
    }

    #[test]
    fn test_request_enum_parsing() {
        // Arrange & Act & Assert
        assert_eq!("week".parse::<TimeWindow>().unwrap(), TimeWindow::Week);
        assert_eq!("ALL".parse::<TrendingMediaType>().unwrap(), TrendingMediaType::All);
        assert_eq!("tv".parse::<DetailsKind>().unwrap(), DetailsKind::Tv);
        assert_eq!(
            "month".parse::<TimeWindow>().unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            "anime".parse::<TrendingMediaType>().unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            "person".parse::<DetailsKind>().unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_trending_scope() {
        // Arrange & Act & Assert
        assert_eq!(TrendingMediaType::All.scoped(), None);
        assert_eq!(TrendingMediaType::Tv.scoped(), Some(MediaType::Tv));
    }
}
