//! `MediaApi` trait definition.
#![allow(clippy::future_not_send)]

use super::error::ApiError;
use super::types::{
    Credits, DetailsKind, MediaDetails, QueryResult, ReviewPage, TimeWindow, TrendingMediaType,
    VideoList, WatchProviders,
};

/// Media API gateway trait.
///
/// Abstracts the gateway operations so front-ends can substitute fakes.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
/// Every failure is an [`ApiError`] carrying an
/// [`ErrorKind`](super::ErrorKind); validation failures are raised before any
/// network I/O.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(MediaApi: Send)]
pub trait LocalMediaApi {
    /// Searches movies, TV series and people (`search/multi`).
    ///
    /// # Errors
    ///
    /// `Validation` if `query` is blank or `page` is 0; otherwise any
    /// classified request failure.
    async fn search(&self, query: &str, page: u32) -> Result<QueryResult, ApiError>;

    /// Fetches a trending list.
    ///
    /// # Errors
    ///
    /// `Validation` if `page` is 0; otherwise any classified request failure.
    async fn get_trending(
        &self,
        media_type: TrendingMediaType,
        window: TimeWindow,
        page: u32,
    ) -> Result<QueryResult, ApiError>;

    /// Fetches movie or TV details.
    ///
    /// # Errors
    ///
    /// `Validation` if `id` is 0; otherwise any classified request failure.
    async fn get_details(&self, kind: DetailsKind, id: u64) -> Result<MediaDetails, ApiError>;

    /// Fetches trailers and clips.
    ///
    /// # Errors
    ///
    /// `Validation` if `id` is 0; otherwise any classified request failure.
    async fn get_videos(&self, kind: DetailsKind, id: u64) -> Result<VideoList, ApiError>;

    /// Fetches streaming/rental availability per region.
    ///
    /// # Errors
    ///
    /// `Validation` if `id` is 0; otherwise any classified request failure.
    async fn get_watch_providers(
        &self,
        kind: DetailsKind,
        id: u64,
    ) -> Result<WatchProviders, ApiError>;

    /// Fetches cast and crew.
    ///
    /// # Errors
    ///
    /// `Validation` if `id` is 0; otherwise any classified request failure.
    async fn get_credits(&self, kind: DetailsKind, id: u64) -> Result<Credits, ApiError>;

    /// Fetches titles similar to the given one.
    ///
    /// # Errors
    ///
    /// `Validation` if `id` or `page` is 0; otherwise any classified request failure.
    async fn get_similar(
        &self,
        kind: DetailsKind,
        id: u64,
        page: u32,
    ) -> Result<QueryResult, ApiError>;

    /// Fetches user reviews.
    ///
    /// # Errors
    ///
    /// `Validation` if `id` or `page` is 0; otherwise any classified request failure.
    async fn get_reviews(
        &self,
        kind: DetailsKind,
        id: u64,
        page: u32,
    ) -> Result<ReviewPage, ApiError>;

    /// Probes whether the upstream service is reachable. Never fails.
    async fn check_connectivity(&self) -> bool;
}
