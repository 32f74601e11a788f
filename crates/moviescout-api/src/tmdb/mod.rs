//! TMDB API client module.
//!
//! Handles HTTP requests to the TMDB API v3 endpoints used by the
//! discovery front-end: multi search, trending, details, videos,
//! watch providers, credits, similar titles and reviews.

mod api;
mod client;
mod error;
mod image;
mod retry;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalMediaApi, MediaApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
pub use error::{ApiError, ErrorKind};
pub use image::{DEFAULT_IMAGE_BASE_URL, build_image_url};
pub use retry::RetryPolicy;
pub use types::{
    CastMember, Credits, CrewMember, DetailsKind, Genre, MediaDetails, QueryResult, Review,
    ReviewPage, TimeWindow, TrendingMediaType, Video, VideoList, WatchProvider,
    WatchProviderRegion, WatchProviders,
};
