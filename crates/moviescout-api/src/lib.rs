//! Media API gateway for moviescout.
//!
//! Wraps the TMDB v3 API: builds requests, bounds them with a timeout,
//! retries transient failures and classifies every failure into an
//! [`ErrorKind`](tmdb::ErrorKind).

/// TMDB API client.
pub mod tmdb;
