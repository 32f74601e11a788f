//! Shared data model for moviescout.
//!
//! Both the media API gateway and the watchlist store speak in terms of
//! [`MediaItem`]; neither depends on the other.

mod media;

pub use media::{MediaItem, MediaKey, MediaType, ParseMediaTypeError};
