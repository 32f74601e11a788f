//! Poster and backdrop URL construction.

/// Default base URL of the TMDB image CDN.
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/";

/// Builds a full image URL from a TMDB image path and a size token (`w500`, `original`, ...).
///
/// Returns `None` when `path` is absent or blank; never performs I/O.
#[must_use]
pub fn build_image_url(path: Option<&str>, size: &str) -> Option<String> {
    join_image_url(DEFAULT_IMAGE_BASE_URL, path, size)
}

/// Same as [`build_image_url`] against an arbitrary CDN base.
pub(crate) fn join_image_url(base: &str, path: Option<&str>, size: &str) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    let base = base.trim_end_matches('/');
    let size = size.trim_matches('/');
    let path = path.trim_start_matches('/');
    Some(format!("{base}/{size}/{path}"))
}
