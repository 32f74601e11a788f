//! `TmdbClient` - TMDB API client implementation.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::api::LocalMediaApi;
use super::error::{ApiError, ErrorKind};
use super::image::{DEFAULT_IMAGE_BASE_URL, join_image_url};
use super::retry::RetryPolicy;
use super::types::{
    Credits, DetailsKind, MediaDetails, QueryResult, RawDetails, RawMediaResult, RawPage,
    ReviewPage, TimeWindow, TrendingMediaType, VideoList, WatchProviders,
};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the connectivity probe.
const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default response language.
const DEFAULT_LANGUAGE: &str = "en-US";

/// Credential values that are template leftovers rather than real keys.
const PLACEHOLDER_KEYS: &[&str] = &[
    "your_api_key_here",
    "your_api_key",
    "your-api-key",
    "undefined",
    "null",
    "changeme",
];

/// TMDB API error response body.
#[derive(Debug, Clone, Deserialize)]
struct TmdbErrorResponse {
    /// TMDB error code.
    status_code: u32,
    /// Error message.
    status_message: String,
}

/// TMDB API client.
///
/// Stateless between calls: no caching and no de-duplication of in-flight
/// requests, so it is safe to share and call concurrently.
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Base URL of the image CDN.
    image_base_url: String,
    /// v3 API key; validated per request.
    api_key: Option<String>,
    /// Response language.
    language: String,
    /// Per-attempt timeout.
    timeout: Duration,
    /// Retry policy for transient failures.
    retry_policy: RetryPolicy,
}

impl fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbClient")
            .field("base_url", &self.base_url.as_str())
            .field("image_base_url", &self.image_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    image_base_url: Option<String>,
    api_key: Option<String>,
    user_agent: Option<String>,
    language: Option<String>,
    timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            image_base_url: None,
            api_key: None,
            user_agent: None,
            language: None,
            timeout: None,
            retry_policy: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Overrides the image CDN base URL.
    #[must_use]
    pub fn image_base_url(mut self, url: impl Into<String>) -> Self {
        self.image_base_url = Some(url.into());
        self
    }

    /// Sets the v3 API key.
    ///
    /// Not checked here: a missing or placeholder key fails each request
    /// with [`ErrorKind::Authentication`] before anything is sent.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (default: `moviescout-api/{version}`).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the response language (default: "en-US").
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the per-attempt timeout (default: 10s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the retry policy (default: 2 retries, 2s/4s backoff).
    #[must_use]
    pub const fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Unknown`] error if the default base URL is
    /// invalid or the `reqwest::Client` fails to build.
    pub fn build(self) -> Result<TmdbClient, ApiError> {
        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            Url::parse(DEFAULT_BASE_URL).map_err(|e| {
                ApiError::new(ErrorKind::Unknown, "invalid default base URL").with_source(e)
            })?
        };

        let user_agent = self.user_agent.unwrap_or_else(|| {
            String::from(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
        });

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .map_err(|e| {
                ApiError::new(ErrorKind::Unknown, "failed to build HTTP client")
                    .with_source(e.without_url())
            })?;

        Ok(TmdbClient {
            http_client,
            base_url,
            image_base_url: self
                .image_base_url
                .unwrap_or_else(|| String::from(DEFAULT_IMAGE_BASE_URL)),
            api_key: self.api_key,
            language: self
                .language
                .unwrap_or_else(|| String::from(DEFAULT_LANGUAGE)),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            retry_policy: self.retry_policy.unwrap_or_default(),
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Builds an image URL against this client's image CDN.
    #[must_use]
    pub fn image_url(&self, path: Option<&str>, size: &str) -> Option<String> {
        join_image_url(&self.image_base_url, path, size)
    }

    /// Returns the API key if it looks usable.
    fn credential(&self) -> Result<&str, ApiError> {
        let key = self.api_key.as_deref().map(str::trim).unwrap_or_default();
        if key.is_empty()
            || PLACEHOLDER_KEYS
                .iter()
                .any(|placeholder| key.eq_ignore_ascii_case(placeholder))
        {
            return Err(ApiError::new(
                ErrorKind::Authentication,
                "TMDB API key is missing or still a placeholder",
            ));
        }
        Ok(key)
    }

    /// Sends a GET request with the API key, applying timeout and retry policy.
    #[instrument(skip_all, fields(path = %path))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let api_key = self.credential()?;

        let url = self.base_url.join(path).map_err(|e| {
            ApiError::validation(format!("failed to join URL path: {path}")).with_source(e)
        })?;

        let mut retries = 0_u32;
        loop {
            tracing::debug!(attempt = retries.saturating_add(1), "TMDB API request");

            let err = match self.attempt(&url, path, api_key, query).await {
                Ok(parsed) => return Ok(parsed),
                Err(err) => err,
            };

            if !self.retry_policy.should_retry(err.kind(), retries) {
                return Err(err);
            }

            retries = retries.saturating_add(1);
            let delay = self.retry_policy.delay_for(retries);
            tracing::warn!(
                kind = %err.kind(),
                retry = retries,
                max_retries = self.retry_policy.max_retries(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "TMDB API request failed. Retrying..."
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One request/response exchange bounded by the timeout guard.
    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &Url,
        path: &str,
        api_key: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = self
            .http_client
            .get(url.clone())
            .query(&[("api_key", api_key), ("language", self.language.as_str())])
            .query(query)
            .build()
            .map_err(|e| {
                ApiError::validation(format!("failed to build request: {path}"))
                    .with_source(e.without_url())
            })?;

        let exchange = async {
            let response = self
                .http_client
                .execute(request)
                .await
                .map_err(|e| transport_error(e, path))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| transport_error(e, path))?;
            Ok::<_, ApiError>((status, body))
        };

        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                ApiError::new(
                    ErrorKind::Timeout,
                    format!(
                        "request timed out after {}ms: {path}",
                        self.timeout.as_millis()
                    ),
                )
            })??;

        if !status.is_success() {
            return Err(status_error(status, &body, path));
        }

        serde_json::from_str(&body).map_err(|e| {
            ApiError::new(
                ErrorKind::Server,
                format!("failed to decode JSON response: {path}"),
            )
            .with_status(status.as_u16())
            .with_source(e)
        })
    }
}

/// Classifies a `reqwest` failure. The URL is stripped because it carries the key.
fn transport_error(err: reqwest::Error, path: &str) -> ApiError {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_decode() {
        ErrorKind::Server
    } else {
        ErrorKind::Network
    };
    ApiError::new(kind, format!("request failed: {path}")).with_source(err.without_url())
}

/// Builds the error for a non-success status, preferring TMDB's own message.
fn status_error(status: StatusCode, body: &str, path: &str) -> ApiError {
    let kind = ErrorKind::from_status(status);
    let message = serde_json::from_str::<TmdbErrorResponse>(body).map_or_else(
        |_| format!("TMDB API error (HTTP {status}): {path}"),
        |error_response| {
            format!(
                "TMDB API error (HTTP {status}): code={}, message={}",
                error_response.status_code, error_response.status_message,
            )
        },
    );
    ApiError::new(kind, message).with_status(status.as_u16())
}

fn ensure_id(id: u64) -> Result<(), ApiError> {
    if id == 0 {
        return Err(ApiError::validation("id must be a positive integer"));
    }
    Ok(())
}

fn ensure_page(page: u32) -> Result<(), ApiError> {
    if page == 0 {
        return Err(ApiError::validation("page must be at least 1"));
    }
    Ok(())
}

impl LocalMediaApi for TmdbClient {
    #[instrument(skip_all)]
    async fn search(&self, query: &str, page: u32) -> Result<QueryResult, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::validation("search query must not be empty"));
        }
        ensure_page(page)?;

        let params = [
            ("query", String::from(query)),
            ("page", page.to_string()),
            ("include_adult", String::from("false")),
        ];
        let raw: RawPage<RawMediaResult> = self.get_json("search/multi", &params).await?;
        Ok(QueryResult::from_raw(raw, None))
    }

    #[instrument(skip_all, fields(media_type = %media_type, window = %window))]
    async fn get_trending(
        &self,
        media_type: TrendingMediaType,
        window: TimeWindow,
        page: u32,
    ) -> Result<QueryResult, ApiError> {
        ensure_page(page)?;

        let path = format!("trending/{media_type}/{window}");
        let params = [("page", page.to_string())];
        let raw: RawPage<RawMediaResult> = self.get_json(&path, &params).await?;
        Ok(QueryResult::from_raw(raw, media_type.scoped()))
    }

    #[instrument(skip_all, fields(kind = %kind, id = id))]
    async fn get_details(&self, kind: DetailsKind, id: u64) -> Result<MediaDetails, ApiError> {
        ensure_id(id)?;

        let raw: RawDetails = self.get_json(&format!("{kind}/{id}"), &[]).await?;
        Ok(MediaDetails::from_raw(raw, kind))
    }

    #[instrument(skip_all, fields(kind = %kind, id = id))]
    async fn get_videos(&self, kind: DetailsKind, id: u64) -> Result<VideoList, ApiError> {
        ensure_id(id)?;
        self.get_json(&format!("{kind}/{id}/videos"), &[]).await
    }

    #[instrument(skip_all, fields(kind = %kind, id = id))]
    async fn get_watch_providers(
        &self,
        kind: DetailsKind,
        id: u64,
    ) -> Result<WatchProviders, ApiError> {
        ensure_id(id)?;
        self.get_json(&format!("{kind}/{id}/watch/providers"), &[])
            .await
    }

    #[instrument(skip_all, fields(kind = %kind, id = id))]
    async fn get_credits(&self, kind: DetailsKind, id: u64) -> Result<Credits, ApiError> {
        ensure_id(id)?;
        self.get_json(&format!("{kind}/{id}/credits"), &[]).await
    }

    #[instrument(skip_all, fields(kind = %kind, id = id))]
    async fn get_similar(
        &self,
        kind: DetailsKind,
        id: u64,
        page: u32,
    ) -> Result<QueryResult, ApiError> {
        ensure_id(id)?;
        ensure_page(page)?;

        let params = [("page", page.to_string())];
        let raw: RawPage<RawMediaResult> = self
            .get_json(&format!("{kind}/{id}/similar"), &params)
            .await?;
        Ok(QueryResult::from_raw(raw, Some(kind.media_type())))
    }

    #[instrument(skip_all, fields(kind = %kind, id = id))]
    async fn get_reviews(
        &self,
        kind: DetailsKind,
        id: u64,
        page: u32,
    ) -> Result<ReviewPage, ApiError> {
        ensure_id(id)?;
        ensure_page(page)?;

        let params = [("page", page.to_string())];
        self.get_json(&format!("{kind}/{id}/reviews"), &params)
            .await
    }

    #[instrument(skip_all)]
    async fn check_connectivity(&self) -> bool {
        let probe = self.http_client.head(self.base_url.clone()).send();
        match tokio::time::timeout(CONNECTIVITY_TIMEOUT, probe).await {
            Ok(Ok(response)) => {
                tracing::debug!(status = %response.status(), "TMDB API reachable");
                true
            }
            Ok(Err(err)) => {
                tracing::debug!(error = %err.without_url(), "TMDB API unreachable");
                false
            }
            Err(_) => {
                tracing::debug!("TMDB API connectivity probe timed out");
                false
            }
        }
    }
}
