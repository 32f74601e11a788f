//! Failure taxonomy for gateway operations.

use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;

/// Closed set of failure categories attached to every [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport failure (DNS, connection refused, reset).
    Network,
    /// The local timeout guard aborted the request.
    Timeout,
    /// Missing or rejected credential.
    Authentication,
    /// Upstream rate limit (HTTP 429).
    RateLimit,
    /// Upstream reported the resource missing (HTTP 404).
    NotFound,
    /// Upstream 5xx or an unparseable response body.
    Server,
    /// Invalid input, rejected locally or by upstream 4xx.
    Validation,
    /// Any other non-success outcome.
    Unknown,
}

impl ErrorKind {
    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "NETWORK",
            Self::Timeout => "TIMEOUT",
            Self::Authentication => "AUTHENTICATION",
            Self::RateLimit => "RATE_LIMIT",
            Self::NotFound => "NOT_FOUND",
            Self::Server => "SERVER",
            Self::Validation => "VALIDATION",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether the gateway retries failures of this kind.
    ///
    /// Rate limiting is never retried here.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Server)
    }

    /// Classifies a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Authentication,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimit,
            s if s.is_server_error() => Self::Server,
            s if s.is_client_error() => Self::Validation,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A classified gateway failure.
///
/// Immutable once built; callers match on [`ApiError::kind`].
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    http_status: Option<u16>,
    #[source]
    source: Option<BoxError>,
    timestamp: DateTime<Utc>,
}

impl ApiError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
            source: None,
            timestamp: Utc::now(),
        }
    }

    /// Shorthand for a [`ErrorKind::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Attaches the HTTP status that produced this error.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable detail (not meant for end users).
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status, when the failure came from an upstream response.
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// When the error was raised.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Whether the gateway would retry this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_from_status_mapping() {
        // Arrange
        let cases = [
            (StatusCode::UNAUTHORIZED, ErrorKind::Authentication),
            (StatusCode::NOT_FOUND, ErrorKind::NotFound),
            (StatusCode::TOO_MANY_REQUESTS, ErrorKind::RateLimit),
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Server),
            (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::Server),
            (StatusCode::BAD_REQUEST, ErrorKind::Validation),
            (StatusCode::FORBIDDEN, ErrorKind::Validation),
            (StatusCode::UNPROCESSABLE_ENTITY, ErrorKind::Validation),
            (StatusCode::NOT_MODIFIED, ErrorKind::Unknown),
            (StatusCode::SWITCHING_PROTOCOLS, ErrorKind::Unknown),
        ];

        // Act & Assert
        for (status, expected) in cases {
            assert_eq!(ErrorKind::from_status(status), expected, "status {status}");
        }
    }

    #[test]
    fn test_retryable_kinds() {
        // Arrange & Act & Assert
        assert!(ErrorKind::Network.is_retryable());
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(ErrorKind::Server.is_retryable());
        assert!(!ErrorKind::Authentication.is_retryable());
        assert!(!ErrorKind::RateLimit.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
        assert!(!ErrorKind::Unknown.is_retryable());
    }

    #[test]
    fn test_error_display_and_fields() {
        // Arrange
        let io = std::io::Error::other("connection reset");

        // Act
        let err = ApiError::new(ErrorKind::Server, "HTTP 502 from movie/27205")
            .with_status(502)
            .with_source(io);

        // Assert
        assert_eq!(err.to_string(), "SERVER: HTTP 502 from movie/27205");
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.http_status(), Some(502));
        assert!(err.source().is_some());
        assert!(err.timestamp() <= Utc::now());
    }

    #[test]
    fn test_validation_shorthand() {
        // Arrange & Act
        let err = ApiError::validation("query must not be empty");

        // Assert
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.http_status(), None);
        assert!(!err.is_retryable());
    }
}
