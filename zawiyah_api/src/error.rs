//! Error types for the adapter layer.

use serde::{Deserialize, Serialize};

/// Errors raised inside an adapter while serving a request.
///
/// Adapters never return these to their callers directly: every failure is
/// folded into a failed [`ApiResponse`](crate::types::ApiResponse) whose
/// `error` field carries the display text and whose `error_kind` carries
/// [`AdapterError::kind`].
#[derive(thiserror::Error, Debug)]
pub enum AdapterError {
    /// The request never produced an HTTP response (connection, DNS, TLS, body read).
    #[error("Network error: {0}")]
    Network(String),
    /// The request did not finish within the configured timeout.
    #[error("Request timeout after {ms}ms")]
    Timeout { ms: u64 },
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {reason}")]
    HttpStatus { status: u16, reason: String },
    /// No record with the requested id exists. `resource` is the singular display name.
    #[error("{resource} not found")]
    NotFound { resource: String },
    /// The first path segment does not name a known resource.
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),
    /// The request was well-routed but its payload or shape was rejected.
    #[error("{0}")]
    Validation(String),
    /// A payload could not be encoded or decoded as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The configured base URL and endpoint do not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// The embedded fixture document could not be parsed.
    #[error("Invalid fixture data: {0}")]
    Fixture(#[from] serde_yml::Error),
}

impl AdapterError {
    /// Returns the serializable tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::InvalidUrl(_) => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::HttpStatus { .. } => ErrorKind::Http,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::UnknownEndpoint(_) => ErrorKind::UnknownEndpoint,
            Self::Validation(_) | Self::Serialization(_) | Self::Fixture(_) => {
                ErrorKind::Validation
            }
        }
    }

    /// Whether a retry has a chance of succeeding.
    ///
    /// Transport failures, timeouts, throttling and server-side errors are
    /// retryable; client errors and local failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Coarse classification of a failed request, carried on failed responses.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Timeout,
    Http,
    NotFound,
    UnknownEndpoint,
    Validation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Http => "http",
            Self::NotFound => "not_found",
            Self::UnknownEndpoint => "unknown_endpoint",
            Self::Validation => "validation",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_historical_text() {
        let err = AdapterError::NotFound {
            resource: "User".to_string(),
        };
        assert_eq!(err.to_string(), "User not found");
        assert_eq!(
            AdapterError::UnknownEndpoint("/payments".to_string()).to_string(),
            "Unknown endpoint: /payments"
        );
        let err = AdapterError::HttpStatus {
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
    }

    #[test]
    fn retryable_classification() {
        assert!(AdapterError::Timeout { ms: 10 }.is_retryable());
        assert!(AdapterError::Network("reset".to_string()).is_retryable());
        assert!(AdapterError::HttpStatus {
            status: 429,
            reason: String::new()
        }
        .is_retryable());
        assert!(!AdapterError::HttpStatus {
            status: 404,
            reason: String::new()
        }
        .is_retryable());
        assert!(!AdapterError::Validation("bad".to_string()).is_retryable());
    }
}
