//! Error types for the service layer.

use std::fmt;

use zawiyah_api::{AdapterError, ErrorKind};

/// Errors surfaced by [`ApiService`](crate::ApiService) and the domain services.
///
/// A failed adapter response becomes [`ServiceError::Request`], whose display
/// text is exactly the adapter's message so callers that only look at the
/// message keep working; `kind` allows matching without inspecting text.
#[derive(Debug)]
pub enum ServiceError {
    /// The adapter answered with `success: false`.
    Request {
        kind: Option<ErrorKind>,
        message: String,
    },
    /// The response payload did not match the requested type.
    Deserialization(serde_json::Error),
    /// A request payload could not be encoded as JSON.
    Serialization(serde_json::Error),
    /// An adapter could not be constructed.
    Adapter(AdapterError),
    /// Environment or factory configuration was invalid.
    Config(String),
}

impl ServiceError {
    /// Message used when a failed response carries no error text.
    pub const DEFAULT_MESSAGE: &'static str = "Request failed";

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Request { kind, .. } => *kind,
            Self::Adapter(e) => Some(e.kind()),
            Self::Deserialization(_) | Self::Serialization(_) => Some(ErrorKind::Validation),
            Self::Config(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(ErrorKind::NotFound)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { message, .. } => write!(f, "{}", message),
            Self::Deserialization(e) => write!(f, "Failed to decode response: {}", e),
            Self::Serialization(e) => write!(f, "Failed to encode request: {}", e),
            Self::Adapter(e) => write!(f, "Adapter error: {}", e),
            Self::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Deserialization(e) | Self::Serialization(e) => Some(e),
            Self::Adapter(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AdapterError> for ServiceError {
    fn from(e: AdapterError) -> Self {
        Self::Adapter(e)
    }
}
