//! Error handling for ClawSearch core library

use std::fmt;
use thiserror::Error;

/// Result type alias for ClawSearch operations
pub type Result<T> = std::result::Result<T, ClawError>;

/// Main error type for ClawSearch operations
#[derive(Error, Debug)]
pub enum ClawError {
    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The search service could not be reached at all
    #[error("SearXNG unavailable: {message}")]
    UpstreamUnavailable { message: String },

    /// The search service answered, but not with a usable response
    #[error("SearXNG error: {message}")]
    UpstreamProtocol {
        status: Option<u16>,
        message: String,
    },

    /// The external cache store failed; never leaves the cache layer
    #[error("Cache backend unavailable: {message}")]
    CacheBackendUnavailable { message: String },

    /// Presented API key is missing or not allowed
    #[error("Invalid or missing API key")]
    AuthRejected,

    /// Local network setup errors (bind, accept, HTTP client construction)
    #[error("Network error: {message}")]
    Network { message: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl ClawError {
    /// Create an upstream unavailable error
    pub fn upstream_unavailable<S: Into<String>>(message: S) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }

    /// Create an upstream protocol error
    pub fn upstream_protocol<S: Into<String>>(status: Option<u16>, message: S) -> Self {
        Self::UpstreamProtocol {
            status,
            message: message.into(),
        }
    }

    /// Create a cache backend error
    pub fn cache_backend<S: Into<String>>(message: S) -> Self {
        Self::CacheBackendUnavailable {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// HTTP status code a client should see for this error
    pub fn http_status(&self) -> u16 {
        match self {
            Self::UpstreamUnavailable { .. } => 503,
            Self::UpstreamProtocol { .. } => 502,
            Self::AuthRejected => 401,
            Self::Validation { .. } => 422,
            _ => 500,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Io(_) | Self::Network { .. } => ErrorCategory::Network,
            Self::Json(_) => ErrorCategory::Serialization,
            Self::Config(_) | Self::Url(_) => ErrorCategory::Configuration,
            Self::UpstreamUnavailable { .. } | Self::UpstreamProtocol { .. } => {
                ErrorCategory::Upstream
            }
            Self::CacheBackendUnavailable { .. } => ErrorCategory::Cache,
            Self::AuthRejected => ErrorCategory::Security,
            Self::Validation { .. } => ErrorCategory::Validation,
        }
    }
}

/// Error categories for logging
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Network,
    Serialization,
    Configuration,
    Upstream,
    Cache,
    Security,
    Validation,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Serialization => write!(f, "serialization"),
            Self::Configuration => write!(f, "configuration"),
            Self::Upstream => write!(f, "upstream"),
            Self::Cache => write!(f, "cache"),
            Self::Security => write!(f, "security"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_errors_map_to_gateway_statuses() {
        assert_eq!(ClawError::upstream_unavailable("refused").http_status(), 503);
        assert_eq!(
            ClawError::upstream_protocol(Some(500), "boom").http_status(),
            502
        );
        assert_eq!(ClawError::AuthRejected.http_status(), 401);
        assert_eq!(ClawError::validation("page").http_status(), 422);
        assert_eq!(ClawError::cache_backend("down").http_status(), 500);
    }

    #[test]
    fn test_error_display() {
        let err = ClawError::upstream_unavailable("connection refused");
        assert_eq!(err.to_string(), "SearXNG unavailable: connection refused");

        let err = ClawError::upstream_protocol(Some(502), "HTTP 502 Bad Gateway");
        assert_eq!(err.to_string(), "SearXNG error: HTTP 502 Bad Gateway");

        assert_eq!(
            ClawError::AuthRejected.to_string(),
            "Invalid or missing API key"
        );
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            ClawError::cache_backend("x").category(),
            ErrorCategory::Cache
        );
        assert_eq!(
            ClawError::upstream_unavailable("x").category(),
            ErrorCategory::Upstream
        );
        assert_eq!(ErrorCategory::Upstream.to_string(), "upstream");
    }

    #[test]
    fn test_network_setup_errors_are_internal() {
        let err = ClawError::network("failed to build HTTP client");
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_error_from_conversions() {
        let json_err = serde_json::from_str::<i32>("invalid json").unwrap_err();
        let err: ClawError = json_err.into();
        assert!(matches!(err, ClawError::Json(_)));

        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: ClawError = url_err.into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
