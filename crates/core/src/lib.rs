//! ClawSearch Core Library
//!
//! Shared building blocks for the ClawSearch gateway: the error taxonomy,
//! environment configuration, and the wire and envelope types exchanged
//! with SearXNG and with API clients.

pub mod config;
pub mod error;
pub mod types;

pub use config::GatewayConfig;
pub use error::{ClawError, ErrorCategory, Result};
pub use types::{
    utc_timestamp, HealthResponse, ImageResponse, ImageResult, SearchResponse, SearchResult,
    UpstreamHealth, UpstreamResponse, UpstreamResult,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version info as a formatted string
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        let info = version_info();
        assert!(info.contains(VERSION));
        assert!(info.starts_with("clawsearch-core"));
    }
}
