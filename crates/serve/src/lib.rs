//! ClawSearch Serve Library
//!
//! HTTP surface for the ClawSearch gateway: authenticated search routes
//! over SearXNG with a shared response cache. With the default `openapi`
//! feature the routes are documented at `/docs`.

pub mod api;
pub mod error;
pub mod handlers;
pub mod middleware;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod search;
pub mod server;

pub use error::{ApiError, ErrorResponse};
pub use handlers::AppState;
pub use search::SearchService;
pub use server::{create_app, GatewayServer};

/// Server version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
