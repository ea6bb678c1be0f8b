//! ClawSearch Infrastructure Library
//!
//! Infrastructure components for the ClawSearch gateway: the response
//! cache with its Redis and in-process backends, the SearXNG client, and
//! logging setup.

pub mod cache;
pub mod logger;
pub mod searxng;

pub use cache::{
    CacheBackend, CacheKey, FallbackStore, ParamValue, QueryParams, RedisStore, RedisStoreConfig,
    RemoteStore, ResponseCache, SharedResponseCache, StoreHandle,
};
pub use logger::*;
pub use searxng::{SearchUpstream, SearxngClient, SearxngConfig, UpstreamQuery};

/// Infrastructure version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
