//! Response caching for the ClawSearch gateway
//!
//! Cached envelopes live in Redis when it is reachable and in an
//! in-process store otherwise. [`ResponseCache`] is the only type request
//! handlers need; the stores behind it are public for wiring and tests.

pub mod external;
pub mod facade;
pub mod fallback;
pub mod key;

pub use external::{RedisStore, RedisStoreConfig, RemoteStore, StoreHandle};
pub use facade::{CacheBackend, ResponseCache, SharedResponseCache};
pub use fallback::FallbackStore;
pub use key::{CacheKey, ParamValue, QueryParams, KEY_NAMESPACE};
