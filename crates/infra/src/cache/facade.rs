//! Response cache façade
//!
//! Hides backend selection from callers: every operation tries the external
//! store first and, if it cannot answer, runs once against the in-process
//! fallback store. Callers never see a cache error.

use super::external::{RedisStore, RedisStoreConfig, RemoteStore};
use super::fallback::FallbackStore;
use super::key::CacheKey;
use clawsearch_core::GatewayConfig;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cache backend currently answering requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    External,
    Fallback,
}

impl CacheBackend {
    /// Backend name as reported by the health endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Fallback => "fallback",
        }
    }
}

/// Unified get/set over the external store and the fallback store
pub struct ResponseCache {
    external: Option<Arc<dyn RemoteStore>>,
    fallback: FallbackStore,
    degraded: AtomicBool,
}

impl ResponseCache {
    /// Creates a cache over an optional external store
    ///
    /// # Arguments
    ///
    /// * `external` - Networked store tried first; `None` uses the fallback
    ///   store only
    pub fn new(external: Option<Arc<dyn RemoteStore>>) -> Self {
        Self {
            external,
            fallback: FallbackStore::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Creates a cache that only uses the in-process store
    ///
    /// # Examples
    ///
    /// ```
    /// use clawsearch_infra::cache::{CacheKey, QueryParams, ResponseCache};
    /// use std::time::Duration;
    ///
    /// # tokio_test::block_on(async {
    /// let cache = ResponseCache::in_memory();
    /// let key = CacheKey::derive("rust", &QueryParams::new());
    /// cache.set(&key, serde_json::json!({"total": 1}), Duration::from_secs(60)).await;
    /// assert!(cache.get(&key).await.is_some());
    /// # });
    /// ```
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Creates the cache described by the gateway configuration
    ///
    /// No connection is attempted here; the external store connects on
    /// first use.
    pub fn from_config(config: &GatewayConfig) -> Self {
        match &config.external_store_url {
            Some(url) => {
                tracing::info!("External cache store configured");
                let store = RedisStore::new(RedisStoreConfig {
                    timeout: config.external_store_timeout,
                    ..RedisStoreConfig::new(url.clone())
                });
                Self::new(Some(Arc::new(store)))
            }
            None => {
                tracing::info!("No external cache store configured, using in-process cache");
                Self::in_memory()
            }
        }
    }

    /// Gets a cached value
    ///
    /// The external store is asked first. When it is unavailable, or simply
    /// has nothing for the key, the fallback store is asked.
    pub async fn get(&self, key: &CacheKey) -> Option<Value> {
        if let Some(external) = &self.external {
            match external.get(key.as_str()).await {
                Ok(Some(value)) => {
                    self.note_recovered();
                    tracing::debug!(key = %key, backend = "external", "Cache hit");
                    return Some(value);
                }
                Ok(None) => self.note_recovered(),
                Err(e) => self.note_degraded(&e),
            }
        }

        let value = self.fallback.get(key.as_str());
        if value.is_some() {
            tracing::debug!(key = %key, backend = "fallback", "Cache hit");
        } else {
            tracing::debug!(key = %key, "Cache miss");
        }
        value
    }

    /// Stores a value in exactly one backend
    ///
    /// The external store is used when it accepts the write, the fallback
    /// store otherwise. Backend failures are absorbed.
    pub async fn set(&self, key: &CacheKey, value: Value, ttl: Duration) {
        if let Some(external) = &self.external {
            match external.set(key.as_str(), &value, ttl).await {
                Ok(()) => {
                    self.note_recovered();
                    return;
                }
                Err(e) => self.note_degraded(&e),
            }
        }

        self.fallback.set(key.as_str(), value, ttl);
    }

    /// Gets and decodes a cached value; undecodable entries count as misses
    pub async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(key = %key, "Ignoring undecodable cache entry: {}", e);
                None
            }
        }
    }

    /// Encodes and stores a value; values that fail to encode are skipped
    pub async fn set_json<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        match serde_json::to_value(value) {
            Ok(encoded) => self.set(key, encoded, ttl).await,
            Err(e) => tracing::warn!(key = %key, "Skipping unencodable cache entry: {}", e),
        }
    }

    /// Backend that would answer the next request
    pub async fn active_backend(&self) -> CacheBackend {
        match &self.external {
            Some(external) if external.is_available().await => CacheBackend::External,
            _ => CacheBackend::Fallback,
        }
    }

    /// Gets the in-process fallback store
    pub fn fallback(&self) -> &FallbackStore {
        &self.fallback
    }

    fn note_degraded(&self, error: &clawsearch_core::ClawError) {
        if !self.degraded.swap(true, Ordering::Relaxed) {
            tracing::warn!("External cache store unavailable, using fallback: {}", error);
        } else {
            tracing::debug!("External cache store still unavailable: {}", error);
        }
    }

    fn note_recovered(&self) {
        if self.degraded.swap(false, Ordering::Relaxed) {
            tracing::info!("External cache store recovered");
        }
    }
}

/// Thread-safe shared response cache
pub type SharedResponseCache = Arc<ResponseCache>;
