//! External (networked) cache store
//!
//! The external store is a best-effort cache, never a source of truth. Every
//! failure is reported to the caller as [`ClawError::CacheBackendUnavailable`]
//! so the cache façade can fall back to the in-process store.

use async_trait::async_trait;
use clawsearch_core::{ClawError, Result};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Networked cache store used ahead of the fallback store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches a value. `Ok(None)` means missing or unreadable data, `Err`
    /// means the backend could not be asked at all.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores a value with a server-side expiry
    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()>;

    /// Whether the backend is currently reachable
    async fn is_available(&self) -> bool;
}

/// Redis connection configuration
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Prefix for every key written to Redis
    pub prefix: String,
    /// Deadline for connecting, the liveness check, and each command
    pub timeout: Duration,
    /// How long to skip Redis after a failure before reconnecting
    pub retry_interval: Duration,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            prefix: "clawsearch:".to_string(),
            timeout: Duration::from_secs(2),
            retry_interval: Duration::from_secs(30),
        }
    }
}

impl RedisStoreConfig {
    /// Creates a configuration for `url` with default timing
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Backend selected for one operation
#[derive(Clone)]
pub enum StoreHandle {
    /// A live connection; cheap to clone, safe to share across tasks
    Connected(MultiplexedConnection),
    /// No usable connection; the caller should use the fallback store
    Unavailable,
}

impl StoreHandle {
    /// Whether this handle carries a live connection
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

enum Resolution {
    Unresolved,
    Connected(MultiplexedConnection),
    Failed { at: Instant },
}

/// Redis-backed cache store
///
/// The connection is opened lazily on first use and reused for the process
/// lifetime. Resolution runs under an async mutex, so concurrent first
/// requests make a single connection attempt. After a failure Redis is
/// skipped for `retry_interval`, then one caller tries to reconnect.
pub struct RedisStore {
    config: RedisStoreConfig,
    client: Option<redis::Client>,
    state: Mutex<Resolution>,
}

impl RedisStore {
    /// Creates a store for the configured URL without connecting
    ///
    /// An unparsable URL is logged and leaves the store permanently
    /// unavailable rather than failing startup.
    pub fn new(config: RedisStoreConfig) -> Self {
        let client = match redis::Client::open(config.url.as_str()) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(
                    "Invalid external store URL, using in-process cache only: {}",
                    e
                );
                None
            }
        };

        Self {
            config,
            client,
            state: Mutex::new(Resolution::Unresolved),
        }
    }

    /// Gets the store configuration
    pub fn config(&self) -> &RedisStoreConfig {
        &self.config
    }

    /// Resolves the backend for the current operation
    ///
    /// Never fails: connection errors, auth errors and timeouts all come
    /// back as [`StoreHandle::Unavailable`].
    pub async fn connect_once(&self) -> StoreHandle {
        let Some(client) = &self.client else {
            return StoreHandle::Unavailable;
        };

        let mut state = self.state.lock().await;
        match &*state {
            Resolution::Connected(conn) => return StoreHandle::Connected(conn.clone()),
            Resolution::Failed { at } if at.elapsed() < self.config.retry_interval => {
                return StoreHandle::Unavailable;
            }
            _ => {}
        }

        match self.open_connection(client).await {
            Ok(conn) => {
                tracing::info!("Connected to external cache store");
                *state = Resolution::Connected(conn.clone());
                StoreHandle::Connected(conn)
            }
            Err(e) => {
                tracing::warn!("{}", e);
                *state = Resolution::Failed { at: Instant::now() };
                StoreHandle::Unavailable
            }
        }
    }

    async fn open_connection(&self, client: &redis::Client) -> Result<MultiplexedConnection> {
        let attempt = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, redis::RedisError>(conn)
        };

        match tokio::time::timeout(self.config.timeout, attempt).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(ClawError::cache_backend(format!(
                "Redis connection error: {}",
                e
            ))),
            Err(_) => Err(ClawError::cache_backend(format!(
                "Redis connection timed out after {}ms",
                self.config.timeout.as_millis()
            ))),
        }
    }

    /// Drops the cached connection after a failed command
    async fn mark_failed(&self) {
        *self.state.lock().await = Resolution::Failed { at: Instant::now() };
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        match self.connect_once().await {
            StoreHandle::Connected(conn) => Ok(conn),
            StoreHandle::Unavailable => Err(ClawError::cache_backend(
                "external cache store is not connected",
            )),
        }
    }

    fn prefixed_key(&self, key: &str) -> String {
        format!("{}{}", self.config.prefix, key)
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = self.connection().await?;
        let prefixed = self.prefixed_key(key);

        let fetched = tokio::time::timeout(
            self.config.timeout,
            conn.get::<_, Option<String>>(&prefixed),
        )
        .await;

        let text = match fetched {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                self.mark_failed().await;
                return Err(ClawError::cache_backend(format!("Redis GET error: {}", e)));
            }
            Err(_) => {
                self.mark_failed().await;
                return Err(ClawError::cache_backend("Redis GET timed out"));
            }
        };

        Ok(text.and_then(|text| match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %prefixed, "Discarding malformed cache entry: {}", e);
                None
            }
        }))
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let text = value.to_string();
        let seconds = ttl.as_secs().max(1);

        let mut cmd = redis::cmd("SET");
        cmd.arg(self.prefixed_key(key))
            .arg(text)
            .arg("EX")
            .arg(seconds);

        match tokio::time::timeout(self.config.timeout, cmd.query_async::<_, ()>(&mut conn)).await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                self.mark_failed().await;
                Err(ClawError::cache_backend(format!("Redis SET error: {}", e)))
            }
            Err(_) => {
                self.mark_failed().await;
                Err(ClawError::cache_backend("Redis SET timed out"))
            }
        }
    }

    async fn is_available(&self) -> bool {
        self.connect_once().await.is_connected()
    }
}
