//! Search service
//!
//! One operation per query shape. Each derives a cache key from the
//! normalized parameters, serves a cached envelope when one exists, and
//! otherwise queries SearXNG, shapes the envelope and caches it.
//!
//! Concurrent misses for the same key are not coalesced: both requests go
//! to SearXNG and the later cache write wins.

use clawsearch_core::{
    utc_timestamp, HealthResponse, ImageResponse, Result, SearchResponse, UpstreamHealth,
    UpstreamResponse,
};
use clawsearch_infra::{CacheKey, QueryParams, SearchUpstream, SharedResponseCache, UpstreamQuery};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Engines queried by the tech shape
pub const TECH_ENGINES: &str = "github,stackoverflow,hackernews,google";

/// Default language when the caller does not pick one
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default time range for news searches
pub const DEFAULT_NEWS_FRESHNESS: &str = "day";

/// General web search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralSearch {
    pub query: String,
    pub engines: Option<String>,
    pub freshness: Option<String>,
    pub lang: String,
    pub page: u32,
}

impl GeneralSearch {
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::derive(
            &self.query,
            &QueryParams::new()
                .with("engines", self.engines.as_deref())
                .with("freshness", self.freshness.as_deref())
                .with("lang", self.lang.as_str())
                .with("page", self.page)
                .with("cat", "general"),
        )
    }

    pub fn upstream_query(&self) -> UpstreamQuery {
        UpstreamQuery::new(&self.query, "general")
            .engines(self.engines.clone())
            .time_range(self.freshness.clone())
            .language(&self.lang)
            .page(self.page)
    }
}

/// News search; always time-bounded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsSearch {
    pub query: String,
    pub freshness: String,
    pub lang: String,
    pub page: u32,
}

impl NewsSearch {
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::derive(
            &self.query,
            &QueryParams::new()
                .with("freshness", self.freshness.as_str())
                .with("lang", self.lang.as_str())
                .with("page", self.page)
                .with("cat", "news"),
        )
    }

    pub fn upstream_query(&self) -> UpstreamQuery {
        UpstreamQuery::new(&self.query, "news")
            .time_range(Some(self.freshness.clone()))
            .language(&self.lang)
            .page(self.page)
    }
}

/// Tech and IT search over a fixed engine set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechSearch {
    pub query: String,
    pub freshness: Option<String>,
    pub page: u32,
}

impl TechSearch {
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::derive(
            &self.query,
            &QueryParams::new()
                .with("freshness", self.freshness.as_deref())
                .with("page", self.page)
                .with("cat", "tech"),
        )
    }

    pub fn upstream_query(&self) -> UpstreamQuery {
        UpstreamQuery::new(&self.query, "it")
            .engines(Some(TECH_ENGINES.to_string()))
            .time_range(self.freshness.clone())
            .language(DEFAULT_LANGUAGE)
            .page(self.page)
    }
}

/// Image search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSearch {
    pub query: String,
    pub page: u32,
}

impl ImageSearch {
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::derive(
            &self.query,
            &QueryParams::new()
                .with("page", self.page)
                .with("cat", "images"),
        )
    }

    pub fn upstream_query(&self) -> UpstreamQuery {
        UpstreamQuery::new(&self.query, "images")
            .language(DEFAULT_LANGUAGE)
            .page(self.page)
    }
}

/// Envelopes that carry a `cached` flag
trait Envelope: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn mark_cached(&mut self);
}

impl Envelope for SearchResponse {
    fn mark_cached(&mut self) {
        self.cached = true;
    }
}

impl Envelope for ImageResponse {
    fn mark_cached(&mut self) {
        self.cached = true;
    }
}

/// Cache-backed search over an upstream service
pub struct SearchService {
    upstream: Arc<dyn SearchUpstream>,
    cache: SharedResponseCache,
    ttl: Duration,
}

impl SearchService {
    /// Creates a service
    ///
    /// # Arguments
    ///
    /// * `upstream` - Search service queried on cache misses
    /// * `cache` - Response cache shared by all requests
    /// * `ttl` - Lifetime of each cached envelope
    pub fn new(upstream: Arc<dyn SearchUpstream>, cache: SharedResponseCache, ttl: Duration) -> Self {
        Self {
            upstream,
            cache,
            ttl,
        }
    }

    /// Gets the response cache
    pub fn cache(&self) -> &SharedResponseCache {
        &self.cache
    }

    /// General web search
    pub async fn general(&self, request: &GeneralSearch) -> Result<SearchResponse> {
        self.cached_or_fetch(request.cache_key(), request.upstream_query(), |raw| {
            SearchResponse::from_upstream(&request.query, raw, utc_timestamp())
        })
        .await
    }

    /// News search
    pub async fn news(&self, request: &NewsSearch) -> Result<SearchResponse> {
        self.cached_or_fetch(request.cache_key(), request.upstream_query(), |raw| {
            SearchResponse::from_upstream(&request.query, raw, utc_timestamp())
        })
        .await
    }

    /// Tech search
    pub async fn tech(&self, request: &TechSearch) -> Result<SearchResponse> {
        self.cached_or_fetch(request.cache_key(), request.upstream_query(), |raw| {
            SearchResponse::from_upstream(&request.query, raw, utc_timestamp())
        })
        .await
    }

    /// Image search
    pub async fn images(&self, request: &ImageSearch) -> Result<ImageResponse> {
        self.cached_or_fetch(request.cache_key(), request.upstream_query(), |raw| {
            ImageResponse::from_upstream(&request.query, raw, utc_timestamp())
        })
        .await
    }

    /// Upstream and cache health
    pub async fn health(&self) -> HealthResponse {
        let searxng = self.upstream.health().await;
        let cache = self.cache.active_backend().await;

        HealthResponse {
            status: if searxng == UpstreamHealth::Healthy {
                "healthy".to_string()
            } else {
                "degraded".to_string()
            },
            searxng,
            cache: cache.as_str().to_string(),
            version: crate::VERSION.to_string(),
            timestamp: utc_timestamp(),
        }
    }

    async fn cached_or_fetch<T, F>(&self, key: CacheKey, query: UpstreamQuery, build: F) -> Result<T>
    where
        T: Envelope,
        F: FnOnce(&UpstreamResponse) -> T,
    {
        if let Some(mut envelope) = self.cache.get_json::<T>(&key).await {
            envelope.mark_cached();
            return Ok(envelope);
        }

        let raw = self.upstream.fetch(&query).await?;
        let envelope = build(&raw);
        self.store(key, envelope.clone()).await;

        Ok(envelope)
    }

    /// Writes on a detached task so a cancelled request still populates
    /// the cache
    async fn store<T: Envelope>(&self, key: CacheKey, envelope: T) {
        let cache = self.cache.clone();
        let ttl = self.ttl;

        let write = tokio::spawn(async move {
            cache.set_json(&key, &envelope, ttl).await;
        });

        if let Err(e) = write.await {
            tracing::warn!("Cache write task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clawsearch_core::ClawError;
    use clawsearch_infra::ResponseCache;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum Outcome {
        Body(serde_json::Value),
        Unavailable,
        BadStatus,
    }

    struct MockUpstream {
        outcome: Outcome,
        calls: AtomicUsize,
        last_query: Mutex<Option<UpstreamQuery>>,
    }

    impl MockUpstream {
        fn new(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
                last_query: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_query(&self) -> UpstreamQuery {
            self.last_query.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl SearchUpstream for MockUpstream {
        async fn fetch(&self, query: &UpstreamQuery) -> Result<UpstreamResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(query.clone());
            match &self.outcome {
                Outcome::Body(body) => Ok(serde_json::from_value(body.clone())?),
                Outcome::Unavailable => Err(ClawError::upstream_unavailable("connection refused")),
                Outcome::BadStatus => Err(ClawError::upstream_protocol(Some(500), "HTTP 500")),
            }
        }

        async fn health(&self) -> UpstreamHealth {
            match self.outcome {
                Outcome::Body(_) => UpstreamHealth::Healthy,
                Outcome::Unavailable => UpstreamHealth::Unreachable,
                Outcome::BadStatus => UpstreamHealth::Degraded,
            }
        }
    }

    fn body() -> serde_json::Value {
        json!({
            "number_of_results": 2,
            "results": [
                {"title": "Rust", "url": "https://rust-lang.org", "content": "lang",
                 "engine": "google", "score": 1.0, "thumbnail": "t.png"},
                {"title": "Tokio", "url": "https://tokio.rs", "content": "runtime",
                 "engine": "bing", "score": 0.5, "img_src": "i.png"}
            ],
            "suggestions": []
        })
    }

    fn service_over(upstream: Arc<MockUpstream>) -> SearchService {
        SearchService::new(
            upstream,
            Arc::new(ResponseCache::in_memory()),
            Duration::from_secs(300),
        )
    }

    fn general(query: &str) -> GeneralSearch {
        GeneralSearch {
            query: query.to_string(),
            engines: None,
            freshness: None,
            lang: "en".to_string(),
            page: 1,
        }
    }

    #[tokio::test]
    async fn test_miss_fetches_then_hit_is_served_from_cache() {
        let upstream = MockUpstream::new(Outcome::Body(body()));
        let service = service_over(upstream.clone());

        let first = service.general(&general("rust")).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.total, 2);
        assert_eq!(first.engines_used, vec!["bing", "google"]);

        let second = service.general(&general("rust")).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.results, first.results);
        assert_eq!(second.timestamp, first.timestamp);
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_distinct_parameters_do_not_share_entries() {
        let upstream = MockUpstream::new(Outcome::Body(body()));
        let service = service_over(upstream.clone());

        service.general(&general("rust")).await.unwrap();
        let mut paged = general("rust");
        paged.page = 2;
        let second = service.general(&paged).await.unwrap();

        assert!(!second.cached);
        assert_eq!(upstream.calls(), 2);
    }

    #[tokio::test]
    async fn test_shapes_do_not_share_entries() {
        let upstream = MockUpstream::new(Outcome::Body(body()));
        let service = service_over(upstream.clone());

        service.general(&general("rust")).await.unwrap();
        let tech = service
            .tech(&TechSearch {
                query: "rust".to_string(),
                freshness: None,
                page: 1,
            })
            .await
            .unwrap();

        assert!(!tech.cached);
        assert_eq!(upstream.calls(), 2);
    }

    #[tokio::test]
    async fn test_general_forwards_filters() {
        let upstream = MockUpstream::new(Outcome::Body(body()));
        let service = service_over(upstream.clone());

        let request = GeneralSearch {
            query: "rust".to_string(),
            engines: Some("google,bing".to_string()),
            freshness: Some("week".to_string()),
            lang: "de".to_string(),
            page: 3,
        };
        service.general(&request).await.unwrap();

        let sent = upstream.last_query();
        assert_eq!(sent.categories, "general");
        assert_eq!(sent.engines.as_deref(), Some("google,bing"));
        assert_eq!(sent.time_range.as_deref(), Some("week"));
        assert_eq!(sent.language, "de");
        assert_eq!(sent.page, 3);
    }

    #[tokio::test]
    async fn test_news_and_tech_upstream_queries() {
        let news = NewsSearch {
            query: "election".to_string(),
            freshness: DEFAULT_NEWS_FRESHNESS.to_string(),
            lang: "en".to_string(),
            page: 1,
        }
        .upstream_query();
        assert_eq!(news.categories, "news");
        assert_eq!(news.time_range.as_deref(), Some("day"));
        assert!(news.engines.is_none());

        let tech = TechSearch {
            query: "borrow checker".to_string(),
            freshness: Some("month".to_string()),
            page: 2,
        }
        .upstream_query();
        assert_eq!(tech.categories, "it");
        assert_eq!(tech.engines.as_deref(), Some(TECH_ENGINES));
        assert_eq!(tech.language, "en");
    }

    #[tokio::test]
    async fn test_images_are_shaped_and_cached() {
        let upstream = MockUpstream::new(Outcome::Body(body()));
        let service = service_over(upstream.clone());
        let request = ImageSearch {
            query: "crab".to_string(),
            page: 1,
        };

        let first = service.images(&request).await.unwrap();
        assert_eq!(first.total, 2);
        assert_eq!(first.images[0].thumbnail, "t.png");
        assert_eq!(first.images[1].thumbnail, "i.png");
        assert_eq!(upstream.last_query().categories, "images");

        let second = service.images(&request).await.unwrap();
        assert!(second.cached);
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_upstream_errors_propagate_and_are_not_cached() {
        let upstream = MockUpstream::new(Outcome::Unavailable);
        let service = service_over(upstream.clone());

        let err = service.general(&general("rust")).await.unwrap_err();
        assert!(matches!(err, ClawError::UpstreamUnavailable { .. }));
        assert!(service.cache().fallback().is_empty());

        service.general(&general("rust")).await.unwrap_err();
        assert_eq!(upstream.calls(), 2);

        let upstream = MockUpstream::new(Outcome::BadStatus);
        let err = service_over(upstream).general(&general("rust")).await.unwrap_err();
        assert_eq!(err.http_status(), 502);
    }

    #[tokio::test]
    async fn test_health_reports_upstream_and_cache() {
        let healthy = service_over(MockUpstream::new(Outcome::Body(body()))).health().await;
        assert_eq!(healthy.status, "healthy");
        assert_eq!(healthy.cache, "fallback");

        let degraded = service_over(MockUpstream::new(Outcome::Unavailable)).health().await;
        assert_eq!(degraded.status, "degraded");
        assert_eq!(degraded.searxng, UpstreamHealth::Unreachable);
    }

    #[test]
    fn test_key_ignores_parameter_order() {
        let a = CacheKey::derive(
            "weather",
            &QueryParams::new()
                .with("engines", None::<&str>)
                .with("page", 1u32),
        );
        let b = CacheKey::derive(
            "weather",
            &QueryParams::new()
                .with("page", 1u32)
                .with("engines", None::<&str>),
        );
        assert_eq!(a, b);
    }
}
