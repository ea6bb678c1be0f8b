//! SearXNG client implementation for ClawSearch infrastructure

use async_trait::async_trait;
use clawsearch_core::{ClawError, GatewayConfig, Result, UpstreamHealth, UpstreamResponse};
use std::time::Duration;
use url::Url;

/// Parameters of one upstream search call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamQuery {
    pub query: String,
    pub categories: String,
    pub engines: Option<String>,
    pub time_range: Option<String>,
    pub language: String,
    pub page: u32,
}

impl UpstreamQuery {
    /// Create a query for `categories` with English results on page 1
    pub fn new<Q: Into<String>, C: Into<String>>(query: Q, categories: C) -> Self {
        Self {
            query: query.into(),
            categories: categories.into(),
            engines: None,
            time_range: None,
            language: "en".to_string(),
            page: 1,
        }
    }

    /// Restrict the search to a comma-separated engine list
    pub fn engines(mut self, engines: Option<String>) -> Self {
        self.engines = engines;
        self
    }

    /// Restrict results to a time range (day, week, month, year)
    pub fn time_range(mut self, time_range: Option<String>) -> Self {
        self.time_range = time_range;
        self
    }

    /// Set the result language
    pub fn language<S: Into<String>>(mut self, language: S) -> Self {
        self.language = language.into();
        self
    }

    /// Set the result page
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Query-string pairs sent to SearXNG; optional filters only when set
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", self.query.clone()),
            ("format", "json".to_string()),
            ("categories", self.categories.clone()),
            ("language", self.language.clone()),
            ("pageno", self.page.to_string()),
        ];

        if let Some(engines) = self.engines.as_ref().filter(|e| !e.is_empty()) {
            params.push(("engines", engines.clone()));
        }
        if let Some(time_range) = self.time_range.as_ref().filter(|t| !t.is_empty()) {
            params.push(("time_range", time_range.clone()));
        }

        params
    }
}

/// Search service the gateway forwards queries to
#[async_trait]
pub trait SearchUpstream: Send + Sync {
    /// Run one search. Transport failures are `UpstreamUnavailable`,
    /// failure statuses and unreadable bodies are `UpstreamProtocol`.
    async fn fetch(&self, query: &UpstreamQuery) -> Result<UpstreamResponse>;

    /// Probe the service's health endpoint
    async fn health(&self) -> UpstreamHealth;
}

/// SearXNG client configuration
#[derive(Debug, Clone)]
pub struct SearxngConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub health_timeout: Duration,
}

impl Default for SearxngConfig {
    fn default() -> Self {
        let gateway = GatewayConfig::default();
        Self {
            base_url: gateway.upstream_url,
            timeout: gateway.upstream_timeout,
            health_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&GatewayConfig> for SearxngConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            base_url: config.upstream_url.clone(),
            timeout: config.upstream_timeout,
            ..Default::default()
        }
    }
}

fn client_setup_error(e: impl std::fmt::Display) -> ClawError {
    ClawError::network(format!("Failed to build HTTP client: {}", e))
}

/// SearXNG client for the JSON search API
#[derive(Debug, Clone)]
pub struct SearxngClient {
    config: SearxngConfig,
    client: reqwest::Client,
}

impl SearxngClient {
    /// Create a new SearXNG client
    pub fn new(config: SearxngConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("clawsearch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(client_setup_error)?;

        Ok(Self { config, client })
    }

    /// Get the client configuration
    pub fn config(&self) -> &SearxngConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            path
        )
    }
}

#[async_trait]
impl SearchUpstream for SearxngClient {
    async fn fetch(&self, query: &UpstreamQuery) -> Result<UpstreamResponse> {
        let url = self.endpoint("search");
        tracing::debug!(
            categories = %query.categories,
            page = query.page,
            "Querying SearXNG"
        );

        let response = self
            .client
            .get(&url)
            .query(&query.to_params())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("SearXNG request failed: {}", e);
                ClawError::upstream_unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "SearXNG returned an error status");
            return Err(ClawError::upstream_protocol(
                Some(status.as_u16()),
                format!("HTTP {}", status),
            ));
        }

        response.json::<UpstreamResponse>().await.map_err(|e| {
            tracing::warn!("Failed to parse SearXNG response: {}", e);
            ClawError::upstream_protocol(
                Some(status.as_u16()),
                format!("invalid response body: {}", e),
            )
        })
    }

    async fn health(&self) -> UpstreamHealth {
        let url = self.endpoint("healthz");

        match self
            .client
            .get(&url)
            .timeout(self.config.health_timeout)
            .send()
            .await
        {
            Ok(response) if response.status() == reqwest::StatusCode::OK => UpstreamHealth::Healthy,
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "SearXNG degraded");
                UpstreamHealth::Degraded
            }
            Err(e) => {
                tracing::warn!("SearXNG health check failed: {}", e);
                UpstreamHealth::Unreachable
            }
        }
    }
}
