//! HTTP handlers for the ClawSearch gateway

use crate::error::ApiError;
#[cfg(feature = "openapi")]
use crate::error::ErrorResponse;
use crate::middleware::ApiKeys;
use crate::search::{
    GeneralSearch, ImageSearch, NewsSearch, SearchService, TechSearch, DEFAULT_LANGUAGE,
    DEFAULT_NEWS_FRESHNESS,
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Json,
};
use clawsearch_core::{
    ClawError, GatewayConfig, HealthResponse, ImageResponse, Result, SearchResponse,
};
use clawsearch_infra::{ResponseCache, SearchUpstream, SearxngClient, SearxngConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Path of the interactive API documentation
pub const DOCS_PATH: &str = "/docs";

/// Highest page a caller may request
pub const MAX_PAGE: i64 = 10;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
    pub api_keys: Arc<ApiKeys>,
}

impl AppState {
    pub fn new(service: SearchService, api_keys: ApiKeys) -> Self {
        Self {
            service: Arc::new(service),
            api_keys: Arc::new(api_keys),
        }
    }

    /// Wires the SearXNG client, response cache and key allow-list from
    /// configuration
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let upstream: Arc<dyn SearchUpstream> =
            Arc::new(SearxngClient::new(SearxngConfig::from(config))?);
        let cache = Arc::new(ResponseCache::from_config(config));
        let service = SearchService::new(upstream, cache, config.cache_ttl);

        Ok(Self::new(service, ApiKeys::new(config.api_keys.iter())))
    }
}

/// Query string for `GET /search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub engines: Option<String>,
    pub freshness: Option<String>,
    pub lang: Option<String>,
    pub page: Option<i64>,
}

/// Query string for `GET /news`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsParams {
    pub q: String,
    pub freshness: Option<String>,
    pub lang: Option<String>,
    pub page: Option<i64>,
}

/// Query string for `GET /tech`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TechParams {
    pub q: String,
    pub freshness: Option<String>,
    pub page: Option<i64>,
}

/// Query string for `GET /images`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageParams {
    pub q: String,
    pub page: Option<i64>,
}

impl SearchParams {
    fn validate(self) -> Result<GeneralSearch> {
        Ok(GeneralSearch {
            query: validate_query(self.q)?,
            engines: non_empty(self.engines),
            freshness: non_empty(self.freshness),
            lang: non_empty(self.lang).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            page: validate_page(self.page)?,
        })
    }
}

impl NewsParams {
    fn validate(self) -> Result<NewsSearch> {
        Ok(NewsSearch {
            query: validate_query(self.q)?,
            freshness: non_empty(self.freshness)
                .unwrap_or_else(|| DEFAULT_NEWS_FRESHNESS.to_string()),
            lang: non_empty(self.lang).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            page: validate_page(self.page)?,
        })
    }
}

impl TechParams {
    fn validate(self) -> Result<TechSearch> {
        Ok(TechSearch {
            query: validate_query(self.q)?,
            freshness: non_empty(self.freshness),
            page: validate_page(self.page)?,
        })
    }
}

impl ImageParams {
    fn validate(self) -> Result<ImageSearch> {
        Ok(ImageSearch {
            query: validate_query(self.q)?,
            page: validate_page(self.page)?,
        })
    }
}

fn validate_query(q: String) -> Result<String> {
    if q.trim().is_empty() {
        return Err(ClawError::validation("q must not be empty"));
    }
    Ok(q)
}

fn validate_page(page: Option<i64>) -> Result<u32> {
    let page = page.unwrap_or(1);
    if !(1..=MAX_PAGE).contains(&page) {
        return Err(ClawError::validation(format!(
            "page must be between 1 and {}, got {}",
            MAX_PAGE, page
        )));
    }
    Ok(page as u32)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn extract<T>(params: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    params
        .map(|Query(p)| p)
        .map_err(|rejection| ClawError::validation(rejection.body_text()))
}

/// Service banner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    /// Interactive API documentation
    pub docs: String,
    pub endpoints: Vec<String>,
}

/// Handler for `GET /`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/",
    tag = "meta",
    responses(
        (status = 200, description = "Service banner", body = RootResponse),
    )
))]
pub async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "ClawSearch API".to_string(),
        version: crate::VERSION.to_string(),
        docs: DOCS_PATH.to_string(),
        endpoints: ["/health", "/search", "/news", "/tech", "/images"]
            .iter()
            .map(|e| e.to_string())
            .collect(),
    })
}

/// Handler for `GET /health`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    tag = "meta",
    responses(
        (status = 200, description = "Upstream and cache health", body = HealthResponse),
    )
))]
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.service.health().await)
}

/// Handler for `GET /search`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/search",
    tag = "search",
    params(
        ("q" = String, Query, description = "Search query"),
        ("engines" = Option<String>, Query, description = "Comma-separated SearXNG engines"),
        ("freshness" = Option<String>, Query, description = "Time range: day, week, month or year"),
        ("lang" = Option<String>, Query, description = "Result language (default: en)"),
        ("page" = Option<u32>, Query, description = "Result page, 1 to 10 (default: 1)"),
    ),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "General web results", body = SearchResponse),
        (status = 401, description = "Missing or unknown API key", body = ErrorResponse),
        (status = 422, description = "Invalid query parameters", body = ErrorResponse),
        (status = 502, description = "SearXNG returned an unusable response", body = ErrorResponse),
        (status = 503, description = "SearXNG is unreachable", body = ErrorResponse),
    )
))]
pub async fn handle_search(
    State(state): State<AppState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> std::result::Result<Json<SearchResponse>, ApiError> {
    let request = extract(params)?.validate()?;
    tracing::info!(query = %request.query, page = request.page, "General search");

    Ok(Json(state.service.general(&request).await?))
}

/// Handler for `GET /news`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/news",
    tag = "search",
    params(
        ("q" = String, Query, description = "Search query"),
        ("freshness" = Option<String>, Query, description = "Time range (default: day)"),
        ("lang" = Option<String>, Query, description = "Result language (default: en)"),
        ("page" = Option<u32>, Query, description = "Result page, 1 to 10 (default: 1)"),
    ),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "News results", body = SearchResponse),
        (status = 401, description = "Missing or unknown API key", body = ErrorResponse),
        (status = 422, description = "Invalid query parameters", body = ErrorResponse),
        (status = 502, description = "SearXNG returned an unusable response", body = ErrorResponse),
        (status = 503, description = "SearXNG is unreachable", body = ErrorResponse),
    )
))]
pub async fn handle_news(
    State(state): State<AppState>,
    params: std::result::Result<Query<NewsParams>, QueryRejection>,
) -> std::result::Result<Json<SearchResponse>, ApiError> {
    let request = extract(params)?.validate()?;
    tracing::info!(query = %request.query, freshness = %request.freshness, "News search");

    Ok(Json(state.service.news(&request).await?))
}

/// Handler for `GET /tech`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tech",
    tag = "search",
    params(
        ("q" = String, Query, description = "Search query"),
        ("freshness" = Option<String>, Query, description = "Time range: day, week, month or year"),
        ("page" = Option<u32>, Query, description = "Result page, 1 to 10 (default: 1)"),
    ),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Results from developer-focused engines", body = SearchResponse),
        (status = 401, description = "Missing or unknown API key", body = ErrorResponse),
        (status = 422, description = "Invalid query parameters", body = ErrorResponse),
        (status = 502, description = "SearXNG returned an unusable response", body = ErrorResponse),
        (status = 503, description = "SearXNG is unreachable", body = ErrorResponse),
    )
))]
pub async fn handle_tech(
    State(state): State<AppState>,
    params: std::result::Result<Query<TechParams>, QueryRejection>,
) -> std::result::Result<Json<SearchResponse>, ApiError> {
    let request = extract(params)?.validate()?;
    tracing::info!(query = %request.query, page = request.page, "Tech search");

    Ok(Json(state.service.tech(&request).await?))
}

/// Handler for `GET /images`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/images",
    tag = "search",
    params(
        ("q" = String, Query, description = "Search query"),
        ("page" = Option<u32>, Query, description = "Result page, 1 to 10 (default: 1)"),
    ),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Image results", body = ImageResponse),
        (status = 401, description = "Missing or unknown API key", body = ErrorResponse),
        (status = 422, description = "Invalid query parameters", body = ErrorResponse),
        (status = 502, description = "SearXNG returned an unusable response", body = ErrorResponse),
        (status = 503, description = "SearXNG is unreachable", body = ErrorResponse),
    )
))]
pub async fn handle_images(
    State(state): State<AppState>,
    params: std::result::Result<Query<ImageParams>, QueryRejection>,
) -> std::result::Result<Json<ImageResponse>, ApiError> {
    let request = extract(params)?.validate()?;
    tracing::info!(query = %request.query, page = request.page, "Image search");

    Ok(Json(state.service.images(&request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_defaults() {
        let request = SearchParams {
            q: "rust".to_string(),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(request.lang, "en");
        assert_eq!(request.page, 1);
        assert!(request.engines.is_none());
        assert!(request.freshness.is_none());
    }

    #[test]
    fn test_blank_optionals_become_absent() {
        let request = SearchParams {
            q: "rust".to_string(),
            engines: Some(String::new()),
            freshness: Some("  ".to_string()),
            lang: Some(String::new()),
            page: Some(4),
        }
        .validate()
        .unwrap();

        assert!(request.engines.is_none());
        assert!(request.freshness.is_none());
        assert_eq!(request.lang, "en");
        assert_eq!(request.page, 4);
    }

    #[test]
    fn test_news_defaults_to_last_day() {
        let request = NewsParams {
            q: "markets".to_string(),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(request.freshness, "day");
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(validate_page(Some(1)).unwrap(), 1);
        assert_eq!(validate_page(Some(10)).unwrap(), 10);
        assert!(validate_page(Some(0)).is_err());
        assert!(validate_page(Some(11)).is_err());
        assert!(validate_page(Some(-3)).is_err());
    }

    #[test]
    fn test_blank_query_is_rejected() {
        let err = ImageParams {
            q: "   ".to_string(),
            page: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.http_status(), 422);

        let err = TechParams::default().validate().unwrap_err();
        assert!(matches!(err, ClawError::Validation { .. }));
    }
}
