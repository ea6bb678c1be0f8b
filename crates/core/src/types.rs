//! Wire types for the SearXNG API and the response envelopes the gateway
//! exposes and caches

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Raw SearXNG `/search?format=json` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<UpstreamResult>,
    #[serde(default)]
    pub number_of_results: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One raw SearXNG result. SearXNG sends `null` for many fields, so every
/// field is optional here and defaulted during normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, rename = "publishedDate")]
    pub published_date: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub img_src: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl UpstreamResponse {
    /// Reported total, or the number of results when SearXNG omits it
    pub fn total(&self) -> u64 {
        match self.number_of_results {
            Some(n) if n.is_finite() && n >= 0.0 => n as u64,
            _ => self.results.len() as u64,
        }
    }
}

/// Individual search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(alias = "content", default)]
    pub snippet: String,
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub score: f64,
    #[serde(alias = "publishedDate", default)]
    pub published: Option<String>,
}

impl From<&UpstreamResult> for SearchResult {
    fn from(raw: &UpstreamResult) -> Self {
        Self {
            title: raw.title.clone().unwrap_or_default(),
            url: raw.url.clone().unwrap_or_default(),
            snippet: raw.content.clone().unwrap_or_default(),
            engine: raw.engine.clone().unwrap_or_default(),
            score: raw.score.unwrap_or(0.0),
            published: raw.published_date.clone(),
        }
    }
}

/// Envelope returned by the general, news and tech shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total: u64,
    #[serde(default)]
    pub cached: bool,
    pub timestamp: String,
    #[serde(default)]
    pub engines_used: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl SearchResponse {
    /// Build a fresh (uncached) envelope from a raw upstream response
    pub fn from_upstream(query: &str, raw: &UpstreamResponse, timestamp: String) -> Self {
        let results: Vec<SearchResult> = raw.results.iter().map(SearchResult::from).collect();
        let engines_used = distinct_engines(results.iter().map(|r| r.engine.as_str()));

        Self {
            query: query.to_string(),
            total: raw.total(),
            results,
            cached: false,
            timestamp,
            engines_used,
            suggestions: raw.suggestions.clone(),
        }
    }
}

/// Image search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ImageResult {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub engine: String,
}

impl From<&UpstreamResult> for ImageResult {
    fn from(raw: &UpstreamResult) -> Self {
        Self {
            title: raw.title.clone().unwrap_or_default(),
            url: raw.url.clone().unwrap_or_default(),
            thumbnail: raw
                .thumbnail
                .clone()
                .or_else(|| raw.img_src.clone())
                .unwrap_or_default(),
            source: raw.source.clone().unwrap_or_default(),
            engine: raw.engine.clone().unwrap_or_default(),
        }
    }
}

/// Envelope returned by the image shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ImageResponse {
    pub query: String,
    pub images: Vec<ImageResult>,
    pub total: u64,
    #[serde(default)]
    pub cached: bool,
    pub timestamp: String,
}

impl ImageResponse {
    /// Build a fresh (uncached) envelope from a raw upstream response
    pub fn from_upstream(query: &str, raw: &UpstreamResponse, timestamp: String) -> Self {
        let images: Vec<ImageResult> = raw.results.iter().map(ImageResult::from).collect();

        Self {
            query: query.to_string(),
            total: images.len() as u64,
            images,
            cached: false,
            timestamp,
        }
    }
}

/// Upstream reachability as seen by the health probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum UpstreamHealth {
    Healthy,
    Degraded,
    Unreachable,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: String,
    pub searxng: UpstreamHealth,
    pub cache: String,
    pub version: String,
    pub timestamp: String,
}

/// Current UTC time in the envelope timestamp format
pub fn utc_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Sorted, de-duplicated, non-empty engine names
fn distinct_engines<'a>(engines: impl Iterator<Item = &'a str>) -> Vec<String> {
    engines
        .filter(|engine| !engine.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_upstream() -> UpstreamResponse {
        serde_json::from_value(json!({
            "results": [
                {"title": "Rust", "url": "https://rust-lang.org", "content": "A language",
                 "engine": "google", "score": 2.5, "publishedDate": "2024-01-01T00:00:00"},
                {"title": "Crates", "url": "https://crates.io", "content": null,
                 "engine": "bing", "score": null, "publishedDate": null},
                {"title": "Docs", "url": "https://docs.rs", "engine": "google"}
            ],
            "number_of_results": 1200,
            "suggestions": ["rust book"]
        }))
        .unwrap()
    }

    #[test]
    fn test_search_response_from_upstream() {
        let raw = sample_upstream();
        let response = SearchResponse::from_upstream("rust", &raw, "ts".to_string());

        assert_eq!(response.query, "rust");
        assert_eq!(response.total, 1200);
        assert!(!response.cached);
        assert_eq!(response.results.len(), 3);
        assert_eq!(response.results[0].snippet, "A language");
        assert_eq!(
            response.results[0].published.as_deref(),
            Some("2024-01-01T00:00:00")
        );
        assert_eq!(response.results[1].snippet, "");
        assert_eq!(response.results[1].score, 0.0);
        assert_eq!(response.engines_used, vec!["bing", "google"]);
        assert_eq!(response.suggestions, vec!["rust book"]);
    }

    #[test]
    fn test_null_collections_are_empty() {
        let raw: UpstreamResponse =
            serde_json::from_value(json!({"results": null, "suggestions": null})).unwrap();
        assert!(raw.results.is_empty());
        assert!(raw.suggestions.is_empty());
        assert_eq!(raw.total(), 0);
    }

    #[test]
    fn test_total_falls_back_to_result_count() {
        let raw: UpstreamResponse =
            serde_json::from_value(json!({"results": [{"title": "a", "url": "b"}]})).unwrap();
        assert_eq!(raw.total(), 1);
    }

    #[test]
    fn test_search_result_accepts_upstream_field_names() {
        let result: SearchResult = serde_json::from_value(json!({
            "title": "t", "url": "u", "content": "c", "publishedDate": "d"
        }))
        .unwrap();
        assert_eq!(result.snippet, "c");
        assert_eq!(result.published.as_deref(), Some("d"));
    }

    #[test]
    fn test_image_thumbnail_falls_back_to_img_src() {
        let raw: UpstreamResponse = serde_json::from_value(json!({
            "results": [
                {"title": "cat", "url": "u1", "thumbnail": "t1", "img_src": "i1", "engine": "bing"},
                {"title": "dog", "url": "u2", "img_src": "i2", "source": "flickr"}
            ]
        }))
        .unwrap();
        let response = ImageResponse::from_upstream("pets", &raw, "ts".to_string());

        assert_eq!(response.total, 2);
        assert_eq!(response.images[0].thumbnail, "t1");
        assert_eq!(response.images[1].thumbnail, "i2");
        assert_eq!(response.images[1].source, "flickr");
    }

    #[test]
    fn test_utc_timestamp_has_zulu_suffix() {
        let ts = utc_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_upstream_health_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&UpstreamHealth::Unreachable).unwrap(),
            "\"unreachable\""
        );
    }
}
