//! API key authentication and request identification

use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use clawsearch_core::ClawError;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the caller's API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the request identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Allow-list of API keys
///
/// An empty list disables authentication.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    keys: HashSet<String>,
}

impl ApiKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Whether a request presenting `key` may proceed
    pub fn accepts(&self, key: Option<&str>) -> bool {
        if !self.is_enabled() {
            return true;
        }
        key.map(|k| self.keys.contains(k)).unwrap_or(false)
    }
}

/// Rejects requests without a known `x-api-key` header
pub async fn api_key_middleware(
    State(keys): State<Arc<ApiKeys>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    if !keys.accepts(presented) {
        match presented {
            Some(key) => tracing::warn!(
                api_key_prefix = &key[..key.len().min(4)],
                "Invalid API key"
            ),
            None => tracing::warn!("Missing API key header"),
        }
        return Err(ClawError::AuthRejected.into());
    }

    Ok(next.run(request).await)
}

/// Tags each request and its response with an `x-request-id`
///
/// A caller-supplied id is kept; otherwise a fresh v4 UUID is assigned.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .cloned()
        .or_else(|| HeaderValue::from_str(&Uuid::new_v4().to_string()).ok());

    let Some(request_id) = request_id else {
        return next.run(request).await;
    };

    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, request_id.clone());

    let span = tracing::info_span!(
        "request",
        request_id = request_id.to_str().unwrap_or_default()
    );
    tracing::debug!(method = %request.method(), uri = %request.uri(), "Request received");
    let mut response = next.run(request).instrument(span).await;

    response
        .headers_mut()
        .insert(REQUEST_ID_HEADER, request_id);
    response
}
