//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use clawsearch_core::ClawError;
use serde::{Deserialize, Serialize};

/// Error body returned by every failing route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    pub detail: String,
}

/// A [`ClawError`] on its way out of a handler
#[derive(Debug)]
pub struct ApiError(pub ClawError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<ClawError> for ApiError {
    fn from(err: ClawError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(category = %self.0.category(), "Request failed: {}", self.0);
        } else {
            tracing::debug!(category = %self.0.category(), "Request rejected: {}", self.0);
        }

        let body = ErrorResponse {
            detail: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
