//! OpenAPI documentation for the gateway
//!
//! Only available with the `openapi` feature. The generated document is
//! served at `/docs/openapi.json` and browsed through Swagger UI at `/docs`.

use crate::error::ErrorResponse;
use crate::handlers::RootResponse;
use clawsearch_core::{
    HealthResponse, ImageResponse, ImageResult, SearchResponse, SearchResult, UpstreamHealth,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Where the OpenAPI document is served
pub const OPENAPI_JSON_PATH: &str = "/docs/openapi.json";

/// OpenAPI document for every ClawSearch route
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ClawSearch API",
        description = "Private meta-search over SearXNG with a response cache",
    ),
    paths(
        crate::handlers::handle_root,
        crate::handlers::handle_health,
        crate::handlers::handle_search,
        crate::handlers::handle_news,
        crate::handlers::handle_tech,
        crate::handlers::handle_images,
    ),
    components(
        schemas(
            SearchResponse,
            SearchResult,
            ImageResponse,
            ImageResult,
            HealthResponse,
            UpstreamHealth,
            RootResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "search", description = "Search shapes forwarded to SearXNG"),
        (name = "meta", description = "Service banner and health"),
    )
)]
pub struct ApiDoc;

/// Declares the `x-api-key` header scheme used by the search routes
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(
                    crate::middleware::API_KEY_HEADER,
                ))),
            );
        }
    }
}

/// Swagger UI at `/docs` backed by [`ApiDoc`]
pub fn docs_router() -> SwaggerUi {
    SwaggerUi::new(crate::handlers::DOCS_PATH).url(OPENAPI_JSON_PATH, ApiDoc::openapi())
}
