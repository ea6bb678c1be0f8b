//! Route table for the ClawSearch gateway

use crate::handlers::{
    handle_health, handle_images, handle_news, handle_root, handle_search, handle_tech, AppState,
};
use crate::middleware::api_key_middleware;
use axum::{middleware::from_fn_with_state, routing::get, Router};

/// Builds the router
///
/// `/` and `/health` are open, as is `/docs` with the `openapi` feature.
/// The search routes require an accepted `x-api-key` whenever the
/// allow-list is non-empty.
pub fn create_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/search", get(handle_search))
        .route("/news", get(handle_news))
        .route("/tech", get(handle_tech))
        .route("/images", get(handle_images))
        .route_layer(from_fn_with_state(
            state.api_keys.clone(),
            api_key_middleware,
        ));

    let router = Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .merge(protected);

    #[cfg(feature = "openapi")]
    let router = router.merge(crate::openapi::docs_router());

    router.with_state(state)
}
