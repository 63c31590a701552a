//! Route definitions and router construction.

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers;
use crate::state::AppState;

/// Build the complete application router.
///
/// Everything lives under `/api/v1`; anything else answers with a JSON 404.
pub fn create_router(ctx: AppState) -> Router {
    let api = Router::new()
        .route("/", get(handlers::status))
        .route("/audiostream", get(handlers::audiostream))
        .route("/audiofile", get(handlers::audiofile));

    Router::new()
        .nest("/api/v1", api)
        .fallback(handlers::not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(ctx)
}
