//! Router assembly

use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the application router, optionally serving a frontend directory
pub fn build_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    // CORS configuration for browser beacons
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/rum", post(handlers::ingest_rum))
        .route("/rum-data", get(handlers::rum_data))
        .route("/rum-stream", get(handlers::rum_stream))
        .route("/analyze", get(handlers::analyze));

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
