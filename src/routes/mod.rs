pub mod debug;
pub mod plan;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/plans", post(plan::create_plan))
        .route("/debug/health", get(debug::health_check))
        .with_state(state)
}

/// Full application: API under `/api/v1` with CORS and request tracing.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
