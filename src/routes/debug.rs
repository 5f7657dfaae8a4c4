use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /debug/health - Report configured collaborators
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let planner = &state.planner;
    Json(json!({
        "status": "ok",
        "checks": {
            "catalog": planner.catalog_backend(),
            "weather": planner.weather_backend(),
            "cached_graphs": planner.cached_graphs(),
        }
    }))
}
