use crate::error::{AppError, Result};
use crate::models::{Itinerary, PlanRequest};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use std::sync::Arc;

/// POST /plans
/// Build a multi-day itinerary for a city
pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Json<Itinerary>> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    tracing::info!(
        city = %request.city,
        days = request.days,
        walk_tolerance_km = request.preferences.walk_tolerance_km,
        "Plan request: {} for {} days, budget {:.0}/day",
        request.city, request.days, request.budget_per_day
    );

    let itinerary = state.planner.generate_plan(&request).await?;

    tracing::info!(
        city = %itinerary.city,
        stops = itinerary.scheduled_poi_ids().count(),
        degraded = itinerary.metadata.degraded,
        "Plan ready: {:.2}km total walking",
        itinerary.total_distance_km()
    );

    Ok(Json(itinerary))
}
