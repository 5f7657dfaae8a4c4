use super::allocator::DayAllocator;
use super::catalog::CatalogSource;
use super::ranker::{PoiRanker, RankingContext};
use super::route_orderer::{DayRoute, RouteOrderer};
use super::weather::WeatherSource;
use crate::config::PlannerConfig;
use crate::constants::WALKING_SPEED_MPS;
use crate::error::{AppError, Result};
use crate::graph::{DistanceOracle, GraphRegistry};
use crate::models::{
    DayBucket, DayPlan, Itinerary, PlanMetadata, PlanRequest, PlannedStop, Poi, PoiIndex,
    WeatherAnnotation, WeatherContext,
};
use rayon::prelude::*;
use std::sync::Arc;

/// Plan orchestrator: fetches collaborator data, then runs
/// ranking → allocation → per-day ordering.
pub struct Planner {
    catalog: Arc<dyn CatalogSource>,
    weather: Arc<dyn WeatherSource>,
    graphs: GraphRegistry,
    config: PlannerConfig,
}

impl Planner {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        weather: Arc<dyn WeatherSource>,
        graphs: GraphRegistry,
        config: PlannerConfig,
    ) -> Self {
        Planner {
            catalog,
            weather,
            graphs,
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn catalog_backend(&self) -> &'static str {
        self.catalog.backend_name()
    }

    pub fn weather_backend(&self) -> &'static str {
        self.weather.backend_name()
    }

    pub fn cached_graphs(&self) -> u64 {
        self.graphs.cached_cities()
    }

    /// Build an itinerary for one request.
    ///
    /// Fails with `Config` before any collaborator call when the request or
    /// the effective weights are invalid, and with `NoData` when the city has
    /// no candidates. Weather and road-network failures degrade the plan and
    /// are reported in its metadata.
    pub async fn generate_plan(&self, request: &PlanRequest) -> Result<Itinerary> {
        request.validate().map_err(AppError::Config)?;
        let config = self.effective_config(request)?;

        tracing::info!(
            city = %request.city,
            days = request.days,
            budget_per_day = request.budget_per_day,
            "Generating plan for {}",
            request.city
        );

        let candidates = match self
            .catalog
            .load_candidates(&request.city, request.category)
            .await
        {
            Ok(pois) => pois,
            Err(e) => {
                tracing::warn!(city = %request.city, "Catalog lookup failed: {}", e);
                return Err(AppError::NoData(format!(
                    "no candidate POIs available for {}",
                    request.city
                )));
            }
        };
        if candidates.is_empty() {
            return Err(AppError::NoData(format!(
                "no candidate POIs found for {}",
                request.city
            )));
        }

        let (weather, weather_available) = match self
            .weather
            .fetch_weather(&request.city, request.days as usize)
            .await
        {
            Ok(ctx) => {
                let available = !ctx.is_unknown();
                (ctx, available)
            }
            Err(e) => {
                tracing::warn!(city = %request.city, "Weather unavailable, planning without forecast: {}", e);
                (WeatherContext::unknown(), false)
            }
        };

        let graphs = self.graphs.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || {
            let oracle = DistanceOracle::new(graphs.get(&request.city));
            plan_itinerary(
                &config,
                &request,
                &candidates,
                &weather,
                weather_available,
                &oracle,
            )
        })
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
    }

    /// Planner configuration with the request's weight override applied.
    fn effective_config(&self, request: &PlanRequest) -> Result<PlannerConfig> {
        let config = match request.weights {
            Some(weights) => self.config.clone().with_weights(weights),
            None => self.config.clone(),
        };
        config.validate().map_err(AppError::Config)?;
        Ok(config)
    }
}

/// The synchronous planning pipeline over already-fetched inputs.
///
/// Deterministic: identical inputs always produce an identical itinerary.
pub fn plan_itinerary(
    config: &PlannerConfig,
    request: &PlanRequest,
    candidates: &[Poi],
    weather: &WeatherContext,
    weather_available: bool,
    oracle: &DistanceOracle,
) -> Result<Itinerary> {
    if candidates.is_empty() {
        return Err(AppError::NoData(format!(
            "no candidate POIs found for {}",
            request.city
        )));
    }

    let days = request.days as usize;
    let ranker = PoiRanker::new(config)?;
    let ranked = ranker.rank(
        candidates,
        &RankingContext {
            query_text: &request.preferences.query_text,
            tags: &request.preferences.tags,
            budget_per_day: request.budget_per_day,
            days,
            weather,
        },
    );

    let index = PoiIndex::new(candidates);
    let allocation =
        DayAllocator::new(config).allocate(&ranked, &index, days, request.budget_per_day);

    let orderer = RouteOrderer::new(config);
    let walk_tolerance_km = request.preferences.walk_tolerance_km;
    let mut buckets = allocation.buckets;
    let routes: Vec<DayRoute> = buckets
        .par_iter_mut()
        .map(|bucket| orderer.order_bucket(bucket, &index, oracle, walk_tolerance_km))
        .collect();

    let walk_limited_poi_ids = routes.iter().flat_map(|r| r.removed.iter().cloned()).collect();
    let day_plans: Vec<DayPlan> = buckets
        .iter()
        .zip(&routes)
        .map(|(bucket, route)| build_day_plan(bucket, route, &index, weather))
        .collect();

    tracing::debug!(
        ranked = ranked.len(),
        unallocated = allocation.unallocated.len(),
        mode = %oracle.mode(),
        "Planned {} days for {}",
        days,
        request.city
    );

    Ok(Itinerary {
        city: request.city.clone(),
        days: day_plans,
        metadata: PlanMetadata {
            distance_mode: oracle.mode(),
            degraded: oracle.is_degraded(),
            degraded_reason: oracle.degraded_reason().map(str::to_string),
            weather_available,
            candidate_count: candidates.len(),
            unallocated_poi_ids: allocation.unallocated,
            walk_limited_poi_ids,
        },
    })
}

fn build_day_plan(
    bucket: &DayBucket,
    route: &DayRoute,
    index: &PoiIndex<'_>,
    weather: &WeatherContext,
) -> DayPlan {
    let pois: Vec<PlannedStop> = bucket
        .poi_ids
        .iter()
        .zip(&route.legs_km)
        .filter_map(|(id, &leg)| index.get(id).map(|poi| (poi, leg)))
        .enumerate()
        .map(|(i, (poi, leg))| PlannedStop::new(poi, i as u32 + 1, leg))
        .collect();

    DayPlan {
        day_index: bucket.day_index,
        pois,
        total_distance_km: bucket.walking_distance_km,
        estimated_walking_minutes: walking_minutes(bucket.walking_distance_km),
        total_cost: bucket.total_cost,
        weather: WeatherAnnotation::from_forecast(weather.day(bucket.day_index)),
    }
}

fn walking_minutes(distance_km: f64) -> u32 {
    (distance_km * 1000.0 / WALKING_SPEED_MPS / 60.0).round() as u32
}
