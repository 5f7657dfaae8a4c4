//! Stable application-wide constants.
//!
//! Values here are structural invariants, algorithm coefficients, and default
//! fallbacks for env-var-based configuration. They should rarely change.
//! For ranking and ordering knobs that benefit from per-deployment tuning,
//! see [`PlannerConfig`](crate::config::PlannerConfig) instead.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- Collaborator defaults ---

/// Directory holding `<city-slug>.json` catalog files.
pub const DEFAULT_CATALOG_DIR: &str = "data";
/// Directory holding `<city-slug>.geojson` / `<city-slug>.osm.pbf` road networks.
pub const DEFAULT_GRAPH_DIR: &str = "data/graphs";
/// OpenWeather 5-day / 3-hour forecast endpoint.
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
/// HTTP timeout for catalog and weather requests.
pub const COLLABORATOR_TIMEOUT_SECONDS: u64 = 8;
/// The forecast endpoint never covers more than this many days.
pub const MAX_FORECAST_DAYS: usize = 7;
/// Longest trip a single plan request may ask for.
pub const MAX_TRIP_DAYS: u32 = 30;

// --- Ranking defaults ---
// Default weights sum to 1.0. Text similarity dominates, the other three
// components nudge the ordering.

pub const DEFAULT_TEXT_WEIGHT: f64 = 0.55;
pub const DEFAULT_BUDGET_WEIGHT: f64 = 0.20;
pub const DEFAULT_WEATHER_WEIGHT: f64 = 0.15;
pub const DEFAULT_TAG_WEIGHT: f64 = 0.10;

/// Share of the per-day budget a single POI is expected to consume.
pub const DEFAULT_BUDGET_FRACTION: f64 = 1.0 / 3.0;
/// Budget fit reaches 0 once price exceeds this multiple of the reference fraction.
pub const DEFAULT_BUDGET_DECAY_MULTIPLE: f64 = 3.0;
/// Weather fit for a POI whose indoor/outdoor flag is unfavourable.
pub const DEFAULT_WEATHER_PENALTY: f64 = 0.6;
/// Budget fit used when a POI carries no price estimate.
pub const NEUTRAL_BUDGET_FIT: f64 = 0.5;
/// Tag match used when the request names no preference tags.
pub const NEUTRAL_TAG_MATCH: f64 = 0.5;

// --- Allocation / ordering defaults ---

/// Default cap on POIs per day.
pub const DEFAULT_MAX_POIS_PER_DAY: usize = 6;
/// Upper bound on 2-opt segment evaluations per ordering run.
pub const DEFAULT_TWO_OPT_MAX_ITERATIONS: usize = 10_000;
/// Multiplier applied to the walk-tolerance ceiling when distances are straight-line.
pub const DEFAULT_FALLBACK_TOLERANCE_FACTOR: f64 = 1.25;
/// 2-opt only accepts moves that shorten the route by more than this (meters).
pub const TWO_OPT_EPSILON_M: f64 = 1e-6;

// --- Geography ---

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Average walking speed used to estimate travel time on graph edges.
pub const WALKING_SPEED_MPS: f64 = 1.3;
/// Decimal places used to merge GeoJSON vertices into one graph node (~1cm).
pub const NODE_MERGE_PRECISION: u32 = 7;
