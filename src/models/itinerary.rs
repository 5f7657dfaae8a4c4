use crate::config::RankingWeights;
use crate::constants::MAX_TRIP_DAYS;
use crate::models::{Coordinates, DayForecast, Poi, PoiCategory, PoiId, WeatherCondition};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One day's share of the plan while it moves through the pipeline.
///
/// The allocator fixes the member set; the route orderer may only reorder
/// members or drop them to satisfy the walk tolerance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DayBucket {
    pub day_index: usize,
    /// Members in allocation order until the orderer runs, visiting order afterwards
    pub poi_ids: Vec<PoiId>,
    pub total_cost: f64,
    pub walking_distance_km: f64,
}

impl DayBucket {
    pub fn new(day_index: usize) -> Self {
        DayBucket {
            day_index,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.poi_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poi_ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    /// Shortest paths over the city's road network
    RoadNetwork,
    /// Straight-line fallback
    Haversine,
}

impl fmt::Display for DistanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMode::RoadNetwork => write!(f, "road_network"),
            DistanceMode::Haversine => write!(f, "haversine"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedStop {
    pub order_in_day: u32,
    pub poi_id: PoiId,
    pub name: String,
    pub coordinates: Coordinates,
    pub category: PoiCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    pub tags: Vec<String>,
    pub outdoor: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Walking distance from the previous stop (0 for the first stop)
    pub leg_distance_km: f64,
}

impl PlannedStop {
    pub fn new(poi: &Poi, order_in_day: u32, leg_distance_km: f64) -> Self {
        PlannedStop {
            order_in_day,
            poi_id: poi.id.clone(),
            name: poi.name.clone(),
            coordinates: poi.coordinates,
            category: poi.category,
            price: poi.price,
            rating: poi.rating,
            tags: poi.tags.iter().cloned().collect(),
            outdoor: poi.outdoor,
            address: poi.address.clone(),
            image_url: poi.image_url.clone(),
            leg_distance_km,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherAnnotation {
    pub condition: WeatherCondition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<time::Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<u8>,
    pub summary: String,
    pub advice: String,
}

impl WeatherAnnotation {
    pub fn from_forecast(forecast: Option<&DayForecast>) -> Self {
        match forecast {
            Some(f) => WeatherAnnotation {
                condition: f.condition,
                date: f.date,
                temperature_c: f.temperature_c,
                humidity: f.humidity,
                summary: f.summary(),
                advice: f.condition.advice().to_string(),
            },
            None => WeatherAnnotation {
                condition: WeatherCondition::Unknown,
                date: None,
                temperature_c: None,
                humidity: None,
                summary: "forecast unavailable".to_string(),
                advice: WeatherCondition::Unknown.advice().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayPlan {
    pub day_index: usize,
    pub pois: Vec<PlannedStop>,
    pub total_distance_km: f64,
    pub estimated_walking_minutes: u32,
    pub total_cost: f64,
    pub weather: WeatherAnnotation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanMetadata {
    pub distance_mode: DistanceMode,
    /// True when distances fell back to straight-line haversine
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
    pub weather_available: bool,
    pub candidate_count: usize,
    /// Ranked POIs the allocator could not fit into any day
    pub unallocated_poi_ids: Vec<PoiId>,
    /// POIs removed by route ordering to respect the walk tolerance
    pub walk_limited_poi_ids: Vec<PoiId>,
}

/// Terminal planner output; the contract with the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Itinerary {
    pub city: String,
    pub days: Vec<DayPlan>,
    pub metadata: PlanMetadata,
}

impl Itinerary {
    pub fn total_distance_km(&self) -> f64 {
        self.days.iter().map(|d| d.total_distance_km).sum()
    }

    pub fn scheduled_poi_ids(&self) -> impl Iterator<Item = &PoiId> {
        self.days.iter().flat_map(|d| d.pois.iter().map(|s| &s.poi_id))
    }
}

// Request types for the planning entry point

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanPreferences {
    #[serde(default)]
    pub query_text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_walk_tolerance_km")]
    pub walk_tolerance_km: f64,
}

fn default_walk_tolerance_km() -> f64 {
    5.0
}

impl Default for PlanPreferences {
    fn default() -> Self {
        PlanPreferences {
            query_text: String::new(),
            tags: Vec::new(),
            walk_tolerance_km: default_walk_tolerance_km(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanRequest {
    pub city: String,
    pub days: u32,
    pub budget_per_day: f64,
    #[serde(default)]
    pub preferences: PlanPreferences,
    /// Restrict candidates to one catalog category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<PoiCategory>,
    /// Per-request override of the configured ranking weights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<RankingWeights>,
}

impl PlanRequest {
    pub fn new(city: impl Into<String>, days: u32, budget_per_day: f64) -> Self {
        PlanRequest {
            city: city.into(),
            days,
            budget_per_day,
            preferences: PlanPreferences::default(),
            category: None,
            weights: None,
        }
    }

    pub fn with_preferences(mut self, preferences: PlanPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.city.trim().is_empty() {
            return Err("city must not be empty".to_string());
        }
        if self.days == 0 {
            return Err("days must be greater than 0".to_string());
        }
        if self.days > MAX_TRIP_DAYS {
            return Err(format!("days must be at most {}", MAX_TRIP_DAYS));
        }
        if !self.budget_per_day.is_finite() || self.budget_per_day < 0.0 {
            return Err("budget_per_day must be a non-negative number".to_string());
        }
        let walk = self.preferences.walk_tolerance_km;
        if !walk.is_finite() || walk < 0.0 {
            return Err("walk_tolerance_km must be a non-negative number".to_string());
        }
        if let Some(weights) = &self.weights {
            weights.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_request_validation() {
        let mut req = PlanRequest::new("Ho Chi Minh", 2, 300_000.0);
        assert!(req.validate().is_ok());

        req.days = 0;
        assert!(req.validate().is_err());

        req.days = MAX_TRIP_DAYS;
        assert!(req.validate().is_ok());
        req.days = MAX_TRIP_DAYS + 1;
        assert!(req.validate().is_err());
        req.days = u32::MAX;
        assert!(req.validate().unwrap_err().contains("at most"));

        req.days = 2;
        req.budget_per_day = -1.0;
        assert!(req.validate().is_err());

        req.budget_per_day = 0.0;
        req.preferences.walk_tolerance_km = f64::NAN;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_plan_request_defaults_from_json() {
        let req: PlanRequest = serde_json::from_str(
            r#"{"city":"Hue","days":3,"budget_per_day":500000,
                "weights":{"textWeight":0,"budgetWeight":0,"weatherWeight":0,"tagWeight":0}}"#,
        )
        .unwrap();
        assert_eq!(req.preferences.walk_tolerance_km, 5.0);
        assert!(req.preferences.tags.is_empty());
        assert!(req.validate().unwrap_err().contains("sum to 0"));
    }

    #[test]
    fn test_weather_annotation_without_forecast() {
        let annotation = WeatherAnnotation::from_forecast(None);
        assert_eq!(annotation.condition, WeatherCondition::Unknown);
        assert_eq!(annotation.summary, "forecast unavailable");
    }

    #[test]
    fn test_distance_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&DistanceMode::RoadNetwork).unwrap(),
            "\"road_network\""
        );
        assert_eq!(DistanceMode::Haversine.to_string(), "haversine");
    }
}
