pub mod city;
pub mod coordinates;
pub mod distance;
pub mod itinerary;
pub mod poi;
pub mod ranking;
pub mod weather;

pub use city::city_slug;
pub use coordinates::Coordinates;
pub use distance::{DistanceKm, DistanceMeters};
pub use itinerary::{
    DayBucket, DayPlan, DistanceMode, Itinerary, PlanMetadata, PlanPreferences, PlanRequest,
    PlannedStop, WeatherAnnotation,
};
pub use poi::{Poi, PoiCategory, PoiId, PoiIndex, RawPoiRecord};
pub use ranking::{RankedCandidate, ScoreBreakdown};
pub use weather::{DayForecast, WeatherCondition, WeatherContext};
