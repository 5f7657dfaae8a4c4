pub mod allocator;
pub mod catalog;
pub mod planner;
pub mod ranker;
pub mod route_orderer;
pub mod weather;

pub use allocator::{Allocation, DayAllocator};
pub use catalog::{CatalogSource, HttpCatalog, InMemoryCatalog, JsonFileCatalog};
pub use planner::{plan_itinerary, Planner};
pub use ranker::{PoiRanker, RankingContext};
pub use route_orderer::{DayRoute, RouteOrderer};
pub use weather::{NoWeather, OpenWeatherClient, WeatherSource};
