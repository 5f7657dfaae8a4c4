use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tripplanner::config::PlannerConfig;
use tripplanner::error::{AppError, Result};
use tripplanner::graph::{GeoGraph, GraphBuildError, GraphBuilder, GraphRegistry, GraphSource};
use tripplanner::models::{Coordinates, Poi, PoiCategory, WeatherContext};
use tripplanner::services::{CatalogSource, InMemoryCatalog, Planner, WeatherSource};

pub const CITY: &str = "Ho Chi Minh";

/// Create a test POI
#[allow(dead_code)]
pub fn create_test_poi(id: &str, category: PoiCategory, lat: f64, lng: f64) -> Poi {
    Poi::new(
        id,
        format!("Test POI {}", id),
        category,
        Coordinates::new(lat, lng).unwrap(),
    )
}

/// Ten indoor POIs priced 100 000 along one north-south street, 111m apart.
/// With no query they tie on score and rank by id: p00 first, p09 last.
#[allow(dead_code)]
pub fn street_pois() -> Vec<Poi> {
    (0..10)
        .map(|i| {
            let lat = 10.770 + 0.001 * i as f64;
            create_test_poi(&format!("p{:02}", i), PoiCategory::Food, lat, 106.70)
                .with_price(100_000.0)
        })
        .collect()
}

/// A mixed catalog with text, tags and prices for less uniform plans.
#[allow(dead_code)]
pub fn saigon_pois() -> Vec<Poi> {
    vec![
        create_test_poi("ben-thanh", PoiCategory::Shopping, 10.7725, 106.6980)
            .with_description("central market with street food stalls and souvenirs")
            .with_tags(["market", "street food"])
            .with_price(80_000.0),
        create_test_poi("pho-hoa", PoiCategory::Food, 10.7918, 106.6869)
            .with_description("famous beef pho noodle soup")
            .with_tags(["pho", "noodle"])
            .with_price(70_000.0),
        create_test_poi("war-museum", PoiCategory::Attraction, 10.7795, 106.6921)
            .with_description("history museum")
            .with_outdoor(false)
            .with_price(40_000.0),
        create_test_poi("tao-dan", PoiCategory::Attraction, 10.7745, 106.6920)
            .with_description("shady park with bird cafe")
            .with_tags(["park"]),
        create_test_poi("cong-caphe", PoiCategory::Cafe, 10.7769, 106.7031)
            .with_description("coconut coffee in a retro setting")
            .with_tags(["coffee"])
            .with_price(55_000.0),
        create_test_poi("bui-vien", PoiCategory::Entertainment, 10.7673, 106.6932)
            .with_description("walking street nightlife")
            .with_price(150_000.0),
        create_test_poi("saigon-square", PoiCategory::Shopping, 10.7736, 106.7006)
            .with_description("bargain clothes market")
            .with_price(200_000.0),
        create_test_poi("banh-mi", PoiCategory::Food, 10.7712, 106.6927)
            .with_description("banh mi sandwich street food")
            .with_tags(["street food"])
            .with_price(35_000.0),
    ]
}

/// Catalog that counts lookups, optionally failing every one.
#[allow(dead_code)]
pub struct CountingCatalog {
    inner: InMemoryCatalog,
    fail: bool,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl CountingCatalog {
    pub fn new(inner: InMemoryCatalog) -> Self {
        CountingCatalog {
            inner,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        CountingCatalog {
            inner: InMemoryCatalog::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for CountingCatalog {
    async fn load_candidates(&self, city: &str, category: Option<PoiCategory>) -> Result<Vec<Poi>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Catalog("connection refused".to_string()));
        }
        self.inner.load_candidates(city, category).await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

/// Weather source returning a fixed context, or failing when none is set.
#[allow(dead_code)]
pub struct FixedWeather(pub Option<WeatherContext>);

#[async_trait]
impl WeatherSource for FixedWeather {
    async fn fetch_weather(&self, _city: &str, _days: usize) -> Result<WeatherContext> {
        self.0
            .clone()
            .ok_or_else(|| AppError::Weather("HTTP 401: invalid api key".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "fixed"
    }
}

/// Road network for the street in [`street_pois`]: one node every 0.001° of
/// latitude, linked south to north.
#[allow(dead_code)]
pub struct StreetGraph;

impl GraphSource for StreetGraph {
    fn load(&self, _city: &str) -> std::result::Result<GeoGraph, GraphBuildError> {
        let mut builder = GraphBuilder::new();
        for i in 0..=12u64 {
            let coord = Coordinates::new(10.769 + 0.001 * i as f64, 106.70)
                .map_err(GraphBuildError::Parse)?;
            builder.add_node(i, coord);
        }
        for i in 0..12u64 {
            builder.add_straight_edge(i, i + 1)?;
        }
        builder.build()
    }
}

#[allow(dead_code)]
pub fn planner_with(
    catalog: Arc<dyn CatalogSource>,
    weather: Arc<dyn WeatherSource>,
    graphs: GraphRegistry,
) -> Planner {
    Planner::new(catalog, weather, graphs, PlannerConfig::default())
}

/// Planner over `pois` for [`CITY`] with no forecast and haversine distances.
#[allow(dead_code)]
pub fn simple_planner(pois: Vec<Poi>) -> Planner {
    planner_with(
        Arc::new(InMemoryCatalog::new().with_city(CITY, pois)),
        Arc::new(FixedWeather(None)),
        GraphRegistry::haversine_only(),
    )
}
