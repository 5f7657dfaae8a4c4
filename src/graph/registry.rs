use super::{geojson_loader, GeoGraph, GraphBuildError};
use crate::models::{city_slug, DistanceMode};
use moka::sync::Cache;
use std::path::PathBuf;
use std::sync::Arc;

/// How distances are measured for one city.
#[derive(Debug, Clone)]
pub enum CityGraph {
    Network(Arc<GeoGraph>),
    /// No usable road network; every distance is straight-line haversine
    Fallback { reason: String },
}

impl CityGraph {
    pub fn distance_mode(&self) -> DistanceMode {
        match self {
            CityGraph::Network(_) => DistanceMode::RoadNetwork,
            CityGraph::Fallback { .. } => DistanceMode::Haversine,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, CityGraph::Fallback { .. })
    }

    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            CityGraph::Network(_) => None,
            CityGraph::Fallback { reason } => Some(reason),
        }
    }

    pub fn network(&self) -> Option<&GeoGraph> {
        match self {
            CityGraph::Network(graph) => Some(graph),
            CityGraph::Fallback { .. } => None,
        }
    }
}

/// Loads a city's road network. Implementations may be slow and blocking.
pub trait GraphSource: Send + Sync {
    fn load(&self, city: &str) -> Result<GeoGraph, GraphBuildError>;
}

/// Reads `<dir>/<city-slug>.geojson`, or `<dir>/<city-slug>.osm.pbf` when the
/// `osm` feature is enabled.
#[derive(Debug, Clone)]
pub struct FileGraphSource {
    dir: PathBuf,
}

impl FileGraphSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl GraphSource for FileGraphSource {
    fn load(&self, city: &str) -> Result<GeoGraph, GraphBuildError> {
        let slug = city_slug(city);

        let geojson = self.dir.join(format!("{}.geojson", slug));
        if geojson.is_file() {
            tracing::info!("Loading road network from {}", geojson.display());
            return geojson_loader::load_geojson_file(&geojson);
        }

        #[cfg(feature = "osm")]
        {
            let pbf = self.dir.join(format!("{}.osm.pbf", slug));
            if pbf.is_file() {
                tracing::info!("Loading road network from {}", pbf.display());
                return super::osm::load_pbf_file(&pbf);
            }
        }

        Err(GraphBuildError::NotFound(city.to_string()))
    }
}

/// Source for deployments without road data: every city falls back.
#[derive(Debug, Clone, Default)]
pub struct NoGraphSource;

impl GraphSource for NoGraphSource {
    fn load(&self, city: &str) -> Result<GeoGraph, GraphBuildError> {
        Err(GraphBuildError::NotFound(city.to_string()))
    }
}

/// Process-wide cache of city graphs. Each city is built at most once;
/// a failed build is remembered as a fallback.
#[derive(Clone)]
pub struct GraphRegistry {
    source: Arc<dyn GraphSource>,
    graphs: Cache<String, Arc<CityGraph>>,
}

impl GraphRegistry {
    pub fn new(source: Arc<dyn GraphSource>) -> Self {
        Self {
            source,
            graphs: Cache::builder().max_capacity(64).build(),
        }
    }

    /// Registry that always answers with the haversine fallback.
    pub fn haversine_only() -> Self {
        Self::new(Arc::new(NoGraphSource))
    }

    pub fn get(&self, city: &str) -> Arc<CityGraph> {
        let key = city_slug(city);
        self.graphs.get_with(key, || Arc::new(self.build(city)))
    }

    pub fn cached_cities(&self) -> u64 {
        self.graphs.run_pending_tasks();
        self.graphs.entry_count()
    }

    fn build(&self, city: &str) -> CityGraph {
        match self.source.load(city) {
            Ok(graph) => {
                tracing::info!(
                    city,
                    nodes = graph.node_count(),
                    edges = graph.edge_count(),
                    "Road network ready for {}",
                    city
                );
                CityGraph::Network(Arc::new(graph))
            }
            Err(e) => {
                tracing::warn!(city, "Falling back to haversine distances: {}", e);
                CityGraph::Fallback {
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for GraphRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphRegistry")
            .field("cached_cities", &self.graphs.entry_count())
            .finish()
    }
}
