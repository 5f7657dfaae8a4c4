use super::{CityGraph, NodeId};
use crate::models::{Coordinates, DistanceKm, DistanceMeters, DistanceMode};
use moka::sync::Cache;
use std::sync::Arc;

const SNAP_CACHE_CAPACITY: u64 = 10_000;
const PATH_CACHE_CAPACITY: u64 = 100_000;

/// Request-scoped distance answers for one city.
///
/// Road distance between two coordinates is the walk to the nearest node of
/// each, plus the shortest path between those nodes. Pairs whose nodes are not
/// connected fall back to haversine individually. Results are memoized by
/// unordered node pair, which keeps `d(a, b) == d(b, a)`.
pub struct DistanceOracle {
    graph: Arc<CityGraph>,
    snaps: Cache<(u64, u64), Option<NodeId>>,
    paths: Cache<(NodeId, NodeId), Option<f64>>,
}

impl DistanceOracle {
    pub fn new(graph: Arc<CityGraph>) -> Self {
        Self {
            graph,
            snaps: Cache::new(SNAP_CACHE_CAPACITY),
            paths: Cache::new(PATH_CACHE_CAPACITY),
        }
    }

    /// Oracle that only measures straight lines.
    pub fn haversine() -> Self {
        Self::new(Arc::new(CityGraph::Fallback {
            reason: "road network disabled".to_string(),
        }))
    }

    pub fn mode(&self) -> DistanceMode {
        self.graph.distance_mode()
    }

    pub fn is_degraded(&self) -> bool {
        self.graph.is_degraded()
    }

    pub fn degraded_reason(&self) -> Option<&str> {
        self.graph.degraded_reason()
    }

    pub fn distance(&self, a: &Coordinates, b: &Coordinates) -> DistanceKm {
        if a == b {
            return DistanceKm::ZERO;
        }
        let straight = DistanceKm(a.distance_to(b));
        let Some(graph) = self.graph.network() else {
            return straight;
        };

        let (Some(na), Some(nb)) = (self.snap(a), self.snap(b)) else {
            return straight;
        };
        let key = if na <= nb { (na, nb) } else { (nb, na) };
        let path_m = self
            .paths
            .get_with(key, || graph.shortest_distance(key.0, key.1).map(|d| d.0));

        match (path_m, graph.node(na), graph.node(nb)) {
            (Some(path_m), Some(node_a), Some(node_b)) => {
                let snap_a = a.distance_meters_to(&node_a.coordinates);
                let snap_b = b.distance_meters_to(&node_b.coordinates);
                DistanceMeters(path_m + (snap_a + snap_b)).to_km()
            }
            _ => {
                tracing::debug!(from = na, to = nb, "No road path, using haversine");
                straight
            }
        }
    }

    /// Symmetric pairwise matrix in kilometers.
    pub fn matrix(&self, points: &[Coordinates]) -> Vec<Vec<f64>> {
        let n = points.len();
        let mut matrix = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = self.distance(&points[i], &points[j]).as_km();
                matrix[i][j] = d;
                matrix[j][i] = d;
            }
        }
        matrix
    }

    fn snap(&self, coord: &Coordinates) -> Option<NodeId> {
        let graph = self.graph.network()?;
        let key = (coord.lat.to_bits(), coord.lng.to_bits());
        self.snaps
            .get_with(key, || graph.nearest_node(coord).map(|n| n.id))
    }
}
