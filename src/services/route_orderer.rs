//! Visiting order inside one day.
//!
//! Nearest-neighbour construction from the day's best-ranked POI, then an
//! open-path 2-opt pass with the start fixed. When the route is longer than
//! the walk tolerance the lowest-ranked member is dropped and the order is
//! rebuilt from scratch.

use super::allocator::poi_cost;
use crate::config::PlannerConfig;
use crate::constants::TWO_OPT_EPSILON_M;
use crate::graph::DistanceOracle;
use crate::models::{Coordinates, DayBucket, Poi, PoiId, PoiIndex};

/// Distance matrix in kilometers, indexed like the member list.
pub type Matrix = Vec<Vec<f64>>;

/// What ordering did to one bucket beyond reordering it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DayRoute {
    /// Leg from the previous stop, aligned with the bucket's final order
    pub legs_km: Vec<f64>,
    /// Members removed to meet the walk tolerance, lowest rank first
    pub removed: Vec<PoiId>,
    /// Route length straight after nearest-neighbour construction
    pub initial_distance_km: f64,
}

#[derive(Debug, Clone)]
pub struct RouteOrderer {
    two_opt_max_iterations: usize,
    fallback_tolerance_factor: f64,
    missing_price_cost: f64,
}

impl RouteOrderer {
    pub fn new(config: &PlannerConfig) -> Self {
        RouteOrderer {
            two_opt_max_iterations: config.two_opt_max_iterations,
            fallback_tolerance_factor: config.fallback_tolerance_factor,
            missing_price_cost: config.missing_price_cost,
        }
    }

    /// Walk ceiling for a day; widened when distances are straight-line.
    pub fn ceiling_km(&self, walk_tolerance_km: f64, degraded: bool) -> f64 {
        if degraded {
            walk_tolerance_km * self.fallback_tolerance_factor
        } else {
            walk_tolerance_km
        }
    }

    /// Reorder `bucket` in place. Members must arrive in rank order (best
    /// first), as the allocator leaves them.
    pub fn order_bucket(
        &self,
        bucket: &mut DayBucket,
        pois: &PoiIndex<'_>,
        oracle: &DistanceOracle,
        walk_tolerance_km: f64,
    ) -> DayRoute {
        let members: Vec<&Poi> = bucket.poi_ids.iter().filter_map(|id| pois.get(id)).collect();
        let points: Vec<Coordinates> = members.iter().map(|p| p.coordinates).collect();
        let full = oracle.matrix(&points);
        let ceiling = self.ceiling_km(walk_tolerance_km, oracle.is_degraded());

        // Indices into `members`, still in rank order
        let mut kept: Vec<usize> = (0..members.len()).collect();
        let mut removed = Vec::new();
        let mut initial_distance_km;

        let order = loop {
            let sub = submatrix(&full, &kept);
            let ids: Vec<&PoiId> = kept.iter().map(|&i| &members[i].id).collect();

            let route = nearest_neighbour(&sub, &ids);
            initial_distance_km = path_length(&route, &sub);
            let route = two_opt(route, &sub, self.two_opt_max_iterations);
            let length = path_length(&route, &sub);

            if length <= ceiling || kept.len() <= 1 {
                break route.into_iter().map(|i| kept[i]).collect::<Vec<usize>>();
            }

            if let Some(dropped) = kept.pop() {
                tracing::debug!(
                    day = bucket.day_index,
                    length_km = length,
                    ceiling_km = ceiling,
                    "Dropping {} to meet walk tolerance",
                    members[dropped].id
                );
                removed.push(members[dropped].id.clone());
            }
        };

        let mut legs_km = Vec::with_capacity(order.len());
        for (pos, &i) in order.iter().enumerate() {
            legs_km.push(if pos == 0 { 0.0 } else { full[order[pos - 1]][i] });
        }

        bucket.poi_ids = order.iter().map(|&i| members[i].id.clone()).collect();
        bucket.walking_distance_km = legs_km.iter().sum();
        bucket.total_cost = order
            .iter()
            .map(|&i| poi_cost(members[i], self.missing_price_cost))
            .sum();

        if !removed.is_empty() {
            tracing::warn!(
                day = bucket.day_index,
                "Removed {} POIs to keep the walk under {:.2}km",
                removed.len(),
                ceiling
            );
        }

        DayRoute {
            legs_km,
            removed,
            initial_distance_km,
        }
    }
}

fn submatrix(full: &Matrix, keep: &[usize]) -> Matrix {
    keep.iter()
        .map(|&i| keep.iter().map(|&j| full[i][j]).collect())
        .collect()
}

/// Greedy tour from index 0; equidistant candidates resolve to the lowest id.
pub fn nearest_neighbour(matrix: &Matrix, ids: &[&PoiId]) -> Vec<usize> {
    let n = matrix.len();
    if n == 0 {
        return Vec::new();
    }
    let mut route = Vec::with_capacity(n);
    let mut visited = vec![false; n];
    let mut current = 0;
    visited[0] = true;
    route.push(0);

    while route.len() < n {
        let next = (0..n).filter(|&j| !visited[j]).min_by(|&a, &b| {
            matrix[current][a]
                .total_cmp(&matrix[current][b])
                .then_with(|| ids[a].cmp(ids[b]))
        });
        let Some(next) = next else { break };
        visited[next] = true;
        route.push(next);
        current = next;
    }
    route
}

/// Open-path 2-opt with the first stop fixed. Only strictly shorter moves
/// are applied; at most `max_iterations` candidate moves are evaluated.
pub fn two_opt(mut route: Vec<usize>, matrix: &Matrix, max_iterations: usize) -> Vec<usize> {
    let n = route.len();
    if n < 3 {
        return route;
    }
    let epsilon_km = TWO_OPT_EPSILON_M / 1000.0;
    let d = |a: usize, b: usize| matrix[a][b];
    let mut evaluated = 0usize;

    let mut improved = true;
    while improved {
        improved = false;
        for i in 1..n - 1 {
            for j in (i + 1)..n {
                if evaluated >= max_iterations {
                    return route;
                }
                evaluated += 1;

                // Reverse route[i..=j]; the edge after j only exists inside the path
                let before = d(route[i - 1], route[i])
                    + if j + 1 < n { d(route[j], route[j + 1]) } else { 0.0 };
                let after = d(route[i - 1], route[j])
                    + if j + 1 < n { d(route[i], route[j + 1]) } else { 0.0 };

                if after + epsilon_km < before {
                    route[i..=j].reverse();
                    improved = true;
                }
            }
        }
    }
    route
}

pub fn path_length(route: &[usize], matrix: &Matrix) -> f64 {
    route.windows(2).map(|w| matrix[w[0]][w[1]]).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PoiCategory;

    fn poi_at(id: &str, lat: f64, lng: f64) -> Poi {
        Poi::new(id, id, PoiCategory::Attraction, Coordinates::new(lat, lng).unwrap())
    }

    fn bucket_of(pois: &[Poi]) -> DayBucket {
        DayBucket {
            day_index: 0,
            poi_ids: pois.iter().map(|p| p.id.clone()).collect(),
            total_cost: 0.0,
            walking_distance_km: 0.0,
        }
    }

    fn orderer() -> RouteOrderer {
        RouteOrderer::new(&PlannerConfig::default())
    }

    #[test]
    fn test_trivial_buckets() {
        let oracle = DistanceOracle::haversine();
        let pois = vec![poi_at("solo", 10.77, 106.70)];
        let index = PoiIndex::new(&pois);

        let mut empty = DayBucket::new(0);
        let route = orderer().order_bucket(&mut empty, &index, &oracle, 5.0);
        assert!(empty.is_empty());
        assert!(route.legs_km.is_empty());

        let mut single = bucket_of(&pois);
        let route = orderer().order_bucket(&mut single, &index, &oracle, 0.0);
        assert_eq!(single.len(), 1);
        assert_eq!(single.walking_distance_km, 0.0);
        assert_eq!(route.legs_km, vec![0.0]);
    }

    #[test]
    fn test_starts_at_best_ranked_and_walks_nearest_first() {
        // Best-ranked sits between the others
        let pois = vec![
            poi_at("mid", 10.0, 106.02),
            poi_at("east", 10.003, 106.03),
            poi_at("west", 10.0, 106.00),
            poi_at("near-east", 10.0, 106.025),
        ];
        let index = PoiIndex::new(&pois);
        let mut bucket = bucket_of(&pois);
        orderer().order_bucket(&mut bucket, &index, &DistanceOracle::haversine(), 50.0);

        let ids: Vec<&str> = bucket.poi_ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids[0], "mid");
        assert_eq!(ids, vec!["mid", "near-east", "east", "west"]);
    }

    #[test]
    fn test_two_opt_never_lengthens_route() {
        // Zig-zag points where greedy construction crosses itself
        let coords = [
            (10.000, 106.000),
            (10.010, 106.001),
            (10.001, 106.010),
            (10.011, 106.012),
            (10.002, 106.021),
            (10.012, 106.020),
            (10.000, 106.030),
        ];
        let pois: Vec<Poi> = coords
            .iter()
            .enumerate()
            .map(|(i, &(lat, lng))| poi_at(&format!("z{}", i), lat, lng))
            .collect();
        let index = PoiIndex::new(&pois);
        let mut bucket = bucket_of(&pois);
        let route = orderer().order_bucket(&mut bucket, &index, &DistanceOracle::haversine(), 100.0);

        assert!(bucket.walking_distance_km <= route.initial_distance_km + 1e-12);
        assert_eq!(bucket.len(), pois.len());
        assert_eq!(bucket.poi_ids[0].as_str(), "z0");
    }

    #[test]
    fn test_two_opt_untangles_crossing() {
        // 0 -> 2 -> 1 -> 3 on a line is longer than 0 -> 1 -> 2 -> 3
        let matrix: Matrix = (0..4)
            .map(|i: i32| (0..4).map(|j: i32| (i - j).abs() as f64).collect())
            .collect();
        let improved = two_opt(vec![0, 2, 1, 3], &matrix, 1_000);
        assert_eq!(improved, vec![0, 1, 2, 3]);
        assert_eq!(path_length(&improved, &matrix), 3.0);

        // Zero budget leaves the route untouched
        assert_eq!(two_opt(vec![0, 2, 1, 3], &matrix, 0), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_nearest_neighbour_ties_break_by_id() {
        let matrix: Matrix = vec![
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 2.0],
            vec![1.0, 2.0, 0.0],
        ];
        let (a, b, c) = (PoiId::new("a"), PoiId::new("c"), PoiId::new("b"));
        assert_eq!(nearest_neighbour(&matrix, &[&a, &b, &c]), vec![0, 2, 1]);
    }

    #[test]
    fn test_drops_lowest_ranked_until_within_tolerance() {
        let mut pois = vec![
            poi_at("best", 10.0, 106.000),
            poi_at("second", 10.0, 106.005),
            poi_at("far", 10.0, 106.100),
        ];
        pois[2].price = Some(50.0);
        let index = PoiIndex::new(&pois);
        let mut bucket = bucket_of(&pois);
        bucket.total_cost = 50.0;

        let route = orderer().order_bucket(&mut bucket, &index, &DistanceOracle::haversine(), 1.0);
        assert_eq!(route.removed, vec![PoiId::new("far")]);
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket.total_cost, 0.0);
        assert!(bucket.walking_distance_km <= 1.0 * 1.25);
    }

    #[test]
    fn test_degraded_mode_widens_ceiling() {
        let o = orderer();
        assert_eq!(o.ceiling_km(4.0, false), 4.0);
        assert_eq!(o.ceiling_km(4.0, true), 5.0);

        // ~1.1km apart: over a 1.0km tolerance, inside the widened 1.25km
        let pois = vec![poi_at("a", 10.0, 106.0), poi_at("b", 10.01, 106.0)];
        let index = PoiIndex::new(&pois);
        let mut bucket = bucket_of(&pois);
        let route = o.order_bucket(&mut bucket, &index, &DistanceOracle::haversine(), 1.0);
        assert!(route.removed.is_empty());
        assert_eq!(bucket.len(), 2);
    }
}
