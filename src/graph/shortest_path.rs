use super::GeoGraph;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Queue entry ordered by tentative distance, then node id, so equal-length
/// frontiers always settle in the same order.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    distance_m: f64,
    node_id: u64,
    index: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_m
            .total_cmp(&other.distance_m)
            .then_with(|| self.node_id.cmp(&other.node_id))
    }
}

/// Single-pair Dijkstra over node indices. Stops as soon as the target is
/// settled. Returns the index path and its length in meters.
pub(super) fn dijkstra(graph: &GeoGraph, source: usize, target: usize) -> Option<(Vec<usize>, f64)> {
    if source == target {
        return Some((vec![source], 0.0));
    }

    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut settled = vec![false; n];

    dist[source] = 0.0;
    let mut pq = BinaryHeap::new();
    pq.push(Reverse(Frontier {
        distance_m: 0.0,
        node_id: graph.node_at(source).id,
        index: source,
    }));

    while let Some(Reverse(Frontier {
        distance_m, index, ..
    })) = pq.pop()
    {
        if settled[index] {
            continue; // Stale entry
        }
        settled[index] = true;

        if index == target {
            let mut path = vec![target];
            let mut cursor = target;
            while let Some(p) = prev[cursor] {
                path.push(p);
                cursor = p;
            }
            path.reverse();
            return Some((path, distance_m));
        }

        for link in graph.neighbours(index) {
            if settled[link.to] {
                continue;
            }
            let candidate = distance_m + link.distance_m;
            if candidate < dist[link.to] {
                dist[link.to] = candidate;
                prev[link.to] = Some(index);
                pq.push(Reverse(Frontier {
                    distance_m: candidate,
                    node_id: graph.node_at(link.to).id,
                    index: link.to,
                }));
            }
        }
    }

    None
}
