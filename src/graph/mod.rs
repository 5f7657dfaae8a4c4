//! In-memory walking network for one bounded area.
//!
//! A [`GeoGraph`] is built once per city through [`GraphBuilder`] and is
//! read-only afterwards; planning requests share it behind an `Arc`. The
//! [`registry`] decides per city whether the road network or the haversine
//! fallback answers distance queries, and [`oracle`] caches those answers for
//! the lifetime of one request.

pub mod geojson_loader;
pub mod oracle;
#[cfg(feature = "osm")]
pub mod osm;
pub mod registry;
mod shortest_path;

use crate::constants::WALKING_SPEED_MPS;
use crate::models::{Coordinates, DistanceMeters};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub use oracle::DistanceOracle;
pub use registry::{CityGraph, FileGraphSource, GraphRegistry, GraphSource, NoGraphSource};

pub type NodeId = u64;

#[derive(Error, Debug)]
pub enum GraphBuildError {
    #[error("no road network available for {0}")]
    NotFound(String),

    #[error("failed to read road network: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse road network: {0}")]
    Parse(String),

    #[error("road network has no usable edges")]
    EmptyNetwork,

    #[error("edge {from} -> {to} references an unknown node")]
    UnknownNode { from: NodeId, to: NodeId },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoNode {
    pub id: NodeId,
    pub coordinates: Coordinates,
}

/// Undirected road segment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoEdge {
    pub a: NodeId,
    pub b: NodeId,
    pub distance_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_time_s: Option<f64>,
}

/// Adjacency entry: neighbour index plus edge length in meters.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Link {
    pub to: usize,
    pub distance_m: f64,
}

#[derive(Debug, Clone)]
pub struct GeoGraph {
    nodes: Vec<GeoNode>,
    edges: Vec<GeoEdge>,
    adjacency: Vec<Vec<Link>>,
    index_by_id: HashMap<NodeId, usize>,
}

impl GeoGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&GeoNode> {
        self.index_by_id.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn edges(&self) -> &[GeoEdge] {
        &self.edges
    }

    /// Snap a coordinate to the closest graph node. Equidistant nodes resolve
    /// to the lowest node id.
    pub fn nearest_node(&self, coord: &Coordinates) -> Option<&GeoNode> {
        self.nodes.iter().min_by(|x, y| {
            coord
                .distance_to(&x.coordinates)
                .total_cmp(&coord.distance_to(&y.coordinates))
                .then_with(|| x.id.cmp(&y.id))
        })
    }

    /// Shortest-path length between two nodes, `None` if either node is
    /// unknown or they are not connected.
    pub fn shortest_distance(&self, from: NodeId, to: NodeId) -> Option<DistanceMeters> {
        self.shortest_path(from, to).map(|(_, length)| length)
    }

    /// Shortest path as a node-id sequence plus its length.
    pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Option<(Vec<NodeId>, DistanceMeters)> {
        let source = *self.index_by_id.get(&from)?;
        let target = *self.index_by_id.get(&to)?;
        let (path, length) = shortest_path::dijkstra(self, source, target)?;
        Some((
            path.into_iter().map(|i| self.nodes[i].id).collect(),
            DistanceMeters(length),
        ))
    }

    pub(crate) fn node_at(&self, index: usize) -> &GeoNode {
        &self.nodes[index]
    }

    pub(crate) fn neighbours(&self, index: usize) -> &[Link] {
        &self.adjacency[index]
    }
}

/// Incrementally assembles a [`GeoGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<GeoNode>,
    edges: Vec<GeoEdge>,
    index_by_id: HashMap<NodeId, usize>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node; re-adding an existing id keeps the first coordinates.
    pub fn add_node(&mut self, id: NodeId, coordinates: Coordinates) -> &mut Self {
        if !self.index_by_id.contains_key(&id) {
            self.index_by_id.insert(id, self.nodes.len());
            self.nodes.push(GeoNode { id, coordinates });
        }
        self
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.index_by_id.contains_key(&id)
    }

    /// Add an undirected edge whose length is the straight line between its nodes.
    pub fn add_straight_edge(&mut self, a: NodeId, b: NodeId) -> Result<&mut Self, GraphBuildError> {
        let (ia, ib) = self.endpoints(a, b)?;
        let distance_m = self.nodes[ia]
            .coordinates
            .distance_meters_to(&self.nodes[ib].coordinates);
        self.add_edge(a, b, distance_m, Some(distance_m / WALKING_SPEED_MPS))
    }

    /// Add an undirected edge. Self-loops and non-finite or negative lengths
    /// are ignored.
    pub fn add_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        distance_m: f64,
        travel_time_s: Option<f64>,
    ) -> Result<&mut Self, GraphBuildError> {
        self.endpoints(a, b)?;
        if a == b || !distance_m.is_finite() || distance_m < 0.0 {
            tracing::trace!(a, b, distance_m, "Ignoring degenerate edge");
            return Ok(self);
        }
        self.edges.push(GeoEdge {
            a,
            b,
            distance_m,
            travel_time_s,
        });
        Ok(self)
    }

    fn endpoints(&self, a: NodeId, b: NodeId) -> Result<(usize, usize), GraphBuildError> {
        match (self.index_by_id.get(&a), self.index_by_id.get(&b)) {
            (Some(&ia), Some(&ib)) => Ok((ia, ib)),
            _ => Err(GraphBuildError::UnknownNode { from: a, to: b }),
        }
    }

    /// Freeze the graph. Nodes without any edge are dropped so snapping never
    /// lands on an isolated point.
    pub fn build(self) -> Result<GeoGraph, GraphBuildError> {
        if self.edges.is_empty() {
            return Err(GraphBuildError::EmptyNetwork);
        }

        let mut used = vec![false; self.nodes.len()];
        for edge in &self.edges {
            used[self.index_by_id[&edge.a]] = true;
            used[self.index_by_id[&edge.b]] = true;
        }

        let nodes: Vec<GeoNode> = self
            .nodes
            .into_iter()
            .zip(used)
            .filter_map(|(node, keep)| keep.then_some(node))
            .collect();
        let index_by_id: HashMap<NodeId, usize> =
            nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for edge in &self.edges {
            let ia = index_by_id[&edge.a];
            let ib = index_by_id[&edge.b];
            adjacency[ia].push(Link {
                to: ib,
                distance_m: edge.distance_m,
            });
            adjacency[ib].push(Link {
                to: ia,
                distance_m: edge.distance_m,
            });
        }

        tracing::debug!(
            nodes = nodes.len(),
            edges = self.edges.len(),
            "Built road graph with {} nodes and {} edges",
            nodes.len(),
            self.edges.len()
        );

        Ok(GeoGraph {
            nodes,
            edges: self.edges,
            adjacency,
            index_by_id,
        })
    }
}
