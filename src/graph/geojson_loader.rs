//! Build a [`GeoGraph`] from GeoJSON LineString / MultiLineString features.
//!
//! Consecutive vertices of a line become an edge weighted by their haversine
//! length. Vertices from different features that coincide at
//! [`NODE_MERGE_PRECISION`] decimals are merged into one node, which is how
//! separate ways join into a network.

use super::{GeoGraph, GraphBuildError, GraphBuilder, NodeId};
use crate::constants::NODE_MERGE_PRECISION;
use crate::models::Coordinates;
use geojson::{GeoJson, Geometry, Value};
use std::collections::HashMap;
use std::path::Path;

pub fn load_geojson_file(path: &Path) -> Result<GeoGraph, GraphBuildError> {
    let raw = std::fs::read_to_string(path)?;
    parse_geojson(&raw)
}

pub fn parse_geojson(raw: &str) -> Result<GeoGraph, GraphBuildError> {
    let geojson: GeoJson = raw
        .parse()
        .map_err(|e: geojson::Error| GraphBuildError::Parse(e.to_string()))?;

    let mut loader = LineLoader::default();
    match geojson {
        GeoJson::FeatureCollection(collection) => {
            for feature in collection.features {
                if let Some(geometry) = feature.geometry {
                    loader.add_geometry(&geometry)?;
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(geometry) = feature.geometry {
                loader.add_geometry(&geometry)?;
            }
        }
        GeoJson::Geometry(geometry) => loader.add_geometry(&geometry)?,
    }

    if loader.skipped_vertices > 0 {
        tracing::warn!(
            "Skipped {} invalid vertices while loading road network",
            loader.skipped_vertices
        );
    }
    loader.builder.build()
}

#[derive(Default)]
struct LineLoader {
    builder: GraphBuilder,
    ids: HashMap<(i64, i64), NodeId>,
    skipped_vertices: usize,
}

impl LineLoader {
    fn add_geometry(&mut self, geometry: &Geometry) -> Result<(), GraphBuildError> {
        match &geometry.value {
            Value::LineString(line) => self.add_line(line),
            Value::MultiLineString(lines) => {
                for line in lines {
                    self.add_line(line)?;
                }
                Ok(())
            }
            Value::GeometryCollection(children) => {
                for child in children {
                    self.add_geometry(child)?;
                }
                Ok(())
            }
            // Points and polygons carry no walkable segments
            _ => Ok(()),
        }
    }

    fn add_line(&mut self, positions: &[Vec<f64>]) -> Result<(), GraphBuildError> {
        let mut previous: Option<NodeId> = None;
        for position in positions {
            let Some(id) = self.node_for(position) else {
                // A broken vertex splits the line rather than bridging the gap
                previous = None;
                continue;
            };
            if let Some(prev) = previous {
                self.builder.add_straight_edge(prev, id)?;
            }
            previous = Some(id);
        }
        Ok(())
    }

    fn node_for(&mut self, position: &[f64]) -> Option<NodeId> {
        // GeoJSON positions are [longitude, latitude]
        let (lng, lat) = match position {
            [lng, lat, ..] => (*lng, *lat),
            _ => {
                self.skipped_vertices += 1;
                return None;
            }
        };
        let coordinates = match Coordinates::new(lat, lng) {
            Ok(c) => c,
            Err(e) => {
                self.skipped_vertices += 1;
                tracing::debug!("Skipping vertex: {}", e);
                return None;
            }
        };

        let key = coordinates.grid_key(NODE_MERGE_PRECISION);
        let next_id = self.ids.len() as NodeId;
        let id = *self.ids.entry(key).or_insert(next_id);
        self.builder.add_node(id, coordinates);
        Some(id)
    }
}
