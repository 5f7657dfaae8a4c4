//! Build a [`GeoGraph`] from an OpenStreetMap PBF extract.
//!
//! Only ways a pedestrian may use are kept. Node ids are the OSM node ids.

use super::{GeoGraph, GraphBuildError, GraphBuilder};
use crate::models::Coordinates;
use osmpbf::{Element, ElementReader};
use std::collections::HashMap;
use std::path::Path;

/// Highway values never walked on.
const EXCLUDED_HIGHWAYS: &[&str] = &[
    "motorway",
    "motorway_link",
    "trunk",
    "trunk_link",
    "construction",
    "proposed",
    "raceway",
    "bus_guideway",
];

/// True when a way with these tags can be walked.
pub fn is_walkable(tags: &HashMap<&str, &str>) -> bool {
    let Some(highway) = tags.get("highway") else {
        return false;
    };
    if EXCLUDED_HIGHWAYS.contains(highway) {
        return false;
    }
    !matches!(tags.get("foot"), Some(&"no") | Some(&"private"))
        && tags.get("access") != Some(&"private")
}

pub fn load_pbf_file(path: &Path) -> Result<GeoGraph, GraphBuildError> {
    let reader =
        ElementReader::from_path(path).map_err(|e| GraphBuildError::Parse(e.to_string()))?;

    // Node coordinates (id -> (lat, lon))
    let mut node_coords: HashMap<i64, (f64, f64)> = HashMap::new();
    let mut ways: Vec<Vec<i64>> = Vec::new();

    reader
        .for_each(|element| match element {
            Element::Node(node) => {
                node_coords.insert(node.id(), (node.lat(), node.lon()));
            }
            Element::DenseNode(node) => {
                node_coords.insert(node.id(), (node.lat(), node.lon()));
            }
            Element::Way(way) => {
                let tags: HashMap<&str, &str> = way.tags().collect();
                if is_walkable(&tags) {
                    ways.push(way.refs().collect());
                }
            }
            Element::Relation(_) => {}
        })
        .map_err(|e| GraphBuildError::Parse(e.to_string()))?;

    tracing::info!(
        ways = ways.len(),
        nodes = node_coords.len(),
        "Scanned PBF {}",
        path.display()
    );

    let mut builder = GraphBuilder::new();
    for refs in ways {
        let mut previous: Option<u64> = None;
        for node_ref in refs {
            let resolved = node_coords
                .get(&node_ref)
                .and_then(|&(lat, lon)| Coordinates::new(lat, lon).ok());
            let Some(coordinates) = resolved else {
                previous = None;
                continue;
            };
            let id = node_ref as u64;
            builder.add_node(id, coordinates);
            if let Some(prev) = previous {
                builder.add_straight_edge(prev, id)?;
            }
            previous = Some(id);
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walkable_highways() {
        let footway = HashMap::from([("highway", "footway")]);
        assert!(is_walkable(&footway));

        let motorway = HashMap::from([("highway", "motorway")]);
        assert!(!is_walkable(&motorway));

        let no_foot = HashMap::from([("highway", "residential"), ("foot", "no")]);
        assert!(!is_walkable(&no_foot));

        let building = HashMap::from([("building", "yes")]);
        assert!(!is_walkable(&building));
    }
}
