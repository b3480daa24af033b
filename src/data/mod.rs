//! Geographic reference data: the world-countries and US-states boundary
//! sets, fetched once per session as TopoJSON and flattened into
//! [`BoundaryShape`]s.

pub mod topology;

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use geojson::feature::Id;
use geojson::{Feature, GeoJson, Geometry, Value};
use reqwest::blocking::Client;

use topology::Topology;

/// A ring of (lon, lat) coordinates
pub type Ring = Vec<(f64, f64)>;

/// One country or state outline in geographic coordinates.
///
/// `rings` holds every ring of every polygon, holes included; fills and
/// hit-testing use the even-odd rule across all of them.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryShape {
    /// Feature id from the dataset (ISO numeric for countries, FIPS for states)
    pub id: String,
    /// `properties.name` from the dataset, or the id when absent
    pub name: String,
    pub rings: Vec<Ring>,
}

/// The two boundary collections
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dataset {
    World,
    UsStates,
}

impl Dataset {
    /// Object inside the topology that holds the polygons
    pub fn object(self) -> &'static str {
        match self {
            Dataset::World => "countries",
            Dataset::UsStates => "states",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dataset::World => "world map",
            Dataset::UsStates => "US map",
        }
    }
}

/// Where to read a dataset from: an http(s) URL or a local file path
#[derive(Clone, Debug)]
pub struct ReferenceSource {
    pub dataset: Dataset,
    pub location: String,
}

/// Fetches and decodes boundary datasets.
pub struct ReferenceLoader {
    http: Client,
}

impl ReferenceLoader {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("geo-explorer/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("building HTTP client for reference data")?;
        Ok(Self { http })
    }

    /// Load one dataset into boundary shapes
    pub fn load(&self, source: &ReferenceSource) -> Result<Vec<BoundaryShape>> {
        let mut bytes = self.read(&source.location)?;
        let topology = Topology::parse(&mut bytes)
            .with_context(|| format!("decoding {}", source.location))?;
        let collection = topology.feature_collection(source.dataset.object())?;

        let shapes = shapes_from_geojson(&GeoJson::FeatureCollection(collection));
        tracing::info!(
            dataset = source.dataset.label(),
            location = %source.location,
            shapes = shapes.len(),
            "loaded boundary shapes"
        );
        Ok(shapes)
    }

    fn read(&self, location: &str) -> Result<Vec<u8>> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let response = self
                .http
                .get(location)
                .send()
                .with_context(|| format!("fetching {location}"))?
                .error_for_status()
                .with_context(|| format!("fetching {location}"))?;
            let bytes = response
                .bytes()
                .with_context(|| format!("reading body of {location}"))?;
            Ok(bytes.to_vec())
        } else {
            let path = Path::new(location);
            fs::read(path).with_context(|| format!("reading {}", path.display()))
        }
    }
}

/// Flatten GeoJSON into boundary shapes, one per polygonal feature
pub fn shapes_from_geojson(geojson: &GeoJson) -> Vec<BoundaryShape> {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.iter().filter_map(shape_from_feature).collect(),
        GeoJson::Feature(f) => shape_from_feature(f).into_iter().collect(),
        GeoJson::Geometry(geometry) => {
            let mut rings = Vec::new();
            collect_rings(geometry, &mut rings);
            if rings.is_empty() {
                Vec::new()
            } else {
                vec![BoundaryShape {
                    id: String::new(),
                    name: String::new(),
                    rings,
                }]
            }
        }
    }
}

fn shape_from_feature(feature: &Feature) -> Option<BoundaryShape> {
    let geometry = feature.geometry.as_ref()?;

    let mut rings = Vec::new();
    collect_rings(geometry, &mut rings);
    if rings.is_empty() {
        return None;
    }

    let id = match &feature.id {
        Some(Id::String(s)) => s.clone(),
        Some(Id::Number(n)) => n.to_string(),
        None => String::new(),
    };
    let name = feature
        .property("name")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .unwrap_or_else(|| id.clone());

    Some(BoundaryShape { id, name, rings })
}

fn collect_rings(geometry: &Geometry, rings: &mut Vec<Ring>) {
    match &geometry.value {
        Value::Polygon(polygon) => {
            rings.extend(polygon.iter().map(|ring| to_ring(ring)));
        }
        Value::MultiPolygon(polygons) => {
            for polygon in polygons {
                rings.extend(polygon.iter().map(|ring| to_ring(ring)));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_rings(g, rings);
            }
        }
        _ => {}
    }
}

fn to_ring(coords: &[Vec<f64>]) -> Ring {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes_keep_holes_and_names() {
        let geojson: GeoJson = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": "710", "properties": {"name": "South Africa"},
                 "geometry": {"type": "Polygon", "coordinates": [
                    [[16, -35], [33, -35], [33, -22], [16, -22], [16, -35]],
                    [[27, -31], [29, -31], [29, -28], [27, -28], [27, -31]]
                 ]}},
                {"type": "Feature", "id": 426,
                 "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[27, -31], [29, -31], [29, -28], [27, -28], [27, -31]]]
                 ]}},
                {"type": "Feature", "properties": {"name": "Dot"},
                 "geometry": {"type": "Point", "coordinates": [0, 0]}}
            ]
        }"#
        .parse()
        .unwrap();

        let shapes = shapes_from_geojson(&geojson);
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].id, "710");
        assert_eq!(shapes[0].name, "South Africa");
        assert_eq!(shapes[0].rings.len(), 2);
        // No name property: fall back to the id
        assert_eq!(shapes[1].id, "426");
        assert_eq!(shapes[1].name, "426");
    }

    #[test]
    fn test_load_local_topology_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.json");
        fs::write(
            &path,
            r#"{"type": "Topology",
                "arcs": [[[-120, 35], [-110, 35], [-110, 40], [-120, 40], [-120, 35]]],
                "objects": {"states": {"type": "GeometryCollection", "geometries": [
                    {"type": "Polygon", "id": "06", "properties": {"name": "California"}, "arcs": [[0]]}
                ]}}}"#,
        )
        .unwrap();

        let loader = ReferenceLoader::new(None).unwrap();
        let shapes = loader
            .load(&ReferenceSource {
                dataset: Dataset::UsStates,
                location: path.display().to_string(),
            })
            .unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].name, "California");
        assert_eq!(shapes[0].rings[0].len(), 5);
    }

    #[test]
    fn test_wrong_object_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");
        fs::write(
            &path,
            r#"{"type": "Topology", "arcs": [], "objects": {"land": {"type": "GeometryCollection", "geometries": []}}}"#,
        )
        .unwrap();

        let loader = ReferenceLoader::new(None).unwrap();
        let err = loader
            .load(&ReferenceSource {
                dataset: Dataset::World,
                location: path.display().to_string(),
            })
            .unwrap_err();
        assert!(format!("{err:#}").contains("countries"));
    }
}
