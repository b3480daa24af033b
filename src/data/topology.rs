//! TopoJSON decoding.
//!
//! A topology stores shared boundary arcs once; polygons reference them by
//! index. Quantized topologies store arc points as integer deltas that are
//! rebuilt with the topology `transform`. Decoding produces plain GeoJSON
//! so the rest of the loader only deals with `geojson` geometry.

use std::collections::HashMap;

use anyhow::{Context, Result};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Deserialize;

/// A parsed TopoJSON document
#[derive(Debug, Deserialize)]
pub struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    arcs: Vec<Vec<Vec<f64>>>,
    objects: HashMap<String, GeometryObject>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

/// A geometry object, or a feature whose `type` is null (no geometry)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeometryObject {
    Typed(TopoGeometry),
    Null {
        #[serde(rename = "type")]
        _kind: (),
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TopoGeometry {
    GeometryCollection {
        geometries: Vec<GeometryObject>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        id: Option<FeatureId>,
        #[serde(default)]
        properties: Option<JsonObject>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        id: Option<FeatureId>,
        #[serde(default)]
        properties: Option<JsonObject>,
    },
    // Points and lines carry no area to fill
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FeatureId {
    Text(String),
    Number(i64),
}

impl From<&FeatureId> for Id {
    fn from(id: &FeatureId) -> Self {
        match id {
            FeatureId::Text(s) => Id::String(s.clone()),
            FeatureId::Number(n) => Id::Number((*n).into()),
        }
    }
}

type Arc = Vec<(f64, f64)>;

impl Topology {
    /// Parse a TopoJSON document in place (simd-json mutates the buffer)
    pub fn parse(bytes: &mut [u8]) -> Result<Self> {
        simd_json::serde::from_slice(bytes).context("invalid TopoJSON document")
    }

    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// Convert one named object into a feature collection, one feature per
    /// polygonal geometry.
    pub fn feature_collection(&self, object: &str) -> Result<FeatureCollection> {
        let root = self
            .objects
            .get(object)
            .with_context(|| {
                let known: Vec<&str> = self.object_names().collect();
                format!("topology has no object named {object:?} (found: {})", known.join(", "))
            })?;

        let arcs = self.absolute_arcs();
        let mut features = Vec::new();
        collect_features(root, &arcs, &mut features)?;

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    /// Arcs in absolute coordinates
    fn absolute_arcs(&self) -> Vec<Arc> {
        self.arcs
            .iter()
            .map(|arc| {
                let positions = arc.iter().filter(|p| p.len() >= 2);
                match self.transform {
                    Some(t) => {
                        let (mut x, mut y) = (0.0, 0.0);
                        positions
                            .map(|p| {
                                x += p[0];
                                y += p[1];
                                (x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1])
                            })
                            .collect()
                    }
                    None => positions.map(|p| (p[0], p[1])).collect(),
                }
            })
            .collect()
    }
}

fn collect_features(object: &GeometryObject, arcs: &[Arc], out: &mut Vec<Feature>) -> Result<()> {
    let GeometryObject::Typed(geometry) = object else {
        return Ok(());
    };
    match geometry {
        TopoGeometry::GeometryCollection { geometries } => {
            for g in geometries {
                collect_features(g, arcs, out)?;
            }
        }
        TopoGeometry::Polygon {
            arcs: rings,
            id,
            properties,
        } => {
            let value = Value::Polygon(polygon(rings, arcs)?);
            out.push(feature(value, id, properties));
        }
        TopoGeometry::MultiPolygon {
            arcs: polygons,
            id,
            properties,
        } => {
            let polygons = polygons
                .iter()
                .map(|rings| polygon(rings, arcs))
                .collect::<Result<Vec<_>>>()?;
            out.push(feature(Value::MultiPolygon(polygons), id, properties));
        }
        TopoGeometry::Other => {}
    }
    Ok(())
}

fn feature(value: Value, id: &Option<FeatureId>, properties: &Option<JsonObject>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: id.as_ref().map(Id::from),
        properties: properties.clone(),
        foreign_members: None,
    }
}

fn polygon(rings: &[Vec<i64>], arcs: &[Arc]) -> Result<Vec<Vec<Vec<f64>>>> {
    rings.iter().map(|r| ring(r, arcs)).collect()
}

/// Stitch arcs into a closed ring. A negative index `!i` walks arc `i`
/// backwards; the first point of each following arc repeats the last point
/// of the previous one and is dropped.
fn ring(indices: &[i64], arcs: &[Arc]) -> Result<Vec<Vec<f64>>> {
    let mut points: Vec<(f64, f64)> = Vec::new();

    for &i in indices {
        let (idx, reversed) = if i < 0 { ((!i) as usize, true) } else { (i as usize, false) };
        let arc = arcs
            .get(idx)
            .with_context(|| format!("arc index {i} out of range ({} arcs)", arcs.len()))?;

        points.pop();
        if reversed {
            points.extend(arc.iter().rev());
        } else {
            points.extend(arc.iter());
        }
    }

    // Degenerate rings are padded to the minimum closed ring length
    if let Some(&first) = points.first() {
        while points.len() < 4 {
            points.push(first);
        }
    }

    Ok(points.into_iter().map(|(x, y)| vec![x, y]).collect())
}
