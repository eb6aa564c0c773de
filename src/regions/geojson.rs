//! Serde model of the boundary dataset (GeoJSON) and its conversion into
//! `geo` polygons.

use geo_types::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A GeoJSON position; altitude and extra members are ignored
pub type Position = Vec<f64>;

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: Position,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<HashMap<String, serde_json::Value>>,
}

impl GeoJsonFeature {
    /// String value of a property, if present and a string
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.as_ref()?.get(key)?.as_str()
    }
}

/// Root GeoJSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection { features: Vec<GeoJsonFeature> },
}

impl GeoJson {
    pub fn features(&self) -> &[GeoJsonFeature] {
        match self {
            GeoJson::Feature(feature) => std::slice::from_ref(feature),
            GeoJson::FeatureCollection { features } => features,
        }
    }
}

impl GeoJsonGeometry {
    /// Polygons of an areal geometry; `None` for points and lines.
    ///
    /// Positions with fewer than two members become NaN coordinates so the
    /// intersection predicate reports them as malformed.
    pub fn to_polygons(&self) -> Option<Vec<Polygon<f64>>> {
        match self {
            GeoJsonGeometry::Polygon { coordinates } => Some(vec![polygon(coordinates)]),
            GeoJsonGeometry::MultiPolygon { coordinates } => {
                Some(coordinates.iter().map(|rings| polygon(rings)).collect())
            }
            GeoJsonGeometry::GeometryCollection { geometries } => {
                let polygons: Vec<_> = geometries
                    .iter()
                    .filter_map(GeoJsonGeometry::to_polygons)
                    .flatten()
                    .collect();
                (!polygons.is_empty()).then_some(polygons)
            }
            _ => None,
        }
    }
}

fn polygon(rings: &[Vec<Position>]) -> Polygon<f64> {
    let mut rings = rings.iter().map(|ring| ring_to_line_string(ring));
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.collect())
}

fn ring_to_line_string(ring: &[Position]) -> LineString<f64> {
    ring.iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Coord { x: *x, y: *y },
            _ => Coord {
                x: f64::NAN,
                y: f64::NAN,
            },
        })
        .collect::<Vec<_>>()
        .into()
}
