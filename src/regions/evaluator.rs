//! Viewport/region intersection.
//!
//! Evaluation is pure: it maps a viewport rectangle and a region set to the
//! names of regions the rectangle touches. A predicate fault on one region
//! counts as "not intersecting" and never aborts the pass.

use crate::{core::geo::LatLngBounds, regions::region::Region, regions::region::RegionSet};
use geo::{BoundingRect, Coord, Intersects, LineString, Polygon, Rect};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("region '{region}' has a ring with {positions} positions")]
    DegenerateRing { region: String, positions: usize },

    #[error("region '{0}' has non-finite coordinates")]
    NonFinite(String),

    #[error("viewport rectangle is invalid")]
    InvalidRect,
}

/// Does the viewport rectangle intersect the region?
pub trait IntersectionPredicate: Send + Sync {
    fn intersects(&self, rect: &LatLngBounds, region: &Region) -> Result<bool, GeometryError>;
}

/// Intersection test backed by the `geo` crate.
///
/// Rejects rings with fewer than four positions and non-finite coordinates
/// before testing.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoIntersects;

impl GeoIntersects {
    fn validate(region: &str, polygon: &Polygon<f64>) -> Result<(), GeometryError> {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            validate_ring(region, ring)?;
        }
        Ok(())
    }
}

fn validate_ring(region: &str, ring: &LineString<f64>) -> Result<(), GeometryError> {
    if ring.0.len() < 4 {
        return Err(GeometryError::DegenerateRing {
            region: region.to_string(),
            positions: ring.0.len(),
        });
    }
    if ring.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(GeometryError::NonFinite(region.to_string()));
    }
    Ok(())
}

fn to_rect(bounds: &LatLngBounds) -> Result<Rect<f64>, GeometryError> {
    if !bounds.is_valid() {
        return Err(GeometryError::InvalidRect);
    }
    Ok(Rect::new(
        Coord {
            x: bounds.west(),
            y: bounds.south(),
        },
        Coord {
            x: bounds.east(),
            y: bounds.north(),
        },
    ))
}

impl IntersectionPredicate for GeoIntersects {
    /// Tests each polygon on its own; a malformed polygon is skipped and only
    /// fails the region when no polygon could be tested.
    fn intersects(&self, rect: &LatLngBounds, region: &Region) -> Result<bool, GeometryError> {
        let rect = to_rect(rect)?;
        let viewport = rect.to_polygon();
        let mut fault = None;
        let mut tested = 0usize;

        for polygon in &region.geometry {
            if let Err(e) = Self::validate(&region.name, polygon) {
                log::debug!("skipping polygon: {}", e);
                fault.get_or_insert(e);
                continue;
            }
            tested += 1;
            // Envelope check first; most polygons are far from the viewport
            let near = polygon
                .bounding_rect()
                .is_some_and(|envelope| envelope.intersects(&rect));
            if near && polygon.intersects(&viewport) {
                return Ok(true);
            }
        }

        match fault {
            Some(e) if tested == 0 => Err(e),
            _ => Ok(false),
        }
    }
}

/// Computes which regions a viewport touches
pub struct RegionVisibilityEvaluator {
    predicate: Box<dyn IntersectionPredicate>,
}

impl Default for RegionVisibilityEvaluator {
    fn default() -> Self {
        Self::new(Box::new(GeoIntersects))
    }
}

impl RegionVisibilityEvaluator {
    pub fn new(predicate: Box<dyn IntersectionPredicate>) -> Self {
        Self { predicate }
    }

    /// Names of every region intersecting `viewport`
    pub fn evaluate(&self, viewport: &LatLngBounds, regions: &RegionSet) -> BTreeSet<String> {
        regions
            .iter()
            .filter(|region| match self.predicate.intersects(viewport, region) {
                Ok(hit) => hit,
                Err(e) => {
                    log::debug!("intersection test skipped: {}", e);
                    false
                }
            })
            .map(|region| region.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn square(name: &str, west: f64, south: f64, east: f64, north: f64) -> Region {
        Region::new(
            name,
            MultiPolygon::new(vec![polygon![
                (x: west, y: south),
                (x: east, y: south),
                (x: east, y: north),
                (x: west, y: north),
                (x: west, y: south),
            ]]),
        )
    }

    fn regions() -> RegionSet {
        RegionSet::from_regions(vec![
            square("長野県", 137.5, 35.2, 138.7, 37.0),
            square("岐阜県", 136.3, 35.2, 137.6, 36.4),
            square("東京都", 138.9, 35.5, 139.9, 35.9),
        ])
    }

    #[test]
    fn test_viewport_inside_one_region() {
        let evaluator = RegionVisibilityEvaluator::default();
        let viewport = LatLngBounds::from_coords(36.0, 138.0, 36.1, 138.1);

        let visible = evaluator.evaluate(&viewport, &regions());
        assert_eq!(visible.into_iter().collect::<Vec<_>>(), vec!["長野県".to_string()]);
    }

    #[test]
    fn test_viewport_straddling_border() {
        let evaluator = RegionVisibilityEvaluator::default();
        let viewport = LatLngBounds::from_coords(35.9, 137.4, 36.0, 137.7);

        let visible = evaluator.evaluate(&viewport, &regions());
        assert_eq!(visible.len(), 2);
        assert!(visible.contains("長野県") && visible.contains("岐阜県"));
    }

    #[test]
    fn test_empty_inputs() {
        let evaluator = RegionVisibilityEvaluator::default();
        let ocean = LatLngBounds::from_coords(30.0, 150.0, 30.1, 150.1);

        assert!(evaluator.evaluate(&ocean, &regions()).is_empty());
        assert!(evaluator
            .evaluate(&LatLngBounds::from_coords(36.0, 138.0, 36.1, 138.1), &RegionSet::empty())
            .is_empty());
    }

    #[test]
    fn test_malformed_region_does_not_abort_pass() {
        let broken = Region::new(
            "壊れた県",
            MultiPolygon::new(vec![polygon![(x: 138.0, y: 36.0), (x: 138.1, y: 36.0)]]),
        );
        let mut all: Vec<Region> = regions().iter().cloned().collect();
        all.insert(0, broken.clone());
        let set = RegionSet::from_regions(all);

        let viewport = LatLngBounds::from_coords(35.9, 137.9, 36.1, 138.1);
        assert!(GeoIntersects.intersects(&viewport, &broken).is_err());

        let visible = RegionVisibilityEvaluator::default().evaluate(&viewport, &set);
        assert_eq!(visible.into_iter().collect::<Vec<_>>(), vec!["長野県".to_string()]);
    }

    #[test]
    fn test_collapsed_island_does_not_hide_region() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "N03_001": "東京都" },
                    "geometry": { "type": "Polygon", "coordinates": [[[138.9, 35.5], [139.9, 35.5], [139.9, 35.9], [138.9, 35.9], [138.9, 35.5]]] }
                },
                {
                    "type": "Feature",
                    "properties": { "N03_001": "東京都" },
                    "geometry": { "type": "Polygon", "coordinates": [[[142.1, 26.6], [142.2, 26.7]]] }
                }
            ]
        }"#;
        let set = RegionSet::from_geojson_str(json, "N03_001").unwrap();
        assert_eq!(set.len(), 1);
        let tokyo = set.get("東京都").unwrap();
        assert_eq!(tokyo.geometry.0.len(), 2);

        let central = LatLngBounds::from_coords(35.68, 139.76, 35.69, 139.77);
        assert!(GeoIntersects.intersects(&central, tokyo).unwrap());

        let visible = RegionVisibilityEvaluator::default().evaluate(&central, &set);
        assert_eq!(visible.into_iter().collect::<Vec<_>>(), vec!["東京都".to_string()]);

        // Far from the intact polygon the region is simply not visible
        let ocean = LatLngBounds::from_coords(30.0, 150.0, 30.1, 150.1);
        assert_eq!(GeoIntersects.intersects(&ocean, tokyo), Ok(false));
    }

    #[test]
    fn test_non_finite_coordinates_are_rejected() {
        let region = square("nan", f64::NAN, 35.0, 139.0, 36.0);
        let viewport = LatLngBounds::from_coords(35.5, 138.5, 35.6, 138.6);
        assert_eq!(
            GeoIntersects.intersects(&viewport, &region),
            Err(GeometryError::NonFinite("nan".into()))
        );
    }
}
