pub mod evaluator;
pub mod geojson;
pub mod region;

pub use evaluator::{GeoIntersects, GeometryError, IntersectionPredicate, RegionVisibilityEvaluator};
pub use region::{BoundarySource, FileBoundarySource, HttpBoundarySource, Region, RegionSet};
