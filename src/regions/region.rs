//! Named administrative regions and the sources they are loaded from.

use crate::{regions::geojson::GeoJson, Result};
use async_trait::async_trait;
use geo::MultiPolygon;
use std::path::PathBuf;

/// A named polygon or multipolygon from the boundary dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl Region {
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }
}

/// Region boundaries loaded once per session.
///
/// Features sharing a name are merged into one region, so a prefecture split
/// across several features still evaluates as one name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    /// A set without regions; no dynamic layer is ever visible against it
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_regions(regions: Vec<Region>) -> Self {
        let mut set = Self::empty();
        for region in regions {
            set.push(region);
        }
        set
    }

    /// Parses a GeoJSON document, naming regions by `name_property`.
    ///
    /// Features without the property or without an areal geometry are
    /// skipped.
    pub fn from_geojson_str(json: &str, name_property: &str) -> Result<Self> {
        let data: GeoJson = serde_json::from_str(json)?;
        Ok(Self::from_geojson(&data, name_property))
    }

    pub fn from_geojson(data: &GeoJson, name_property: &str) -> Self {
        let mut set = Self::empty();
        let mut skipped = 0usize;

        for feature in data.features() {
            let name = feature.property_str(name_property);
            let polygons = feature.geometry.as_ref().and_then(|g| g.to_polygons());
            match (name, polygons) {
                (Some(name), Some(polygons)) => {
                    set.push(Region::new(name, MultiPolygon::new(polygons)))
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            log::debug!("skipped {} boundary features without name or area", skipped);
        }
        set
    }

    /// Fetches and parses boundaries from `source`.
    ///
    /// Any failure degrades to an empty set so the map stays usable with base
    /// layers only.
    pub async fn load_or_empty(source: &dyn BoundarySource, name_property: &str) -> Self {
        let parsed = match source.fetch().await {
            Ok(json) => Self::parse_detached(json, name_property.to_string()).await,
            Err(e) => Err(e),
        };

        match parsed {
            Ok(set) => {
                log::info!("loaded {} regions from {}", set.len(), source.describe());
                set
            }
            Err(e) => {
                log::warn!(
                    "failed to load region boundaries from {}: {}; dynamic layers stay hidden",
                    source.describe(),
                    e
                );
                Self::empty()
            }
        }
    }

    /// Boundary files run to megabytes, so parsing stays off the async workers
    #[cfg(feature = "tokio-runtime")]
    async fn parse_detached(json: String, name_property: String) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::from_geojson_str(&json, &name_property))
            .await
            .map_err(|e| crate::Error::ParseError(format!("boundary parse task failed: {}", e)))?
    }

    #[cfg(not(feature = "tokio-runtime"))]
    async fn parse_detached(json: String, name_property: String) -> Result<Self> {
        Self::from_geojson_str(&json, &name_property)
    }

    fn push(&mut self, region: Region) {
        match self.regions.iter_mut().find(|r| r.name == region.name) {
            Some(existing) => existing.geometry.0.extend(region.geometry.0),
            None => self.regions.push(region),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Where the boundary dataset comes from
#[async_trait]
pub trait BoundarySource: Send + Sync {
    /// Raw GeoJSON text
    async fn fetch(&self) -> Result<String>;

    /// Location used in log messages
    fn describe(&self) -> String;
}

/// Boundary dataset on the local filesystem
#[derive(Debug, Clone)]
pub struct FileBoundarySource {
    path: PathBuf,
}

impl FileBoundarySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BoundarySource for FileBoundarySource {
    #[cfg(feature = "tokio-runtime")]
    async fn fetch(&self) -> Result<String> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }

    #[cfg(not(feature = "tokio-runtime"))]
    async fn fetch(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Boundary dataset served over HTTP
#[derive(Debug, Clone)]
pub struct HttpBoundarySource {
    url: String,
    client: reqwest::Client,
}

impl HttpBoundarySource {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl BoundarySource for HttpBoundarySource {
    async fn fetch(&self) -> Result<String> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::Write;

    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "N03_001": "長野県" },
                "geometry": { "type": "Polygon", "coordinates": [[[137.5, 35.2], [138.7, 35.2], [138.7, 37.0], [137.5, 37.0], [137.5, 35.2]]] }
            },
            {
                "type": "Feature",
                "properties": { "N03_001": "長野県" },
                "geometry": { "type": "Polygon", "coordinates": [[[138.0, 37.0], [138.5, 37.0], [138.5, 37.1], [138.0, 37.0]]] }
            },
            {
                "type": "Feature",
                "properties": { "N03_001": "岐阜県" },
                "geometry": { "type": "MultiPolygon", "coordinates": [[[[136.3, 35.2], [137.6, 35.2], [137.6, 36.4], [136.3, 35.2]]]] }
            },
            { "type": "Feature", "properties": {}, "geometry": null }
        ]
    }"#;

    struct BrokenSource;

    #[async_trait]
    impl BoundarySource for BrokenSource {
        async fn fetch(&self) -> Result<String> {
            Err(Error::Config("unreachable".into()))
        }

        fn describe(&self) -> String {
            "broken".into()
        }
    }

    #[test]
    fn test_features_with_same_name_merge() {
        let set = RegionSet::from_geojson_str(BOUNDARIES, "N03_001").unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["長野県", "岐阜県"]);
        assert_eq!(set.get("長野県").map(|r| r.geometry.0.len()), Some(2));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(RegionSet::from_geojson_str("{not json", "N03_001").is_err());
    }

    #[tokio::test]
    async fn test_file_source_loads_regions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BOUNDARIES.as_bytes()).unwrap();

        let source = FileBoundarySource::new(file.path());
        let set = RegionSet::load_or_empty(&source, "N03_001").await;
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_degrades_to_empty() {
        let set = RegionSet::load_or_empty(&BrokenSource, "N03_001").await;
        assert!(set.is_empty());

        let missing = FileBoundarySource::new("/nonexistent/pref_boundary_simple.geojson");
        assert!(RegionSet::load_or_empty(&missing, "N03_001").await.is_empty());
    }
}
