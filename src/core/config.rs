//! Configuration for layers, the save control and notification timing
//!
//! Hosts either start from [`OfflineMapConfig::default`], which mirrors the
//! stock field viewer, or deserialize their own JSON document. Every section
//! falls back to its defaults when omitted.

use crate::{
    core::{
        constants::{
            DEFAULT_CENTER, DEFAULT_SAVE_ZOOM_LEVELS, DEFAULT_ZOOM, ERROR_DISMISS_MS,
            INFO_DISMISS_MS, MAP_STATE_KEY, MAX_TILES_PER_SAVE, MAX_ZOOM, REGION_NAME_PROPERTY,
        },
        geo::LatLngBounds,
        viewport::ViewportState,
    },
    prelude::HashSet,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Static description of one background layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub id: String,
    pub name: String,
    /// URL template with `{z}`, `{x}`, `{y}` and optional `{s}` placeholders
    pub url: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Highest zoom the tile server actually serves; tiles above are upscaled
    pub max_native_zoom: Option<u8>,
    pub attribution: Option<String>,
    pub subdomains: Vec<String>,
    /// Coverage of the layer's source data, if known
    pub bounds: Option<LatLngBounds>,
    /// Overrides the save control's zoom levels for this layer
    pub save_zoom_levels: Option<Vec<u8>>,
}

impl LayerConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_zoom(mut self, min_zoom: u8, max_native_zoom: Option<u8>, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_native_zoom = max_native_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = Some(attribution.into());
        self
    }

    pub fn with_bounds(mut self, bounds: LatLngBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            url: String::new(),
            min_zoom: 0,
            max_zoom: MAX_ZOOM,
            max_native_zoom: None,
            attribution: None,
            subdomains: Vec::new(),
            bounds: None,
            save_zoom_levels: None,
        }
    }
}

/// Settings of the bulk save control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveControlConfig {
    pub zoom_levels: Vec<u8>,
    pub max_tiles: usize,
}

impl Default for SaveControlConfig {
    fn default() -> Self {
        Self {
            zoom_levels: DEFAULT_SAVE_ZOOM_LEVELS.to_vec(),
            max_tiles: MAX_TILES_PER_SAVE,
        }
    }
}

/// Auto-dismiss timing of the status line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub info_dismiss_ms: u64,
    pub error_dismiss_ms: u64,
}

impl NotificationConfig {
    pub fn info_dismiss(&self) -> Duration {
        Duration::from_millis(self.info_dismiss_ms)
    }

    pub fn error_dismiss(&self) -> Duration {
        Duration::from_millis(self.error_dismiss_ms)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            info_dismiss_ms: INFO_DISMISS_MS,
            error_dismiss_ms: ERROR_DISMISS_MS,
        }
    }
}

/// Complete configuration of an offline map session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineMapConfig {
    pub base_layers: Vec<LayerConfig>,
    pub dynamic_layers: Vec<LayerConfig>,
    pub default_base_layer: String,
    pub save: SaveControlConfig,
    pub notifications: NotificationConfig,
    pub default_view: ViewportState,
    pub max_zoom: u8,
    pub state_key: String,
    pub region_name_property: String,
}

impl OfflineMapConfig {
    /// Parses a JSON configuration document and validates it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_dynamic_layers(mut self, layers: Vec<LayerConfig>) -> Self {
        self.dynamic_layers = layers;
        self
    }

    /// Rejects configurations the session cannot run with
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::default();
        for layer in self.base_layers.iter().chain(&self.dynamic_layers) {
            if layer.id.is_empty() {
                return Err(Error::Config(format!("layer '{}' has no id", layer.name)));
            }
            if !seen.insert(layer.id.as_str()) {
                return Err(Error::Config(format!("duplicate layer id '{}'", layer.id)));
            }
            if layer.min_zoom > layer.max_zoom {
                return Err(Error::Config(format!(
                    "layer '{}' has min_zoom {} above max_zoom {}",
                    layer.id, layer.min_zoom, layer.max_zoom
                )));
            }
        }

        if !self.default_base_layer.is_empty()
            && !self.base_layers.iter().any(|l| l.id == self.default_base_layer)
        {
            return Err(Error::Config(format!(
                "default base layer '{}' is not a configured base layer",
                self.default_base_layer
            )));
        }
        if self.save.zoom_levels.is_empty() {
            return Err(Error::Config("save zoom levels must not be empty".to_string()));
        }
        if self.save.max_tiles == 0 {
            return Err(Error::Config("save tile ceiling must be positive".to_string()));
        }
        if !self.default_view.is_valid() {
            return Err(Error::Config("default view is out of range".to_string()));
        }
        Ok(())
    }
}

impl Default for OfflineMapConfig {
    fn default() -> Self {
        Self {
            base_layers: default_base_layers(),
            dynamic_layers: Vec::new(),
            default_base_layer: "gsi-std".to_string(),
            save: SaveControlConfig::default(),
            notifications: NotificationConfig::default(),
            default_view: ViewportState::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1, DEFAULT_ZOOM),
            max_zoom: MAX_ZOOM,
            state_key: MAP_STATE_KEY.to_string(),
            region_name_property: REGION_NAME_PROPERTY.to_string(),
        }
    }
}

fn default_base_layers() -> Vec<LayerConfig> {
    vec![
        LayerConfig::new(
            "osm",
            "OpenStreetMap",
            "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
        )
        .with_zoom(0, None, MAX_ZOOM)
        .with_attribution("&copy; OpenStreetMap"),
        LayerConfig::new(
            "gsi-std",
            "地理院地図",
            "https://cyberjapandata.gsi.go.jp/xyz/std/{z}/{x}/{y}.png",
        )
        .with_zoom(5, Some(18), MAX_ZOOM)
        .with_attribution("地理院タイル"),
        LayerConfig::new(
            "gsi-photo",
            "空中写真（最新）",
            "https://cyberjapandata.gsi.go.jp/xyz/seamlessphoto/{z}/{x}/{y}.jpg",
        )
        .with_zoom(5, Some(17), MAX_ZOOM)
        .with_attribution("地理院タイル"),
        LayerConfig::new(
            "gsi-photo-1974",
            "空中写真（1974～1979）",
            "https://cyberjapandata.gsi.go.jp/xyz/gazo1/{z}/{x}/{y}.jpg",
        )
        .with_zoom(5, Some(17), MAX_ZOOM)
        .with_attribution("地理院タイル"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = OfflineMapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.save.zoom_levels, vec![16, 17, 18]);
        assert_eq!(config.save.max_tiles, 2500);
        assert_eq!(config.notifications.info_dismiss(), Duration::from_millis(3000));
        assert_eq!(config.notifications.error_dismiss(), Duration::from_millis(8000));
        assert_eq!(config.base_layers.len(), 4);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{
            "dynamic_layers": [
                { "id": "cs-nagano", "name": "CS立体図（長野県）", "url": "https://example.org/cs/{z}/{x}/{y}.png", "max_zoom": 18 }
            ],
            "save": { "max_tiles": 1000 }
        }"#;

        let config = OfflineMapConfig::from_json_str(json).unwrap();
        assert_eq!(config.dynamic_layers.len(), 1);
        assert_eq!(config.dynamic_layers[0].min_zoom, 0);
        assert_eq!(config.save.max_tiles, 1000);
        assert_eq!(config.save.zoom_levels, vec![16, 17, 18]);
        assert_eq!(config.state_key, "mapState");
    }

    #[test]
    fn test_duplicate_layer_ids_are_rejected() {
        let mut config = OfflineMapConfig::default();
        config
            .dynamic_layers
            .push(LayerConfig::new("osm", "Duplicate", "https://example.org/{z}/{x}/{y}.png"));

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_default_layer_is_rejected() {
        let config = OfflineMapConfig {
            default_base_layer: "missing".to_string(),
            ..OfflineMapConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_a_serialization_error() {
        assert!(matches!(
            OfflineMapConfig::from_json_str("{ not json"),
            Err(Error::Serialization(_))
        ));
    }
}
