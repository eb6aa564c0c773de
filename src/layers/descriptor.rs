use crate::core::{config::LayerConfig, geo::LatLngBounds};
use crate::tiles::source::UrlTemplate;

/// Stable identifier of a layer
pub type LayerId = String;

/// Whether a layer is always offered or gated on the visible regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Base,
    Dynamic,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerKind::Base => write!(f, "base"),
            LayerKind::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// A candidate background layer.
///
/// Rebuilt from configuration every session. `is_active` records membership in
/// the selectable set and is only written by the activation controller.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescriptor {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
    pub source: UrlTemplate,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub max_native_zoom: Option<u8>,
    pub attribution: Option<String>,
    pub bounds: Option<LatLngBounds>,
    pub save_zoom_levels: Option<Vec<u8>>,
    pub(crate) is_active: bool,
}

impl LayerDescriptor {
    pub fn from_config(config: &LayerConfig, kind: LayerKind) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            kind,
            source: UrlTemplate::with_subdomains(&config.url, config.subdomains.clone()),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            max_native_zoom: config.max_native_zoom,
            attribution: config.attribution.clone(),
            bounds: config.bounds,
            save_zoom_levels: config.save_zoom_levels.clone(),
            is_active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == LayerKind::Dynamic
    }

    /// True when the display name mentions any of the given region names
    pub fn matches_any_region<'a, I>(&self, region_names: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        region_names
            .into_iter()
            .any(|region| !region.is_empty() && self.name.contains(region))
    }

    /// Zoom levels a save of this layer downloads.
    ///
    /// Uses the layer override when present, otherwise `defaults`, and drops
    /// levels outside the layer's zoom range.
    pub fn save_zoom_levels(&self, defaults: &[u8]) -> Vec<u8> {
        let mut levels: Vec<u8> = self
            .save_zoom_levels
            .as_deref()
            .unwrap_or(defaults)
            .iter()
            .copied()
            .filter(|z| *z >= self.min_zoom && *z <= self.max_zoom)
            .collect();
        levels.sort_unstable();
        levels.dedup();
        levels
    }
}
