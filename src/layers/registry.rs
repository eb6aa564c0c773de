use crate::{
    core::config::OfflineMapConfig,
    layers::descriptor::{LayerDescriptor, LayerKind},
};

/// Candidate background layers of a session, base layers first
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    layers: Vec<LayerDescriptor>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry from configuration; every layer starts inactive
    pub fn from_config(config: &OfflineMapConfig) -> Self {
        let base = config
            .base_layers
            .iter()
            .map(|c| LayerDescriptor::from_config(c, LayerKind::Base));
        let dynamic = config
            .dynamic_layers
            .iter()
            .map(|c| LayerDescriptor::from_config(c, LayerKind::Dynamic));

        Self {
            layers: base.chain(dynamic).collect(),
        }
    }

    /// Adds a layer, replacing any layer with the same id
    pub fn insert(&mut self, layer: LayerDescriptor) {
        match self.layers.iter_mut().find(|l| l.id == layer.id) {
            Some(existing) => *existing = layer,
            None => self.layers.push(layer),
        }
    }

    pub fn get(&self, layer_id: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.id == layer_id)
    }

    pub(crate) fn get_mut(&mut self, layer_id: &str) -> Option<&mut LayerDescriptor> {
        self.layers.iter_mut().find(|l| l.id == layer_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut LayerDescriptor> {
        self.layers.iter_mut()
    }

    pub fn base_layers(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter().filter(|l| l.kind == LayerKind::Base)
    }

    pub fn dynamic_layers(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter().filter(|l| l.kind == LayerKind::Dynamic)
    }

    /// IDs of layers currently in the selectable set
    pub fn active_ids(&self) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|l| l.is_active())
            .map(|l| l.id.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LayerConfig;

    #[test]
    fn test_registry_from_config_orders_base_first() {
        let config = OfflineMapConfig::default().with_dynamic_layers(vec![LayerConfig::new(
            "cs-nagano",
            "CS立体図（長野県）",
            "https://example.org/{z}/{x}/{y}.png",
        )]);

        let registry = LayerRegistry::from_config(&config);
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.base_layers().count(), 4);
        assert_eq!(registry.dynamic_layers().count(), 1);
        assert_eq!(registry.iter().last().map(|l| l.id.as_str()), Some("cs-nagano"));
        assert!(registry.active_ids().is_empty());
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut registry = LayerRegistry::new();
        let config = LayerConfig::new("x", "First", "u");
        registry.insert(LayerDescriptor::from_config(&config, LayerKind::Base));
        let renamed = LayerConfig::new("x", "Second", "u");
        registry.insert(LayerDescriptor::from_config(&renamed, LayerKind::Base));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("x").map(|l| l.name.as_str()), Some("Second"));
    }
}
