//! Fluent construction of an [`OfflineMap`] session.
//!
//! Every collaborator has a default: an in-memory layer control, the HTTP
//! tile cache, a process-local key-value store, the `geo` intersection test
//! and no storage-usage API. The default confirmer declines, so nothing is
//! downloaded until the host supplies a real confirmation gate.

use crate::{
    core::{
        config::{LayerConfig, OfflineMapConfig},
        map::OfflineMap,
    },
    layers::{
        activation::ActivationController, manager::LayerControl, manager::MapSurface,
        registry::LayerRegistry,
    },
    offline::{
        confirm::{AutoConfirm, Confirmer},
        orchestrator::CacheOrchestrator,
    },
    persistence::{
        store::{KeyValueStore, MemoryStore},
        viewport::ViewportPersistence,
    },
    regions::evaluator::{GeoIntersects, IntersectionPredicate, RegionVisibilityEvaluator},
    storage::quota::{StorageEstimator, StorageQuotaReporter},
    tiles::{backend::TileCacheBackend, cache::OfflineTileCache},
    ui::notification::NotificationSurface,
    Result,
};
use std::sync::Arc;

/// Builder for creating and configuring offline map sessions
pub struct OfflineMapBuilder {
    config: OfflineMapConfig,
    surface: Option<Box<dyn MapSurface>>,
    backend: Option<Arc<dyn TileCacheBackend>>,
    confirmer: Option<Arc<dyn Confirmer>>,
    store: Option<Arc<dyn KeyValueStore>>,
    estimator: Option<Arc<dyn StorageEstimator>>,
    predicate: Option<Box<dyn IntersectionPredicate>>,
}

impl OfflineMapBuilder {
    pub fn new() -> Self {
        Self {
            config: OfflineMapConfig::default(),
            surface: None,
            backend: None,
            confirmer: None,
            store: None,
            estimator: None,
            predicate: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: OfflineMapConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the region-gated layers
    pub fn with_dynamic_layers(mut self, layers: Vec<LayerConfig>) -> Self {
        self.config.dynamic_layers = layers;
        self
    }

    /// Set the layer shown at startup
    pub fn with_default_base_layer(mut self, layer_id: impl Into<String>) -> Self {
        self.config.default_base_layer = layer_id.into();
        self
    }

    /// Configure the save control's zoom levels and tile ceiling
    pub fn with_save_limits(mut self, zoom_levels: Vec<u8>, max_tiles: usize) -> Self {
        self.config.save.zoom_levels = zoom_levels;
        self.config.save.max_tiles = max_tiles;
        self
    }

    /// Set the rendering surface and layer control
    pub fn with_surface(mut self, surface: Box<dyn MapSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Set the tile fetch/store collaborator
    pub fn with_backend(mut self, backend: Arc<dyn TileCacheBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the user confirmation gate
    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = Some(confirmer);
        self
    }

    /// Set the durable store for the last viewport
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the host's storage-usage API
    pub fn with_estimator(mut self, estimator: Arc<dyn StorageEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Replace the viewport/region intersection test
    pub fn with_predicate(mut self, predicate: Box<dyn IntersectionPredicate>) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Build the session; base layers are offered and the default one drawn
    pub fn build(self) -> Result<OfflineMap> {
        let config = self.config;
        config.validate()?;

        let surface = self
            .surface
            .unwrap_or_else(|| Box::new(LayerControl::new()));
        let mut activation = ActivationController::new(LayerRegistry::from_config(&config), surface);
        let default_base = Some(config.default_base_layer.as_str()).filter(|id| !id.is_empty());
        activation.initialize(default_base)?;

        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(OfflineTileCache::http()));
        let confirmer = self
            .confirmer
            .unwrap_or_else(|| Arc::new(AutoConfirm::decline()));
        let storage = match self.estimator {
            Some(estimator) => StorageQuotaReporter::new(estimator),
            None => StorageQuotaReporter::unsupported(),
        };
        let notifications = NotificationSurface::new(config.notifications.clone());

        let orchestrator = CacheOrchestrator::new(
            backend,
            confirmer,
            Arc::new(notifications),
            Arc::new(storage),
            config.save.clone(),
        );

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let persistence = ViewportPersistence::new(store, config.state_key.clone());

        let evaluator = RegionVisibilityEvaluator::new(
            self.predicate.unwrap_or_else(|| Box::new(GeoIntersects)),
        );

        log::info!(
            "offline map ready: {} base and {} dynamic layers",
            config.base_layers.len(),
            config.dynamic_layers.len()
        );

        Ok(OfflineMap::new(
            config,
            activation,
            evaluator,
            persistence,
            Arc::new(orchestrator),
        ))
    }
}

impl Default for OfflineMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_build_draws_default_layer() {
        let map = OfflineMapBuilder::new().build().unwrap();

        let current = map.activation().current_base().unwrap();
        assert_eq!(current.name, "地理院地図");
        assert!(map.activation().surface().has_layer("gsi-std"));
        assert_eq!(map.initial_view(), map.config().default_view);
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let result = OfflineMapBuilder::new()
            .with_default_base_layer("missing")
            .build();
        assert!(result.is_err());

        let result = OfflineMapBuilder::new().with_save_limits(vec![], 2500).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_default_layer_draws_nothing() {
        let map = OfflineMapBuilder::new()
            .with_default_base_layer("")
            .build()
            .unwrap();
        assert!(map.activation().current_base().is_none());
    }
}
