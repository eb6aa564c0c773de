//! The offline map session.
//!
//! `OfflineMap` is what a hosting viewer talks to. It receives settle events
//! and the user's layer switches and save/remove clicks, and routes them to
//! the region evaluator, the activation controller, viewport persistence and
//! the cache orchestrator.

use crate::{
    core::{
        config::OfflineMapConfig,
        geo::LatLngBounds,
        viewport::{SettledViewport, ViewportState},
    },
    layers::{
        activation::{ActivationController, ReconcileReport},
        descriptor::LayerDescriptor,
    },
    offline::{
        operation::{CacheKind, CacheOperation},
        orchestrator::CacheOrchestrator,
    },
    persistence::viewport::ViewportPersistence,
    regions::{
        evaluator::RegionVisibilityEvaluator,
        region::{BoundarySource, RegionSet},
    },
    storage::quota::{StorageQuotaReporter, StorageReport},
    ui::notification::NotificationSurface,
    Error, Result,
};
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct OfflineMap {
    config: OfflineMapConfig,
    activation: ActivationController,
    evaluator: RegionVisibilityEvaluator,
    regions: RegionSet,
    persistence: ViewportPersistence,
    orchestrator: Arc<CacheOrchestrator>,
    viewport: Option<SettledViewport>,
    visible_regions: BTreeSet<String>,
}

impl OfflineMap {
    pub(crate) fn new(
        config: OfflineMapConfig,
        activation: ActivationController,
        evaluator: RegionVisibilityEvaluator,
        persistence: ViewportPersistence,
        orchestrator: Arc<CacheOrchestrator>,
    ) -> Self {
        Self {
            config,
            activation,
            evaluator,
            regions: RegionSet::empty(),
            persistence,
            orchestrator,
            viewport: None,
            visible_regions: BTreeSet::new(),
        }
    }

    /// The view to open with: the saved one, else the configured default
    pub fn initial_view(&self) -> ViewportState {
        let mut view = self
            .persistence
            .load()
            .unwrap_or(self.config.default_view);
        view.zoom = view.zoom.min(self.config.max_zoom as f64);
        view
    }

    /// Loads region boundaries and brings the session up to date with the
    /// first displayed view.
    ///
    /// Boundary failures are logged and leave every dynamic layer hidden.
    pub async fn start(
        &mut self,
        boundary: Option<&dyn BoundarySource>,
        initial: SettledViewport,
    ) -> StorageReport {
        self.regions = match boundary {
            Some(source) => {
                RegionSet::load_or_empty(source, &self.config.region_name_property).await
            }
            None => {
                log::info!("no boundary dataset configured; dynamic layers stay hidden");
                RegionSet::empty()
            }
        };

        self.viewport = Some(initial);
        self.refresh_layers(&initial.bounds);

        let storage = self.orchestrator.storage().clone();
        let report = storage.snapshot().await;
        storage.request_persistence().await;
        report
    }

    /// Handles the end of a pan/zoom gesture
    pub fn on_viewport_settled(&mut self, viewport: SettledViewport) -> ReconcileReport {
        if let Err(e) = self.persistence.save(&viewport.state) {
            log::warn!("could not save viewport: {}", e);
        }
        self.viewport = Some(viewport);
        self.refresh_layers(&viewport.bounds)
    }

    fn refresh_layers(&mut self, bounds: &LatLngBounds) -> ReconcileReport {
        self.visible_regions = self.evaluator.evaluate(bounds, &self.regions);
        self.activation.reconcile(&self.visible_regions)
    }

    /// The user picked another base layer; later saves and removals target it
    pub fn on_base_layer_change(&mut self, layer_id: &str) -> Result<()> {
        self.activation.switch_base_layer(layer_id)
    }

    /// Saves the current layer over the current view.
    ///
    /// Fails only when called before [`start`](Self::start); every other
    /// outcome is reported through the returned operation.
    pub async fn save_active_layer(&self) -> Result<CacheOperation> {
        let bounds = self
            .viewport
            .map(|v| v.bounds)
            .ok_or_else(|| Error::Config("session has not been started".to_string()))?;

        let orchestrator = Arc::clone(&self.orchestrator);
        match self.target_layer() {
            Some(layer) => Ok(orchestrator.request_save(&layer, &bounds).await),
            None => Ok(orchestrator.reject_without_layer(CacheKind::Save)),
        }
    }

    /// Deletes the cached tiles of the current layer
    pub async fn remove_active_layer(&self) -> CacheOperation {
        let orchestrator = Arc::clone(&self.orchestrator);
        match self.target_layer() {
            Some(layer) => orchestrator.request_remove(&layer).await,
            None => orchestrator.reject_without_layer(CacheKind::Remove),
        }
    }

    fn target_layer(&self) -> Option<LayerDescriptor> {
        self.activation.current_base().cloned()
    }

    pub async fn refresh_storage(&self) -> StorageReport {
        self.orchestrator.storage().snapshot().await
    }

    pub fn config(&self) -> &OfflineMapConfig {
        &self.config
    }

    pub fn activation(&self) -> &ActivationController {
        &self.activation
    }

    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    /// Region names touched by the last evaluated view
    pub fn visible_regions(&self) -> &BTreeSet<String> {
        &self.visible_regions
    }

    pub fn current_viewport(&self) -> Option<&SettledViewport> {
        self.viewport.as_ref()
    }

    pub fn orchestrator(&self) -> &Arc<CacheOrchestrator> {
        &self.orchestrator
    }

    pub fn notifications(&self) -> &Arc<NotificationSurface> {
        self.orchestrator.notifications()
    }

    pub fn storage(&self) -> &Arc<StorageQuotaReporter> {
        self.orchestrator.storage()
    }
}
