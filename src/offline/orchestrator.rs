//! Save/remove orchestration for one or many layers.
//!
//! A request runs the pre-flight guard, asks for confirmation, claims the
//! (layer, kind) slot and then drives the backend's event stream through
//! [`CacheOrchestrator::handle_event`]. State lives behind a mutex that is
//! never held across an await, so requests for different layers can run
//! concurrently on one orchestrator.

use crate::{
    core::{config::SaveControlConfig, geo::LatLngBounds},
    layers::descriptor::{LayerDescriptor, LayerId},
    offline::{
        confirm::{ConfirmPrompt, Confirmer},
        operation::{
            CacheKind, CacheOperation, FailureKind, OperationId, OperationStatus, RejectReason,
            Transition,
        },
    },
    prelude::{HashMap, HashSet},
    storage::quota::StorageQuotaReporter,
    tiles::{
        backend::{SaveJob, TileCacheBackend},
        events::{CacheEvent, CacheFailure},
    },
    ui::notification::NotificationSurface,
};
use futures::{stream::BoxStream, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard};

/// Follow-up work requested by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventEffect {
    None,
    /// Usage changed; take a new storage snapshot
    RefreshStorage,
}

#[derive(Debug, Default)]
struct OrchestratorState {
    next_id: u64,
    /// (layer, kind) pairs currently holding the execution slot
    running: HashSet<(LayerId, CacheKind)>,
    /// Live operations; dropped once terminal
    operations: HashMap<OperationId, CacheOperation>,
}

pub struct CacheOrchestrator {
    backend: Arc<dyn TileCacheBackend>,
    confirmer: Arc<dyn Confirmer>,
    notifications: Arc<NotificationSurface>,
    storage: Arc<StorageQuotaReporter>,
    config: SaveControlConfig,
    state: Mutex<OrchestratorState>,
}

impl CacheOrchestrator {
    pub fn new(
        backend: Arc<dyn TileCacheBackend>,
        confirmer: Arc<dyn Confirmer>,
        notifications: Arc<NotificationSurface>,
        storage: Arc<StorageQuotaReporter>,
        config: SaveControlConfig,
    ) -> Self {
        Self {
            backend,
            confirmer,
            notifications,
            storage,
            config,
            state: Mutex::new(OrchestratorState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OrchestratorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn notifications(&self) -> &Arc<NotificationSurface> {
        &self.notifications
    }

    pub fn storage(&self) -> &Arc<StorageQuotaReporter> {
        &self.storage
    }

    /// A copy of a live operation
    pub fn operation(&self, id: OperationId) -> Option<CacheOperation> {
        self.lock().operations.get(&id).cloned()
    }

    /// Whether a `kind` operation on `layer_id` holds the execution slot
    pub fn is_running(&self, layer_id: &str, kind: CacheKind) -> bool {
        self.lock().running.contains(&(layer_id.to_string(), kind))
    }

    /// Saves the tiles of `layer` covering `bounds`, returning the terminal
    /// operation.
    pub async fn request_save(
        &self,
        layer: &LayerDescriptor,
        bounds: &LatLngBounds,
    ) -> CacheOperation {
        let id = self.create(layer, CacheKind::Save);
        if self.is_running(&layer.id, CacheKind::Save) {
            return self.reject(id, RejectReason::AlreadyInProgress);
        }

        let zoom_levels = layer.save_zoom_levels(&self.config.zoom_levels);
        if zoom_levels.is_empty() {
            return self.reject(id, RejectReason::NoZoomLevels);
        }
        let count = self.backend.count_tiles(layer, bounds, &zoom_levels);
        self.update(id, |op| op.estimated_units = Some(count));
        log::debug!(
            "{}: {} tiles of '{}' at zooms {:?}",
            id,
            count,
            layer.id,
            zoom_levels
        );

        if count > self.config.max_tiles {
            return self.reject(
                id,
                RejectReason::TooManyTiles {
                    count,
                    limit: self.config.max_tiles,
                },
            );
        }

        let prompt = ConfirmPrompt {
            layer_name: layer.name.clone(),
            kind: CacheKind::Save,
            tile_count: Some(count),
        };
        if !self.confirmer.confirm(&prompt).await {
            return self.reject(id, RejectReason::UserDeclined);
        }
        if let Err(op) = self.confirm_and_claim(id) {
            return op;
        }

        let job = SaveJob {
            layer: layer.clone(),
            bounds: *bounds,
            zoom_levels,
        };
        let events = self.backend.save_tiles(job);
        self.drive(id, events).await
    }

    /// Deletes every cached tile of `layer`, returning the terminal operation
    pub async fn request_remove(&self, layer: &LayerDescriptor) -> CacheOperation {
        let id = self.create(layer, CacheKind::Remove);
        if self.is_running(&layer.id, CacheKind::Remove) {
            return self.reject(id, RejectReason::AlreadyInProgress);
        }

        let prompt = ConfirmPrompt {
            layer_name: layer.name.clone(),
            kind: CacheKind::Remove,
            tile_count: None,
        };
        if !self.confirmer.confirm(&prompt).await {
            return self.reject(id, RejectReason::UserDeclined);
        }
        if let Err(op) = self.confirm_and_claim(id) {
            return op;
        }

        let events = self.backend.remove_tiles(layer);
        self.drive(id, events).await
    }

    /// Answers a save/remove request made while no layer is selected
    pub fn reject_without_layer(&self, kind: CacheKind) -> CacheOperation {
        let id = self.next_id();
        let op = CacheOperation::without_layer(id, kind);
        self.notifications
            .show("No map layer is selected. Choose a layer and retry.", false);
        op
    }

    /// Feeds one backend event into the operation's state machine.
    ///
    /// Events the current state does not accept are logged and ignored.
    pub fn handle_event(&self, id: OperationId, event: CacheEvent) -> EventEffect {
        let event_name = event.name();
        let mut state = self.lock();
        let Some(op) = state.operations.get_mut(&id) else {
            log::warn!("{}: '{}' for an unknown or finished operation", id, event_name);
            return EventEffect::None;
        };

        let (transition, failure) = match event {
            CacheEvent::Start { total } => {
                if let Some(estimate) = op.estimated_units.filter(|e| *e != total) {
                    log::warn!(
                        "{}: backend enumerates {} tiles, pre-flight counted {}",
                        id,
                        total,
                        estimate
                    );
                }
                (Transition::Start { total }, None)
            }
            CacheEvent::UnitComplete => (Transition::UnitComplete, None),
            CacheEvent::End => (Transition::Finish, None),
            CacheEvent::UnitsRemoved { count } => (Transition::Removed { count }, None),
            CacheEvent::Error(failure) => {
                (Transition::Fail(FailureKind::classify(&failure)), Some(failure))
            }
        };

        if let Err(e) = op.apply(transition) {
            log::warn!("ignored cache event: {}", e);
            return EventEffect::None;
        }

        let (message, is_error, progress) = describe(op, failure.as_ref());
        let effect = match op.status {
            OperationStatus::Completed | OperationStatus::Failed(_) => EventEffect::RefreshStorage,
            _ => EventEffect::None,
        };
        if op.is_terminal() {
            let key = (op.layer_id.clone(), op.kind);
            state.running.remove(&key);
        }
        drop(state);

        if progress {
            self.notifications.show_progress(message);
        } else {
            self.notifications.show(message, is_error);
        }
        effect
    }

    fn next_id(&self) -> OperationId {
        let mut state = self.lock();
        state.next_id += 1;
        OperationId(state.next_id)
    }

    fn create(&self, layer: &LayerDescriptor, kind: CacheKind) -> OperationId {
        let id = self.next_id();
        let op = CacheOperation::new(id, layer, kind);
        log::debug!("{}: {} requested for '{}'", id, kind, layer.id);
        self.lock().operations.insert(id, op);
        id
    }

    fn update(&self, id: OperationId, apply: impl FnOnce(&mut CacheOperation)) {
        if let Some(op) = self.lock().operations.get_mut(&id) {
            apply(op);
        }
    }

    /// Moves to `Confirmed` and takes the (layer, kind) slot, or rejects the
    /// operation when another one took it while the user was deciding.
    fn confirm_and_claim(&self, id: OperationId) -> Result<(), CacheOperation> {
        let mut state = self.lock();
        let OrchestratorState {
            running, operations, ..
        } = &mut *state;

        let Some(op) = operations.get_mut(&id) else {
            return Ok(());
        };
        if let Err(e) = op.apply(Transition::Confirm) {
            log::warn!("{}", e);
        }

        let key = (op.layer_id.clone(), op.kind);
        if running.contains(&key) {
            drop(state);
            return Err(self.reject(id, RejectReason::AlreadyInProgress));
        }
        running.insert(key);
        Ok(())
    }

    fn reject(&self, id: OperationId, reason: RejectReason) -> CacheOperation {
        let op = {
            let mut state = self.lock();
            let Some(mut op) = state.operations.remove(&id) else {
                return CacheOperation::without_layer(id, CacheKind::Save);
            };
            if let Err(e) = op.apply(Transition::Reject(reason.clone())) {
                log::warn!("{}", e);
            }
            op
        };

        match &reason {
            RejectReason::TooManyTiles { count, limit } => self.notifications.show(
                format!(
                    "[{}] Too many tiles ({}, limit {}). Zoom in to narrow the area and retry.",
                    op.layer_name, count, limit
                ),
                true,
            ),
            RejectReason::AlreadyInProgress => self.notifications.show(
                format!("[{}] A {} is already in progress.", op.layer_name, op.kind),
                false,
            ),
            RejectReason::UserDeclined => {
                log::debug!("{}: declined by the user", id);
                return op;
            }
            RejectReason::NoActiveLayer => self
                .notifications
                .show("No map layer is selected. Choose a layer and retry.", false),
            RejectReason::NoZoomLevels => self.notifications.show(
                format!(
                    "[{}] This layer cannot be saved at the configured zoom levels.",
                    op.layer_name
                ),
                true,
            ),
        };
        op
    }

    async fn drive(&self, id: OperationId, mut events: BoxStream<'static, CacheEvent>) -> CacheOperation {
        while let Some(event) = events.next().await {
            if self.handle_event(id, event) == EventEffect::RefreshStorage {
                self.storage.snapshot().await;
            }
            if self.operation(id).map_or(true, |op| op.is_terminal()) {
                break;
            }
        }

        // A stream that ends without a terminal event is a failed operation
        if self.operation(id).is_some_and(|op| !op.is_terminal()) {
            log::warn!("{}: backend stream ended early", id);
            if self.handle_event(id, CacheEvent::Error(CacheFailure::unspecified()))
                == EventEffect::RefreshStorage
            {
                self.storage.snapshot().await;
            }
        }

        self.finish(id)
    }

    /// Drops a terminal operation from the live set and returns it
    fn finish(&self, id: OperationId) -> CacheOperation {
        let mut state = self.lock();
        match state.operations.remove(&id) {
            Some(op) => {
                log::info!(
                    "{}: {} of '{}' finished as {} ({}/{} tiles)",
                    id,
                    op.kind,
                    op.layer_id,
                    op.status.name(),
                    op.completed_units,
                    op.total_units
                );
                if !op.is_terminal() {
                    state.running.remove(&(op.layer_id.clone(), op.kind));
                }
                op
            }
            None => CacheOperation::without_layer(id, CacheKind::Save),
        }
    }
}

/// Status line text for the operation's new state: (message, error, progress)
fn describe(op: &CacheOperation, failure: Option<&CacheFailure>) -> (String, bool, bool) {
    let name = &op.layer_name;
    match (&op.status, op.kind) {
        (OperationStatus::InProgress, _) if op.completed_units == 0 => (
            format!("[{}] Downloading {} tiles...", name, op.total_units),
            false,
            false,
        ),
        (OperationStatus::InProgress, _) => (
            format!(
                "[{}] Downloading: {}% ({}/{})",
                name,
                op.percent(),
                op.completed_units,
                op.total_units
            ),
            false,
            true,
        ),
        (OperationStatus::Completed, CacheKind::Save) => {
            (format!("[{}] Done ({} tiles)", name, op.total_units), false, false)
        }
        (OperationStatus::Completed, CacheKind::Remove) => (
            format!("[{}] Removed {} cached tiles", name, op.completed_units),
            false,
            false,
        ),
        (OperationStatus::Failed(FailureKind::Transport), _) => (
            format!(
                "[{}] Network error: could not reach the tile server ({})",
                name,
                failure
                    .and_then(|f| f.message.as_deref())
                    .unwrap_or("communication failure")
            ),
            true,
            false,
        ),
        (OperationStatus::Failed(FailureKind::Unknown), _) => (
            format!(
                "[{}] Error: {}",
                name,
                failure
                    .and_then(|f| f.message.as_deref())
                    .unwrap_or("communication failure")
            ),
            true,
            false,
        ),
        (status, _) => (format!("[{}] {}", name, status.name()), false, false),
    }
}
