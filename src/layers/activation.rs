//! Region-driven activation of dynamic layers.
//!
//! Every settle event re-derives which dynamic layers should be selectable
//! from the visible region names alone, so a missed event never leaves a stale
//! layer behind. The controller also owns the reference to the layer currently
//! drawn as the base map; it changes only through
//! [`ActivationController::switch_base_layer`] or when reconciliation removes
//! that layer.

use crate::{
    layers::{
        descriptor::{LayerDescriptor, LayerId},
        manager::MapSurface,
        registry::LayerRegistry,
    },
    Error, Result,
};
use std::collections::BTreeSet;

/// What a reconciliation pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<LayerId>,
    pub removed: Vec<LayerId>,
}

impl ReconcileReport {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

pub struct ActivationController {
    registry: LayerRegistry,
    surface: Box<dyn MapSurface>,
    current_base: Option<LayerId>,
}

impl ActivationController {
    pub fn new(registry: LayerRegistry, surface: Box<dyn MapSurface>) -> Self {
        Self {
            registry,
            surface,
            current_base: None,
        }
    }

    /// Offers every base layer and draws `default_base` when given
    pub fn initialize(&mut self, default_base: Option<&str>) -> Result<()> {
        let Self {
            registry, surface, ..
        } = self;

        for layer in registry.iter_mut().filter(|l| !l.is_dynamic()) {
            surface.register_selectable(layer);
            layer.is_active = true;
        }

        match default_base {
            Some(id) => self.switch_base_layer(id),
            None => Ok(()),
        }
    }

    /// Brings dynamic layer membership in line with `visible_regions`.
    ///
    /// Idempotent: calling it again with the same set changes nothing.
    pub fn reconcile(&mut self, visible_regions: &BTreeSet<String>) -> ReconcileReport {
        let Self {
            registry,
            surface,
            current_base,
        } = self;
        let mut report = ReconcileReport::default();

        for layer in registry.iter_mut().filter(|l| l.is_dynamic()) {
            let visible = layer.matches_any_region(visible_regions.iter().map(String::as_str));

            match (layer.is_active, visible) {
                (false, true) => {
                    surface.register_selectable(layer);
                    layer.is_active = true;
                    report.added.push(layer.id.clone());
                }
                (true, false) => {
                    surface.unregister_selectable(&layer.id);
                    if surface.has_layer(&layer.id) {
                        surface.remove_from_surface(&layer.id);
                    }
                    if current_base.as_deref() == Some(layer.id.as_str()) {
                        log::info!("current layer '{}' left the visible regions", layer.id);
                        *current_base = None;
                    }
                    layer.is_active = false;
                    report.removed.push(layer.id.clone());
                }
                _ => {}
            }
        }

        if !report.is_unchanged() {
            log::debug!(
                "reconciled dynamic layers: +{:?} -{:?}",
                report.added,
                report.removed
            );
        }
        report
    }

    /// Makes `layer_id` the drawn base layer.
    ///
    /// The layer must currently be selectable.
    pub fn switch_base_layer(&mut self, layer_id: &str) -> Result<()> {
        let layer = self
            .registry
            .get(layer_id)
            .ok_or_else(|| Error::Layer(format!("unknown layer '{}'", layer_id)))?;
        if !layer.is_active() {
            return Err(Error::Layer(format!(
                "layer '{}' is not selectable in the current view",
                layer_id
            )));
        }

        if let Some(previous) = self.current_base.take() {
            if previous != layer_id && self.surface.has_layer(&previous) {
                self.surface.remove_from_surface(&previous);
            }
        }
        if !self.surface.has_layer(layer_id) {
            self.surface.add_to_surface(layer_id);
        }
        self.current_base = Some(layer_id.to_string());
        log::debug!("base layer is now '{}'", layer_id);
        Ok(())
    }

    /// The layer currently drawn as the base map, if any
    pub fn current_base(&self) -> Option<&LayerDescriptor> {
        self.current_base
            .as_deref()
            .and_then(|id| self.registry.get(id))
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn surface(&self) -> &dyn MapSurface {
        self.surface.as_ref()
    }

    /// Looks up a layer that is currently selectable
    pub fn active_layer(&self, layer_id: &str) -> Option<&LayerDescriptor> {
        self.registry.get(layer_id).filter(|l| l.is_active())
    }

    #[cfg(test)]
    pub(crate) fn registry_mut(&mut self) -> &mut LayerRegistry {
        &mut self.registry
    }
}
