use crate::layers::descriptor::{LayerDescriptor, LayerId, LayerKind};

/// The rendering collaborator's layer seam.
///
/// `register_selectable`/`unregister_selectable` manage the entries a user can
/// pick in the layer control; `add_to_surface`/`remove_from_surface` manage
/// what is actually drawn.
pub trait MapSurface: Send + Sync {
    fn register_selectable(&mut self, layer: &LayerDescriptor);

    fn unregister_selectable(&mut self, layer_id: &str);

    fn add_to_surface(&mut self, layer_id: &str);

    fn remove_from_surface(&mut self, layer_id: &str);

    /// Whether the layer is currently drawn
    fn has_layer(&self, layer_id: &str) -> bool;

    /// Whether the layer is currently offered in the layer control
    fn is_selectable(&self, layer_id: &str) -> bool;
}

/// Entry of the layer control
#[derive(Debug, Clone, PartialEq)]
pub struct SelectableEntry {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
}

/// In-memory layer control and surface, for headless hosts and tests
#[derive(Debug, Default)]
pub struct LayerControl {
    /// Selectable layers in registration order
    selectable: Vec<SelectableEntry>,
    /// Drawn layer IDs in the order they were added
    rendered: Vec<LayerId>,
}

impl LayerControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries offered to the user, in registration order
    pub fn selectable(&self) -> &[SelectableEntry] {
        &self.selectable
    }

    /// Lists the drawn layer IDs
    pub fn rendered(&self) -> &[LayerId] {
        &self.rendered
    }

    pub fn len(&self) -> usize {
        self.selectable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectable.is_empty()
    }
}

impl MapSurface for LayerControl {
    fn register_selectable(&mut self, layer: &LayerDescriptor) {
        if self.is_selectable(&layer.id) {
            return;
        }
        self.selectable.push(SelectableEntry {
            id: layer.id.clone(),
            name: layer.name.clone(),
            kind: layer.kind,
        });
    }

    fn unregister_selectable(&mut self, layer_id: &str) {
        self.selectable.retain(|entry| entry.id != layer_id);
    }

    fn add_to_surface(&mut self, layer_id: &str) {
        if !self.has_layer(layer_id) {
            self.rendered.push(layer_id.to_string());
        }
    }

    fn remove_from_surface(&mut self, layer_id: &str) {
        self.rendered.retain(|id| id != layer_id);
    }

    fn has_layer(&self, layer_id: &str) -> bool {
        self.rendered.iter().any(|id| id == layer_id)
    }

    fn is_selectable(&self, layer_id: &str) -> bool {
        self.selectable.iter().any(|entry| entry.id == layer_id)
    }
}
