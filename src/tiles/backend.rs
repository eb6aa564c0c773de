use crate::{
    core::geo::LatLngBounds,
    layers::descriptor::LayerDescriptor,
    tiles::{estimate, events::CacheEvent},
};
use futures::stream::BoxStream;

/// Everything a backend needs to save one layer for offline use
#[derive(Debug, Clone, PartialEq)]
pub struct SaveJob {
    pub layer: LayerDescriptor,
    pub bounds: LatLngBounds,
    pub zoom_levels: Vec<u8>,
}

/// The tile fetch/store collaborator.
///
/// Backends own the network fetch and the keyed blob storage. They report
/// progress as a stream of [`CacheEvent`]s which the orchestrator consumes in
/// order. Streams must end after their terminal event.
pub trait TileCacheBackend: Send + Sync {
    /// Tiles a save of `layer` over `bounds` at `zoom_levels` would fetch.
    ///
    /// Used by the pre-flight guard. The default enumerates the slippy tile
    /// ranges; backends with their own enumeration should override it.
    fn count_tiles(&self, layer: &LayerDescriptor, bounds: &LatLngBounds, zoom_levels: &[u8]) -> usize {
        let _ = layer;
        estimate::count_tiles(bounds, zoom_levels)
    }

    /// Starts fetching and storing the tiles of `job`
    fn save_tiles(&self, job: SaveJob) -> BoxStream<'static, CacheEvent>;

    /// Starts deleting every stored tile of `layer`
    fn remove_tiles(&self, layer: &LayerDescriptor) -> BoxStream<'static, CacheEvent>;
}
