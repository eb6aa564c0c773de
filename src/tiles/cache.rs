//! Reference tile cache backend.
//!
//! Fetches every tile of a save job through a [`TileFetcher`] and keeps the
//! blobs in a keyed in-memory store shared by clones. Hosts with their own
//! persistent blob storage implement [`TileCacheBackend`] directly.

use crate::{
    core::geo::TileCoord,
    layers::descriptor::{LayerDescriptor, LayerId},
    prelude::HashMap,
    tiles::{
        backend::{SaveJob, TileCacheBackend},
        estimate,
        events::{CacheEvent, CacheFailure},
        source::TileSource,
    },
};
use async_trait::async_trait;
use futures::{
    future,
    stream::{self, BoxStream},
    StreamExt,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// Downloads the bytes of one tile
#[async_trait]
pub trait TileFetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CacheFailure>;
}

/// Fetches tiles over HTTP with reqwest
#[derive(Debug, Clone, Default)]
pub struct HttpTileFetcher {
    client: reqwest::Client,
}

impl HttpTileFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CacheFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(classify_reqwest_error)?;
        let bytes = response.bytes().await.map_err(classify_reqwest_error)?;
        Ok(bytes.to_vec())
    }
}

/// HTTP status, body and decode errors came back from the server; anything
/// else never got a usable response.
fn classify_reqwest_error(err: reqwest::Error) -> CacheFailure {
    if err.is_status() || err.is_body() || err.is_decode() {
        CacheFailure::new(err.to_string())
    } else {
        CacheFailure::transport(err.to_string())
    }
}

/// Keyed blob storage for cached tiles, shared between clones
#[derive(Debug, Clone, Default)]
pub struct TileStore {
    tiles: Arc<Mutex<HashMap<(LayerId, TileCoord), Arc<Vec<u8>>>>>,
}

impl TileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(LayerId, TileCoord), Arc<Vec<u8>>>> {
        self.tiles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a tile for a layer
    pub fn put(&self, layer_id: &str, coord: TileCoord, data: Vec<u8>) {
        self.lock().insert((layer_id.to_string(), coord), Arc::new(data));
    }

    /// Get a stored tile
    pub fn get(&self, layer_id: &str, coord: TileCoord) -> Option<Arc<Vec<u8>>> {
        self.lock().get(&(layer_id.to_string(), coord)).cloned()
    }

    pub fn contains(&self, layer_id: &str, coord: TileCoord) -> bool {
        self.lock().contains_key(&(layer_id.to_string(), coord))
    }

    /// Remove every tile of a layer, returning how many were removed
    pub fn remove_layer(&self, layer_id: &str) -> usize {
        let mut tiles = self.lock();
        let before = tiles.len();
        tiles.retain(|(layer, _), _| layer != layer_id);
        before - tiles.len()
    }

    /// Number of tiles stored for a layer
    pub fn layer_len(&self, layer_id: &str) -> usize {
        self.lock().keys().filter(|(layer, _)| layer == layer_id).count()
    }

    /// Total bytes held by the store
    pub fn size_bytes(&self) -> u64 {
        self.lock().values().map(|data| data.len() as u64).sum()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type SaveState<F> = (std::vec::IntoIter<TileCoord>, Arc<F>, TileStore, LayerDescriptor);

/// Tile cache backend that fetches through `F` into a [`TileStore`]
pub struct OfflineTileCache<F: TileFetcher> {
    fetcher: Arc<F>,
    store: TileStore,
}

impl<F: TileFetcher> OfflineTileCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_store(fetcher, TileStore::new())
    }

    pub fn with_store(fetcher: F, store: TileStore) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            store,
        }
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }
}

impl OfflineTileCache<HttpTileFetcher> {
    pub fn http() -> Self {
        Self::new(HttpTileFetcher::default())
    }
}

impl<F: TileFetcher> TileCacheBackend for OfflineTileCache<F> {
    fn save_tiles(&self, job: SaveJob) -> BoxStream<'static, CacheEvent> {
        let tiles = estimate::tiles_in_bounds(&job.bounds, &job.zoom_levels);
        log::debug!("saving {} tiles of layer '{}'", tiles.len(), job.layer.id);

        let start = stream::once(future::ready(CacheEvent::Start { total: tiles.len() }));
        let initial: Option<SaveState<F>> = Some((
            tiles.into_iter(),
            Arc::clone(&self.fetcher),
            self.store.clone(),
            job.layer,
        ));

        let progress = stream::unfold(initial, |state| async move {
            let (mut pending, fetcher, store, layer) = state?;
            let Some(coord) = pending.next() else {
                return Some((CacheEvent::End, None));
            };

            match fetcher.fetch(&layer.source.url(coord)).await {
                Ok(data) => {
                    store.put(&layer.id, coord, data);
                    Some((CacheEvent::UnitComplete, Some((pending, fetcher, store, layer))))
                }
                Err(failure) => {
                    log::warn!("tile {:?} of layer '{}' failed: {}", coord, layer.id, failure);
                    Some((CacheEvent::Error(failure), None))
                }
            }
        });

        start.chain(progress).boxed()
    }

    fn remove_tiles(&self, layer: &LayerDescriptor) -> BoxStream<'static, CacheEvent> {
        let count = self.store.remove_layer(&layer.id);
        log::debug!("removed {} tiles of layer '{}'", count, layer.id);
        stream::once(future::ready(CacheEvent::UnitsRemoved { count })).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{config::LayerConfig, geo::LatLngBounds};
    use crate::layers::descriptor::LayerKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves a fixed payload and fails from the `fail_at`-th request on
    struct ScriptedFetcher {
        calls: AtomicUsize,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl TileFetcher for ScriptedFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, CacheFailure> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_at {
                Some(n) if call >= n => Err(CacheFailure::transport("Failed to fetch")),
                _ => Ok(vec![0u8; 16]),
            }
        }
    }

    fn layer() -> LayerDescriptor {
        LayerDescriptor::from_config(
            &LayerConfig::new("gsi-std", "地理院地図", "https://example.org/{z}/{x}/{y}.png"),
            LayerKind::Base,
        )
    }

    /// Bounds strictly inside one z16 tile
    fn one_tile_job() -> SaveJob {
        let b = TileCoord::new(58210, 25803, 16).bounds();
        SaveJob {
            layer: layer(),
            bounds: LatLngBounds::from_coords(
                b.south() + 1e-7,
                b.west() + 1e-7,
                b.north() - 1e-7,
                b.east() - 1e-7,
            ),
            zoom_levels: vec![16, 17],
        }
    }

    #[tokio::test]
    async fn test_save_emits_ordered_lifecycle() {
        let cache = OfflineTileCache::new(ScriptedFetcher {
            calls: AtomicUsize::new(0),
            fail_at: None,
        });

        let events: Vec<CacheEvent> = cache.save_tiles(one_tile_job()).collect().await;

        assert_eq!(events.first(), Some(&CacheEvent::Start { total: 5 }));
        assert_eq!(events.iter().filter(|e| **e == CacheEvent::UnitComplete).count(), 5);
        assert_eq!(events.last(), Some(&CacheEvent::End));
        assert_eq!(cache.store().layer_len("gsi-std"), 5);
        assert_eq!(cache.store().size_bytes(), 80);
    }

    #[tokio::test]
    async fn test_save_stops_at_first_failure() {
        let cache = OfflineTileCache::new(ScriptedFetcher {
            calls: AtomicUsize::new(0),
            fail_at: Some(2),
        });

        let events: Vec<CacheEvent> = cache.save_tiles(one_tile_job()).collect().await;

        assert_eq!(events.len(), 4);
        assert!(matches!(events.last(), Some(CacheEvent::Error(f)) if f.transport));
        assert_eq!(cache.store().len(), 2);
    }

    #[tokio::test]
    async fn test_remove_reports_deleted_count() {
        let cache = OfflineTileCache::new(ScriptedFetcher {
            calls: AtomicUsize::new(0),
            fail_at: None,
        });
        cache.store().put("gsi-std", TileCoord::new(1, 1, 2), vec![1]);
        cache.store().put("gsi-std", TileCoord::new(1, 2, 2), vec![1]);
        cache.store().put("osm", TileCoord::new(1, 1, 2), vec![1]);

        let events: Vec<CacheEvent> = cache.remove_tiles(&layer()).collect().await;

        assert_eq!(events, vec![CacheEvent::UnitsRemoved { count: 2 }]);
        assert!(cache.store().contains("osm", TileCoord::new(1, 1, 2)));
        assert_eq!(cache.store().len(), 1);
    }
}
