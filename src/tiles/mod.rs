pub mod backend;
pub mod cache;
pub mod estimate;
pub mod events;
pub mod source;

// Re-exports for convenience
pub use backend::{SaveJob, TileCacheBackend};
pub use cache::{HttpTileFetcher, OfflineTileCache, TileFetcher, TileStore};
pub use events::{CacheEvent, CacheFailure};
pub use source::{TileSource, UrlTemplate};
