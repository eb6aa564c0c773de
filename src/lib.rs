//! # fieldmap
//!
//! Offline tile-cache orchestration and viewport-driven layer activation for
//! field data collection map viewers.
//!
//! The crate owns the decisions a Leaflet-style viewer makes around its map:
//! which region-gated background layers are offered for the current view,
//! user-confirmed bulk tile downloads with a size guard, progress and failure
//! reporting on a single status line, the last viewport across sessions, and
//! storage consumption against the browser quota. Rendering, tile fetching and
//! geometry are collaborators plugged in through traits.

pub mod core;
pub mod layers;
pub mod offline;
pub mod persistence;
pub mod prelude;
pub mod regions;
pub mod storage;
pub mod tiles;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    builder::OfflineMapBuilder,
    config::{LayerConfig, OfflineMapConfig},
    geo::{LatLng, LatLngBounds, TileCoord},
    map::OfflineMap,
    viewport::{SettledViewport, ViewportState},
};

pub use layers::{
    activation::ActivationController,
    descriptor::{LayerDescriptor, LayerKind},
    manager::{LayerControl, MapSurface},
    registry::LayerRegistry,
};

pub use offline::{
    confirm::{ConfirmPrompt, Confirmer},
    operation::{CacheKind, CacheOperation, FailureKind, OperationStatus, RejectReason},
    orchestrator::CacheOrchestrator,
};

pub use regions::{
    evaluator::{GeoIntersects, IntersectionPredicate, RegionVisibilityEvaluator},
    region::{BoundarySource, Region, RegionSet},
};

pub use tiles::{
    backend::{SaveJob, TileCacheBackend},
    events::{CacheEvent, CacheFailure},
};

pub use persistence::{store::KeyValueStore, viewport::ViewportPersistence};

pub use storage::quota::{StorageEstimate, StorageEstimator, StorageQuotaReporter, StorageReport};

pub use ui::notification::{Notice, NoticeKind, NotificationSurface};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Store error: {0}")]
    Store(#[from] persistence::store::StoreError),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Installs `env_logger` as the `log` backend, honouring `RUST_LOG`.
///
/// Safe to call more than once.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
