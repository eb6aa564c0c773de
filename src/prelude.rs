//! Prelude module for common fieldmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use fieldmap::prelude::*;`

pub use crate::core::{
    builder::OfflineMapBuilder,
    config::{LayerConfig, NotificationConfig, OfflineMapConfig, SaveControlConfig},
    geo::{LatLng, LatLngBounds, TileCoord},
    map::OfflineMap,
    viewport::{SettledViewport, ViewportState},
};

pub use crate::layers::{
    activation::{ActivationController, ReconcileReport},
    descriptor::{LayerDescriptor, LayerId, LayerKind},
    manager::{LayerControl, MapSurface},
    registry::LayerRegistry,
};

pub use crate::regions::{
    evaluator::{GeoIntersects, GeometryError, IntersectionPredicate, RegionVisibilityEvaluator},
    region::{BoundarySource, FileBoundarySource, HttpBoundarySource, Region, RegionSet},
};

pub use crate::offline::{
    confirm::{AutoConfirm, ConfirmPrompt, Confirmer},
    operation::{
        CacheKind, CacheOperation, FailureKind, OperationId, OperationStatus, RejectReason,
    },
    orchestrator::{CacheOrchestrator, EventEffect},
};

pub use crate::tiles::{
    backend::{SaveJob, TileCacheBackend},
    cache::{HttpTileFetcher, OfflineTileCache, TileFetcher, TileStore},
    events::{CacheEvent, CacheFailure},
    estimate::{count_tiles, tiles_in_bounds},
    source::{TileSource, UrlTemplate},
};

pub use crate::persistence::{
    store::{FileStore, KeyValueStore, MemoryStore, StoreError},
    viewport::ViewportPersistence,
};

pub use crate::storage::quota::{
    StorageError, StorageEstimate, StorageEstimator, StorageQuotaReporter, StorageReport,
    StorageSnapshot, TileStoreEstimator,
};

pub use crate::ui::{
    format::{format_bytes, format_percent},
    notification::{Notice, NoticeKind, NotificationSurface},
};

pub use crate::{Error, Result};

pub use instant::Instant;
pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};

pub use futures::{stream::BoxStream, Future, Stream, StreamExt};
