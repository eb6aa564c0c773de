//! Storage consumption against the host's quota.
//!
//! The host's storage-usage API sits behind [`StorageEstimator`]. A missing
//! or failing API never propagates: the reporter answers
//! [`StorageReport::Unsupported`] instead.

use crate::{
    tiles::cache::TileStore,
    ui::format::{format_bytes, format_percent},
};
use async_trait::async_trait;
use instant::Instant;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Raw answer of the storage-usage API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageEstimate {
    pub usage: u64,
    pub quota: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage estimate API is not available")]
    Unsupported,

    #[error("storage query failed: {0}")]
    Query(String),
}

/// Host storage-usage API (`navigator.storage` in browsers)
#[async_trait]
pub trait StorageEstimator: Send + Sync {
    async fn estimate(&self) -> Result<StorageEstimate, StorageError>;

    /// Whether storage is already marked persistent
    async fn persisted(&self) -> Result<bool, StorageError> {
        Err(StorageError::Unsupported)
    }

    /// Asks the host to keep storage under pressure; returns whether granted
    async fn persist(&self) -> Result<bool, StorageError> {
        Err(StorageError::Unsupported)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageSnapshot {
    pub used_bytes: u64,
    pub quota_bytes: u64,
    pub captured_at: Instant,
}

impl StorageSnapshot {
    pub fn ratio_label(&self) -> String {
        format_percent(self.used_bytes, self.quota_bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StorageReport {
    Available(StorageSnapshot),
    /// The storage-usage API is missing or failed
    Unsupported,
}

impl StorageReport {
    pub fn snapshot(&self) -> Option<&StorageSnapshot> {
        match self {
            StorageReport::Available(snapshot) => Some(snapshot),
            StorageReport::Unsupported => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, StorageReport::Available(_))
    }

    /// e.g. `Usage: 1.5 MB (0.1%)`
    pub fn usage_label(&self) -> String {
        match self {
            StorageReport::Available(s) => {
                format!("Usage: {} ({})", format_bytes(s.used_bytes), s.ratio_label())
            }
            StorageReport::Unsupported => "Storage: unsupported".to_string(),
        }
    }

    /// e.g. `Quota: 2 GB`
    pub fn quota_label(&self) -> String {
        match self {
            StorageReport::Available(s) => format!("Quota: {}", format_bytes(s.quota_bytes)),
            StorageReport::Unsupported => "Storage: unsupported".to_string(),
        }
    }
}

/// Queries the estimator on demand and remembers the latest answer
pub struct StorageQuotaReporter {
    estimator: Option<Arc<dyn StorageEstimator>>,
    latest: Mutex<Option<StorageReport>>,
}

impl StorageQuotaReporter {
    pub fn new(estimator: Arc<dyn StorageEstimator>) -> Self {
        Self {
            estimator: Some(estimator),
            latest: Mutex::new(None),
        }
    }

    /// A reporter for hosts without any storage-usage API
    pub fn unsupported() -> Self {
        Self {
            estimator: None,
            latest: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<StorageReport>> {
        self.latest.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queries current usage; never fails
    pub async fn snapshot(&self) -> StorageReport {
        let report = match &self.estimator {
            Some(estimator) => match estimator.estimate().await {
                Ok(estimate) => StorageReport::Available(StorageSnapshot {
                    used_bytes: estimate.usage,
                    quota_bytes: estimate.quota,
                    captured_at: Instant::now(),
                }),
                Err(e) => {
                    log::warn!("storage estimate unavailable: {}", e);
                    StorageReport::Unsupported
                }
            },
            None => StorageReport::Unsupported,
        };

        log::debug!("{} / {}", report.usage_label(), report.quota_label());
        *self.lock() = Some(report);
        report
    }

    /// The result of the most recent [`snapshot`](Self::snapshot)
    pub fn latest(&self) -> Option<StorageReport> {
        *self.lock()
    }

    /// Asks for persistent storage unless it is already granted.
    ///
    /// Best effort: returns whether storage ends up persistent.
    pub async fn request_persistence(&self) -> bool {
        let Some(estimator) = &self.estimator else {
            return false;
        };

        match estimator.persisted().await {
            Ok(true) => true,
            Ok(false) => match estimator.persist().await {
                Ok(granted) => {
                    log::info!("persistent storage request granted: {}", granted);
                    granted
                }
                Err(e) => {
                    log::debug!("persistent storage request failed: {}", e);
                    false
                }
            },
            Err(e) => {
                log::debug!("persistence state unknown: {}", e);
                false
            }
        }
    }
}

/// Reports the bytes held by an in-memory [`TileStore`] against a fixed quota
#[derive(Debug, Clone)]
pub struct TileStoreEstimator {
    store: TileStore,
    quota: u64,
}

impl TileStoreEstimator {
    pub fn new(store: TileStore, quota: u64) -> Self {
        Self { store, quota }
    }
}

#[async_trait]
impl StorageEstimator for TileStoreEstimator {
    async fn estimate(&self) -> Result<StorageEstimate, StorageError> {
        Ok(StorageEstimate {
            usage: self.store.size_bytes(),
            quota: self.quota,
        })
    }

    async fn persisted(&self) -> Result<bool, StorageError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::TileCoord;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed(StorageEstimate);

    #[async_trait]
    impl StorageEstimator for Fixed {
        async fn estimate(&self) -> Result<StorageEstimate, StorageError> {
            Ok(self.0)
        }
    }

    struct Throwing;

    #[async_trait]
    impl StorageEstimator for Throwing {
        async fn estimate(&self) -> Result<StorageEstimate, StorageError> {
            Err(StorageError::Query("SecurityError".into()))
        }
    }

    #[derive(Default)]
    struct NotYetPersisted {
        persist_calls: AtomicUsize,
    }

    #[async_trait]
    impl StorageEstimator for NotYetPersisted {
        async fn estimate(&self) -> Result<StorageEstimate, StorageError> {
            Ok(StorageEstimate::default())
        }

        async fn persisted(&self) -> Result<bool, StorageError> {
            Ok(false)
        }

        async fn persist(&self) -> Result<bool, StorageError> {
            self.persist_calls.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_snapshot_labels() {
        let reporter = StorageQuotaReporter::new(Arc::new(Fixed(StorageEstimate {
            usage: 1_572_864,
            quota: 2 << 30,
        })));

        let report = reporter.snapshot().await;
        assert_eq!(report.usage_label(), "Usage: 1.5 MB (0.1%)");
        assert_eq!(report.quota_label(), "Quota: 2 GB");
        assert_eq!(reporter.latest(), Some(report));
    }

    #[tokio::test]
    async fn test_zero_quota_ratio_not_applicable() {
        let reporter = StorageQuotaReporter::new(Arc::new(Fixed(StorageEstimate {
            usage: 0,
            quota: 0,
        })));
        assert_eq!(reporter.snapshot().await.usage_label(), "Usage: 0 Bytes (N/A)");
    }

    #[tokio::test]
    async fn test_failing_api_reports_unsupported() {
        let reporter = StorageQuotaReporter::new(Arc::new(Throwing));
        let report = reporter.snapshot().await;
        assert_eq!(report, StorageReport::Unsupported);
        assert_eq!(report.usage_label(), "Storage: unsupported");

        let absent = StorageQuotaReporter::unsupported();
        assert!(!absent.snapshot().await.is_supported());
        assert!(!absent.request_persistence().await);
    }

    #[tokio::test]
    async fn test_persistence_requested_only_when_needed() {
        let estimator = Arc::new(NotYetPersisted::default());
        let reporter = StorageQuotaReporter::new(estimator.clone());
        assert!(reporter.request_persistence().await);
        assert_eq!(estimator.persist_calls.load(Ordering::SeqCst), 1);

        let persisted = StorageQuotaReporter::new(Arc::new(TileStoreEstimator::new(TileStore::new(), 1)));
        assert!(persisted.request_persistence().await);
        assert!(!StorageQuotaReporter::new(Arc::new(Throwing)).request_persistence().await);
    }

    #[tokio::test]
    async fn test_tile_store_estimator_tracks_store() {
        let store = TileStore::new();
        let reporter = StorageQuotaReporter::new(Arc::new(TileStoreEstimator::new(store.clone(), 1024)));
        store.put("gsi-std", TileCoord::new(1, 1, 1), vec![0; 512]);

        let report = reporter.snapshot().await;
        assert_eq!(report.snapshot().map(|s| s.used_bytes), Some(512));
        assert_eq!(report.usage_label(), "Usage: 512 Bytes (50.0%)");
    }
}
