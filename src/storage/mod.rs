pub mod quota;

pub use quota::{
    StorageError, StorageEstimate, StorageEstimator, StorageQuotaReporter, StorageReport,
    StorageSnapshot, TileStoreEstimator,
};
