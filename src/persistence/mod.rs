pub mod store;
pub mod viewport;

#[cfg(feature = "wasm")]
pub use store::LocalStorage;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use viewport::ViewportPersistence;
