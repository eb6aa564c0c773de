//! Last viewport across sessions.

use crate::{core::viewport::ViewportState, persistence::store::KeyValueStore, Result};
use std::sync::Arc;

/// Saves and restores the settled viewport under one fixed key
#[derive(Clone)]
pub struct ViewportPersistence {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl ViewportPersistence {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrites the stored viewport
    pub fn save(&self, viewport: &ViewportState) -> Result<()> {
        let json = serde_json::to_string(viewport)?;
        self.store.set(&self.key, &json)?;
        Ok(())
    }

    /// The stored viewport, or `None` when absent or unusable.
    ///
    /// An unparsable or out-of-range value is removed so later loads do not
    /// trip over it again.
    pub fn load(&self) -> Option<ViewportState> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("could not read saved viewport: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<ViewportState>(&raw) {
            Ok(state) if state.is_valid() => Some(state),
            Ok(state) => {
                log::warn!("discarding out-of-range saved viewport {:?}", state);
                self.discard();
                None
            }
            Err(e) => {
                log::warn!("discarding corrupt saved viewport: {}", e);
                self.discard();
                None
            }
        }
    }

    fn discard(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            log::warn!("could not clear saved viewport: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::store::{MemoryStore, StoreError};

    fn persistence() -> (Arc<MemoryStore>, ViewportPersistence) {
        let store = Arc::new(MemoryStore::new());
        let persistence = ViewportPersistence::new(store.clone(), "mapState");
        (store, persistence)
    }

    #[test]
    fn test_save_then_load() {
        let (store, persistence) = persistence();
        let state = ViewportState::new(36.2, 138.1, 15.0);

        persistence.save(&state).unwrap();
        assert_eq!(
            store.get("mapState").unwrap().as_deref(),
            Some(r#"{"lat":36.2,"lng":138.1,"zoom":15.0}"#)
        );
        assert_eq!(persistence.load(), Some(state));
    }

    #[test]
    fn test_absent_value_loads_none() {
        let (_, persistence) = persistence();
        assert_eq!(persistence.load(), None);
    }

    #[test]
    fn test_corrupt_value_is_cleared() {
        let (store, persistence) = persistence();
        store.set("mapState", "{not json").unwrap();

        assert_eq!(persistence.load(), None);
        assert_eq!(store.get("mapState").unwrap(), None);
        assert_eq!(persistence.load(), None);
    }

    #[test]
    fn test_out_of_range_value_is_cleared() {
        let (store, persistence) = persistence();
        store.set("mapState", r#"{"lat":135.0,"lng":0.0,"zoom":3}"#).unwrap();

        assert_eq!(persistence.load(), None);
        assert!(store.is_empty());
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> std::result::Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("quota exceeded".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable("quota exceeded".into()))
        }

        fn remove(&self, _key: &str) -> std::result::Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_store_failures() {
        let persistence = ViewportPersistence::new(Arc::new(FailingStore), "mapState");
        assert_eq!(persistence.load(), None);
        assert!(persistence.save(&ViewportState::new(0.0, 0.0, 1.0)).is_err());
    }
}
