use super::{CollectionStatus, Record, Store};
use crate::errors::Error;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

/// In-process store. Clones share the same data, like handles to one remote
/// service.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<String, MemoryCollection>,
    /// Status polls a new collection answers with `Creating`.
    activation_polls: u32,
    offline: bool,
}

#[derive(Debug, Default)]
struct MemoryCollection {
    records: HashMap<String, Record>,
    pending_polls: u32,
}

impl MemoryCollection {
    fn is_active(&self) -> bool {
        self.pending_polls == 0
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// New collections stay in `Creating` for the first `polls` status checks.
    pub fn with_activation_delay(polls: u32) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.lock() {
            inner.activation_polls = polls;
        }
        store
    }

    /// Simulates an outage: while offline every call fails.
    pub fn set_offline(&self, offline: bool) -> Result<(), Error> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| Error::StoreUnavailable("Failed to lock the store".into()))?;
        inner.offline = offline;
        Ok(())
    }

    /// Number of records in `collection` (0 if it does not exist).
    pub fn record_count(&self, collection: &str) -> Result<usize, Error> {
        let inner = self.lock()?;
        Ok(inner
            .collections
            .get(collection)
            .map(|c| c.records.len())
            .unwrap_or(0))
    }

    /// Sorted record ids in `collection`.
    pub fn ids(&self, collection: &str) -> Result<Vec<String>, Error> {
        let inner = self.lock()?;
        let mut ids: Vec<String> = inner
            .collections
            .get(collection)
            .map(|c| c.records.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        Ok(ids)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, Error> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| Error::StoreUnavailable("Failed to lock the store".into()))?;
        if inner.offline {
            return Err(Error::StoreUnavailable("Store is offline".into()));
        }
        Ok(inner)
    }
}

impl Inner {
    fn active(&mut self, name: &str) -> Result<&mut MemoryCollection, Error> {
        match self.collections.get_mut(name) {
            Some(c) if c.is_active() => Ok(c),
            Some(_) => Err(err!(StoreUnavailable, "Collection '{}' is not active", name)),
            None => Err(err!(StoreUnavailable, "Collection '{}' does not exist", name)),
        }
    }
}

impl Store for MemoryStore {
    fn create_collection(&self, name: &str) -> Result<bool, Error> {
        let mut inner = self.lock()?;
        if inner.collections.contains_key(name) {
            return Ok(false);
        }
        let pending_polls = inner.activation_polls;
        inner.collections.insert(
            name.to_string(),
            MemoryCollection {
                records: HashMap::new(),
                pending_polls,
            },
        );
        Ok(true)
    }

    fn collection_status(&self, name: &str) -> Result<Option<CollectionStatus>, Error> {
        let mut inner = self.lock()?;
        Ok(inner.collections.get_mut(name).map(|c| {
            if c.is_active() {
                CollectionStatus::Active
            } else {
                c.pending_polls -= 1;
                CollectionStatus::Creating
            }
        }))
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, Error> {
        let mut inner = self.lock()?;
        trace!(collection, id, "get");
        Ok(inner.active(collection)?.records.get(id).cloned())
    }

    fn put(&self, collection: &str, id: &str, record: &Record) -> Result<(), Error> {
        let mut inner = self.lock()?;
        trace!(collection, id, "put");
        inner
            .active(collection)?
            .records
            .insert(id.to_string(), record.clone());
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), Error> {
        let mut inner = self.lock()?;
        trace!(collection, id, "delete");
        inner.active(collection)?.records.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> Record {
        Record::from([("id".to_string(), id.to_string())])
    }

    #[test]
    fn test_create_collection_is_idempotent() {
        let store = MemoryStore::new();
        assert!(store.create_collection("t").unwrap());
        assert!(!store.create_collection("t").unwrap());
        assert_eq!(
            store.collection_status("t").unwrap(),
            Some(CollectionStatus::Active)
        );
        assert_eq!(store.collection_status("other").unwrap(), None);
    }

    #[test]
    fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.create_collection("t").unwrap();
        store.put("t", "a", &record("a")).unwrap();
        assert_eq!(store.get("t", "a").unwrap(), Some(record("a")));
        assert_eq!(store.get("t", "b").unwrap(), None);
        store.delete("t", "a").unwrap();
        store.delete("t", "a").unwrap();
        assert_eq!(store.record_count("t").unwrap(), 0);
    }

    #[test]
    fn test_clones_share_data() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.create_collection("t").unwrap();
        handle.put("t", "x", &record("x")).unwrap();
        assert_eq!(store.ids("t").unwrap(), vec!["x".to_string()]);
    }

    #[test]
    fn test_activation_delay() {
        let store = MemoryStore::with_activation_delay(2);
        store.create_collection("t").unwrap();
        assert!(store.get("t", "a").unwrap_err().is_session_fatal());
        assert_eq!(
            store.collection_status("t").unwrap(),
            Some(CollectionStatus::Creating)
        );
        assert_eq!(
            store.collection_status("t").unwrap(),
            Some(CollectionStatus::Creating)
        );
        assert_eq!(
            store.collection_status("t").unwrap(),
            Some(CollectionStatus::Active)
        );
        assert_eq!(store.get("t", "a").unwrap(), None);
    }

    #[test]
    fn test_offline() {
        let store = MemoryStore::new();
        store.create_collection("t").unwrap();
        store.set_offline(true).unwrap();
        let err = store.get("t", "a").unwrap_err();
        assert_eq!(err.code(), 2000);
        store.set_offline(false).unwrap();
        assert!(store.get("t", "a").is_ok());
    }

    #[test]
    fn test_missing_collection() {
        let store = MemoryStore::new();
        let err = store.put("nope", "a", &record("a")).unwrap_err();
        assert!(err.is_session_fatal());
    }
}
