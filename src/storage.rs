//! The store holds one record per tree node.
//!
//! A store is addressed by collection (one per tree) and record id. It only
//! offers single-record get, put and delete: no scans, no transactions. Any
//! backend failure is reported as `Error::StoreUnavailable`.
pub mod collection;
pub mod file;
pub mod memory;

pub use collection::{Collection, ReadyOptions};
pub use file::FileStore;
pub use memory::MemoryStore;

use crate::errors::Error;
use std::collections::BTreeMap;
use std::fmt;

/// A stored record: field name to string value.
pub type Record = BTreeMap<String, String>;

/// Provisioning state of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// Created but not yet serving requests.
    Creating,
    /// Ready for get/put/delete.
    Active,
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionStatus::Creating => write!(f, "Creating"),
            CollectionStatus::Active => write!(f, "Active"),
        }
    }
}

/// A handle to a key-value store.
pub trait Store {
    /// Creates a collection. Returns `false` if it already existed.
    fn create_collection(&self, name: &str) -> Result<bool, Error>;

    /// Returns the collection's status, or `None` if it does not exist.
    fn collection_status(&self, name: &str) -> Result<Option<CollectionStatus>, Error>;

    /// Reads one record.
    fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, Error>;

    /// Writes one record, replacing any previous record with the same id.
    fn put(&self, collection: &str, id: &str, record: &Record) -> Result<(), Error>;

    /// Deletes one record. Deleting a missing record is not an error.
    fn delete(&self, collection: &str, id: &str) -> Result<(), Error>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn create_collection(&self, name: &str) -> Result<bool, Error> {
        (**self).create_collection(name)
    }

    fn collection_status(&self, name: &str) -> Result<Option<CollectionStatus>, Error> {
        (**self).collection_status(name)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, Error> {
        (**self).get(collection, id)
    }

    fn put(&self, collection: &str, id: &str, record: &Record) -> Result<(), Error> {
        (**self).put(collection, id, record)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), Error> {
        (**self).delete(collection, id)
    }
}
