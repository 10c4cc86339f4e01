use super::{CollectionStatus, Store};
use crate::errors::Error;
use crate::node::Node;
use std::time::Duration;
use tracing::{info, trace, warn};

/// How long `Collection::open` waits for a new collection to become active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyOptions {
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for ReadyOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            max_polls: 50,
        }
    }
}

/// The nodes of one tree, stored in one collection.
///
/// Owns the store handle; every tree operation goes through it. Nothing is
/// cached: each `get_node` is a store round trip.
#[derive(Debug)]
pub struct Collection<S> {
    store: S,
    name: String,
}

impl<S: Store> Collection<S> {
    /// Opens the collection `name`, creating it if needed, and blocks until
    /// the store reports it active.
    ///
    /// # Errors
    /// Returns `Error::StoreUnavailable` if the store fails, or the collection
    /// is not active after `options.max_polls` polls.
    pub fn open(store: S, name: &str, options: &ReadyOptions) -> Result<Self, Error> {
        if store.create_collection(name)? {
            info!(collection = name, "Created collection.");
        }

        for attempt in 1..=options.max_polls {
            match store.collection_status(name)? {
                Some(CollectionStatus::Active) => {
                    info!(collection = name, attempt, "Collection is ready.");
                    return Ok(Self {
                        store,
                        name: name.to_string(),
                    });
                }
                Some(CollectionStatus::Creating) => {
                    warn!(collection = name, attempt, "Waiting for collection...");
                    std::thread::sleep(options.poll_interval);
                }
                None => {
                    return Err(err!(
                        StoreUnavailable,
                        "Collection '{}' disappeared during creation",
                        name
                    ))
                }
            }
        }

        Err(err!(
            StoreUnavailable,
            "Collection '{}' not active after {} polls",
            name,
            options.max_polls
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads and decodes one node.
    ///
    /// # Errors
    /// Returns `Error::Serialization` if the record cannot be decoded or
    /// carries a different id than the one requested.
    pub fn get_node(&self, id: &str) -> Result<Option<Node>, Error> {
        trace!(collection = %self.name, id, "Fetching node...");
        let record = match self.store.get(&self.name, id)? {
            Some(r) => r,
            None => return Ok(None),
        };
        let node = Node::decode(&record)?;
        if node.id() != id {
            return Err(err!(
                Serialization,
                "Record '{}' carries id '{}'",
                id,
                node.id()
            ));
        }
        Ok(Some(node))
    }

    pub fn put_node(&self, node: &Node) -> Result<(), Error> {
        trace!(collection = %self.name, id = node.id(), "Storing node...");
        self.store.put(&self.name, node.id(), &node.encode())
    }

    pub fn delete_node(&self, id: &str) -> Result<(), Error> {
        trace!(collection = %self.name, id, "Deleting node...");
        self.store.delete(&self.name, id)
    }
}
