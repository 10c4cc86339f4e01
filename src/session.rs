use tracing::info;
use uuid::Uuid;

use crate::{
    config::{Backend, Config},
    errors,
    storage::{FileStore, MemoryStore},
    tree::{BinarySearchTree, Tree},
};

pub struct Session {
    pub id: Uuid,
    pub tree: Box<dyn Tree>,
}

impl Session {
    /// Opens the configured tree on the configured backend.
    pub fn open(config: &Config) -> Result<Self, errors::Error> {
        config.validate()?;
        let id = Uuid::new_v4();

        let tree: Box<dyn Tree> = match config.backend {
            Backend::Memory => Box::new(BinarySearchTree::open(
                &config.tree,
                MemoryStore::new(),
                &config.ready,
            )?),
            Backend::File => Box::new(BinarySearchTree::open(
                &config.tree,
                FileStore::new(&config.data_dir),
                &config.ready,
            )?),
        };

        info!(
            session = %id,
            tree = config.tree,
            backend = %config.backend,
            "Session opened."
        );
        Ok(Session { id, tree })
    }
}
