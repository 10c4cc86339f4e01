//! The tree facade.
//!
//! Callers depend on [`Tree`] only. [`BinarySearchTree`] is the one strategy
//! shipped here; a balanced variant could replace it without touching call
//! sites.
pub mod bst;
pub mod render;
pub mod verify;

pub use bst::{BinarySearchTree, Insertion};
pub use render::Lines;
pub use verify::TreeStats;

use crate::errors::Error;

pub trait Tree {
    /// Inserts `key` or overwrites its value. Re-inserting an identical pair
    /// changes nothing.
    fn insert(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Returns the value stored under `key`.
    fn query(&self, key: &str) -> Result<Option<String>, Error>;

    /// Removes `key`, returning the value it held.
    fn delete(&self, key: &str) -> Result<Option<String>, Error>;

    /// Renders the whole tree, one node per line.
    fn print(&self) -> Result<String, Error>;
}
