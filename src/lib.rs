//! A binary search tree whose nodes live one per record in a key-value
//! store. Every traversal step is a store read; nothing is cached between
//! operations.
#[macro_use]
pub mod errors;
pub mod command;
pub mod config;
pub mod console;
pub mod node;
pub mod session;
pub mod storage;
pub mod tree;

pub use errors::Error;
pub use tree::Tree;
