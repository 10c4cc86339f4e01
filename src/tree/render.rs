//! Pre-order text rendering of a stored tree.
//!
//! ```text
//! └── m : 1
//!     ├── f : 2
//!     │   └── b : 3
//!     └── t : 4
//! ```
//!
//! Lines are produced on demand, so rendering a large tree costs one store
//! read per line actually consumed.
use super::bst::{BinarySearchTree, Link};
use crate::errors::Error;
use crate::node::{Node, Side};
use crate::storage::Store;
use std::collections::HashSet;

pub const EMPTY_TREE: &str = "Empty Tree";

const BRANCH: &str = "├── ";
const TAIL: &str = "└── ";
const INDENT_BRANCH: &str = "│   ";
const INDENT_TAIL: &str = "    ";

/// A node waiting to be rendered.
struct Pending {
    node: Node,
    prefix: String,
    tail: bool,
}

enum State {
    Start,
    Walking,
    Done,
}

/// Iterator over the rendered lines of a tree.
///
/// Yields an error item and stops if a pointer does not resolve or a node is
/// reached twice.
pub struct Lines<'a, S> {
    tree: &'a BinarySearchTree<S>,
    stack: Vec<Pending>,
    visited: HashSet<String>,
    state: State,
}

impl<'a, S: Store> Lines<'a, S> {
    pub(crate) fn new(tree: &'a BinarySearchTree<S>) -> Self {
        Self {
            tree,
            stack: Vec::new(),
            visited: HashSet::new(),
            state: State::Start,
        }
    }

    fn start(&mut self) -> Result<Option<String>, Error> {
        match self.tree.root()? {
            Some(root) => {
                self.stack.push(Pending {
                    node: root,
                    prefix: String::new(),
                    tail: true,
                });
                self.state = State::Walking;
                self.step()
            }
            None => {
                self.state = State::Done;
                Ok(Some(EMPTY_TREE.to_string()))
            }
        }
    }

    fn step(&mut self) -> Result<Option<String>, Error> {
        let Pending { node, prefix, tail } = match self.stack.pop() {
            Some(p) => p,
            None => return Ok(None),
        };
        if !self.visited.insert(node.id().to_string()) {
            return Err(err!(
                TreeCorruption,
                "Node '{}' is reachable more than once",
                node.id()
            ));
        }

        let line = format!("{}{}{}", prefix, if tail { TAIL } else { BRANCH }, node);
        let child_prefix = format!("{}{}", prefix, if tail { INDENT_TAIL } else { INDENT_BRANCH });

        let left = self.tree.follow(&node, Link::Child(Side::Left))?;
        let right = self.tree.follow(&node, Link::Child(Side::Right))?;
        // Pushed right first so the left subtree comes out first.
        let both = left.is_some() && right.is_some();
        if let Some(right) = right {
            self.stack.push(Pending {
                node: right,
                prefix: child_prefix.clone(),
                tail: true,
            });
        }
        if let Some(left) = left {
            self.stack.push(Pending {
                node: left,
                prefix: child_prefix,
                tail: !both,
            });
        }
        Ok(Some(line))
    }
}

impl<S: Store> Iterator for Lines<'_, S> {
    type Item = Result<String, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match self.state {
            State::Start => self.start(),
            State::Walking => self.step(),
            State::Done => return None,
        };
        match result {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.state = State::Done;
                None
            }
            Err(e) => {
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }
}
