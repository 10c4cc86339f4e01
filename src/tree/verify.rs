//! Whole-tree walks: in-order listing and structural verification.
use super::bst::{BinarySearchTree, Link};
use crate::errors::Error;
use crate::node::{Node, Side};
use crate::storage::Store;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Shape of a verified tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    pub nodes: usize,
    /// Number of nodes on the longest root-to-leaf path.
    pub height: usize,
}

/// A node to check, with the exclusive key bounds its ancestors impose.
struct Frame {
    node: Node,
    lower: Option<String>,
    upper: Option<String>,
    depth: usize,
}

impl<S: Store> BinarySearchTree<S> {
    /// Returns every `(key, value)` pair in key order.
    pub fn entries(&self) -> Result<Vec<(String, String)>, Error> {
        let mut entries = Vec::new();
        let mut stack: Vec<Node> = Vec::new();
        let mut visited = HashSet::new();
        let mut next = self.root()?;

        while next.is_some() || !stack.is_empty() {
            while let Some(node) = next {
                if !visited.insert(node.id().to_string()) {
                    return Err(self.violation(format!("Node '{}' is reachable twice", node.id())));
                }
                next = self.follow(&node, Link::Child(Side::Left))?;
                stack.push(node);
            }
            if let Some(node) = stack.pop() {
                next = self.follow(&node, Link::Child(Side::Right))?;
                entries.push((node.key().to_string(), node.value().to_string()));
            }
        }
        Ok(entries)
    }

    /// Checks every reachable node:
    /// - only the root lacks a parent, and the root has none;
    /// - each child points back at the parent that points at it;
    /// - each key lies strictly between the bounds set by its ancestors;
    /// - no node is reached twice.
    ///
    /// # Errors
    /// Returns `Error::TreeCorruption` describing the first violation found.
    pub fn verify(&self) -> Result<TreeStats, Error> {
        let mut stats = TreeStats::default();
        let root = match self.root()? {
            Some(root) => root,
            None => return Ok(stats),
        };
        if let Some(parent) = root.parent() {
            return Err(self.violation(format!("Root has parent '{}'", parent)));
        }

        let mut visited = HashSet::new();
        let mut stack = vec![Frame {
            node: root,
            lower: None,
            upper: None,
            depth: 1,
        }];

        while let Some(Frame {
            node,
            lower,
            upper,
            depth,
        }) = stack.pop()
        {
            if !visited.insert(node.id().to_string()) {
                return Err(self.violation(format!("Node '{}' is reachable twice", node.id())));
            }
            let key = node.key();
            let below = lower.as_deref().is_some_and(|l| key <= l);
            let above = upper.as_deref().is_some_and(|u| key >= u);
            if below || above {
                return Err(self.violation(format!(
                    "Key '{}' of node '{}' is outside ({:?}, {:?})",
                    key,
                    node.id(),
                    lower,
                    upper
                )));
            }
            stats.nodes += 1;
            stats.height = stats.height.max(depth);

            for side in [Side::Left, Side::Right] {
                let child = match self.follow(&node, Link::Child(side))? {
                    Some(child) => child,
                    None => continue,
                };
                if child.parent() != Some(node.id()) {
                    return Err(self.violation(format!(
                        "Node '{}' is the {} of '{}' but its parent is {:?}",
                        child.id(),
                        side,
                        node.id(),
                        child.parent()
                    )));
                }
                let (lower, upper) = match side {
                    Side::Left => (lower.clone(), Some(key.to_string())),
                    Side::Right => (Some(key.to_string()), upper.clone()),
                };
                stack.push(Frame {
                    node: child,
                    lower,
                    upper,
                    depth: depth + 1,
                });
            }
        }

        debug!(tree = self.name(), nodes = stats.nodes, height = stats.height, "Verified tree.");
        Ok(stats)
    }

    fn violation(&self, message: String) -> Error {
        warn!(tree = self.name(), "{}", message);
        err!(TreeCorruption, "Tree '{}': {}", self.name(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ROOT_ID;
    use crate::storage::{MemoryStore, ReadyOptions};
    use crate::tree::Tree;

    const NAME: &str = "verify";

    fn build(keys: &[&str]) -> (MemoryStore, BinarySearchTree<MemoryStore>) {
        let store = MemoryStore::new();
        let tree = BinarySearchTree::open(NAME, store.clone(), &ReadyOptions::default()).unwrap();
        for k in keys {
            tree.insert(k, k).unwrap();
        }
        (store, tree)
    }

    fn stored(store: &MemoryStore, id: &str) -> Node {
        Node::decode(&store.get(NAME, id).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn test_empty_tree() {
        let (_, tree) = build(&[]);
        assert_eq!(tree.verify().unwrap(), TreeStats::default());
        assert!(tree.entries().unwrap().is_empty());
    }

    #[test]
    fn test_stats() {
        let (_, tree) = build(&["m", "f", "t", "b", "a"]);
        let stats = tree.verify().unwrap();
        assert_eq!(stats.nodes, 5);
        assert_eq!(stats.height, 4);
    }

    #[test]
    fn test_entries_in_order() {
        let (_, tree) = build(&["m", "f", "t", "b", "h", "r", "z"]);
        let keys: Vec<String> = tree.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "f", "h", "m", "r", "t", "z"]);
    }

    #[test]
    fn test_detects_wrong_back_pointer() {
        let (store, tree) = build(&["m", "f", "b"]);
        let f_id = stored(&store, ROOT_ID).left().unwrap().to_string();
        let b_id = stored(&store, &f_id).left().unwrap().to_string();
        let mut b = stored(&store, &b_id);
        b.set_parent(Some(ROOT_ID));
        store.put(NAME, &b_id, &b.encode()).unwrap();

        let err = tree.verify().unwrap_err();
        assert!(err.is_corruption());
        assert!(err.to_string().contains(&b_id));
    }

    #[test]
    fn test_detects_ordering_against_ancestor() {
        // "b" sits in the right subtree of "f" below "m": it must be > "f".
        let (store, tree) = build(&["m", "f", "h"]);
        let f_id = stored(&store, ROOT_ID).left().unwrap().to_string();
        let h_id = stored(&store, &f_id).right().unwrap().to_string();
        let mut h = stored(&store, &h_id);
        h.take_entry(&Node::root("b", "b"));
        store.put(NAME, &h_id, &h.encode()).unwrap();

        let err = tree.verify().unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn test_detects_parent_on_root() {
        let (store, tree) = build(&["m"]);
        let mut root = stored(&store, ROOT_ID);
        root.set_parent(Some("elsewhere"));
        store.put(NAME, ROOT_ID, &root.encode()).unwrap();
        assert!(tree.verify().unwrap_err().is_corruption());
    }

    #[test]
    fn test_detects_shared_child() {
        let (store, tree) = build(&["m", "f"]);
        let mut root = stored(&store, ROOT_ID);
        let f_id = root.left().unwrap().to_string();
        root.set_child(Side::Right, Some(f_id.as_str()));
        store.put(NAME, ROOT_ID, &root.encode()).unwrap();
        assert!(tree.verify().unwrap_err().is_corruption());
    }
}
