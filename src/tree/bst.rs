//! An unbalanced binary search tree stored one node per record.
//!
//! Nodes never live together in memory. Each step of a walk is a point read,
//! and each mutation is a handful of point writes:
//!
//! | **Operation**            | **Reads**     | **Writes**            | **Deletes** |
//! |--------------------------|---------------|-----------------------|-------------|
//! | insert (new key)         | depth         | new node, parent      | -           |
//! | insert (existing key)    | depth         | node (if changed)     | -           |
//! | delete leaf              | depth + 1     | parent                | node        |
//! | delete with one child    | depth + 2     | child, parent         | node        |
//! | delete with two children | depth + path  | promoted, parent, node| successor   |
//!
//! The root always lives under [`ROOT_ID`], so removing the root node means
//! moving another entry into the root record instead.
//!
//! Nothing here is atomic. A crash between two writes can leave a dangling
//! pointer or an orphaned record; a later walk reports the former as
//! `Error::TreeCorruption` and never repairs it.
use super::render::Lines;
use super::Tree;
use crate::errors::Error;
use crate::node::{Node, Side, ROOT_ID};
use crate::storage::{Collection, ReadyOptions, Store};
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, warn};

/// Outcome of an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// A new node was stored.
    Created,
    /// The key existed with another value, which was overwritten.
    Updated,
    /// The key already held this value.
    Unchanged,
}

/// A pointer followed from one node to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Link {
    Parent,
    Child(Side),
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Parent => write!(f, "parent"),
            Link::Child(side) => write!(f, "{}", side),
        }
    }
}

/// Where a walk for a key ended.
enum Location {
    /// There is no root.
    Empty,
    /// A node holds the key.
    Found(Node),
    /// The key belongs in the empty `Side` slot of this node.
    Vacant(Node, Side),
}

pub struct BinarySearchTree<S> {
    nodes: Collection<S>,
}

impl<S: Store> BinarySearchTree<S> {
    /// Opens the tree `name`, creating its collection if needed.
    pub fn open(name: &str, store: S, options: &ReadyOptions) -> Result<Self, Error> {
        Ok(Self {
            nodes: Collection::open(store, name, options)?,
        })
    }

    pub fn name(&self) -> &str {
        self.nodes.name()
    }

    /// Inserts `key` or overwrites its value, reporting what happened.
    pub fn upsert(&self, key: &str, value: &str) -> Result<Insertion, Error> {
        match self.locate(key)? {
            Location::Empty => {
                self.nodes.put_node(&Node::root(key, value))?;
                debug!(tree = self.name(), key, "Created root.");
                Ok(Insertion::Created)
            }
            Location::Vacant(mut parent, side) => {
                let mut child = Node::child(key, value, parent.id());
                self.relink(&mut parent, side, Some(&mut child))?;
                debug!(tree = self.name(), key, parent = parent.key(), %side, "Created node.");
                Ok(Insertion::Created)
            }
            Location::Found(node) if node.value() == value => Ok(Insertion::Unchanged),
            Location::Found(mut node) => {
                node.set_value(value);
                self.nodes.put_node(&node)?;
                debug!(tree = self.name(), key, "Updated value.");
                Ok(Insertion::Updated)
            }
        }
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<String>, Error> {
        match self.locate(key)? {
            Location::Found(node) => Ok(Some(node.value().to_string())),
            _ => Ok(None),
        }
    }

    /// Removes `key` and returns the value it held.
    pub fn remove(&self, key: &str) -> Result<Option<String>, Error> {
        let target = match self.locate(key)? {
            Location::Found(node) => node,
            _ => return Ok(None),
        };
        let old_value = target.value().to_string();

        match (target.left().is_some(), target.right().is_some()) {
            (false, false) => self.remove_leaf(target)?,
            (true, false) => self.remove_with_child(target, Side::Left)?,
            (false, true) => self.remove_with_child(target, Side::Right)?,
            (true, true) => self.remove_with_successor(target)?,
        }
        Ok(Some(old_value))
    }

    /// Lazily renders the tree, one line per node.
    pub fn lines(&self) -> Lines<'_, S> {
        Lines::new(self)
    }

    pub(crate) fn root(&self) -> Result<Option<Node>, Error> {
        self.nodes.get_node(ROOT_ID)
    }

    /// Follows `link` of `from`. `None` if the link is absent.
    pub(crate) fn follow(&self, from: &Node, link: Link) -> Result<Option<Node>, Error> {
        let id = match link {
            Link::Parent => from.parent(),
            Link::Child(side) => from.child_id(side),
        };
        match id {
            Some(id) => self.resolve(from, link, id).map(Some),
            None => Ok(None),
        }
    }

    /// Follows a link that must be present.
    fn require(&self, from: &Node, link: Link) -> Result<Node, Error> {
        self.follow(from, link)?
            .ok_or_else(|| err!(TreeCorruption, "Node '{}' has no {}", from.id(), link))
    }

    /// Fetches the node `link` of `from` points at.
    pub(crate) fn resolve(&self, from: &Node, link: Link, id: &str) -> Result<Node, Error> {
        match self.nodes.get_node(id)? {
            Some(node) => Ok(node),
            None => {
                warn!(tree = self.name(), node = from.id(), %link, id, "Dangling pointer.");
                Err(err!(
                    TreeCorruption,
                    "The {} '{}' of node '{}' does not exist",
                    link,
                    id,
                    from.id()
                ))
            }
        }
    }

    fn locate(&self, key: &str) -> Result<Location, Error> {
        let mut focus = match self.root()? {
            Some(root) => root,
            None => return Ok(Location::Empty),
        };
        // Exclusive key bounds set by the ancestors of `focus`. They only
        // narrow, so a pointer back up the path always breaks them.
        let mut lower: Option<String> = None;
        let mut upper: Option<String> = None;

        loop {
            let side = match key.cmp(focus.key()) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return Ok(Location::Found(focus)),
            };
            let child = match self.follow(&focus, Link::Child(side))? {
                Some(child) => child,
                None => return Ok(Location::Vacant(focus, side)),
            };
            match side {
                Side::Left => upper = Some(focus.key().to_string()),
                Side::Right => lower = Some(focus.key().to_string()),
            }
            let below = lower.as_deref().is_some_and(|l| child.key() <= l);
            let above = upper.as_deref().is_some_and(|u| child.key() >= u);
            if below || above {
                warn!(
                    tree = self.name(),
                    node = child.id(),
                    key = child.key(),
                    "Key out of order."
                );
                return Err(err!(
                    TreeCorruption,
                    "Node '{}' with key '{}' is out of order below '{}'",
                    child.id(),
                    child.key(),
                    focus.id()
                ));
            }
            focus = child;
        }
    }

    /// Fetches `node`'s parent and the slot of the parent that holds `node`.
    fn parent_slot(&self, node: &Node) -> Result<(Node, Side), Error> {
        let parent = self.require(node, Link::Parent)?;
        let side = parent.side_of(node.id()).ok_or_else(|| {
            err!(
                TreeCorruption,
                "Node '{}' is not a child of its parent '{}'",
                node.id(),
                parent.id()
            )
        })?;
        Ok((parent, side))
    }

    /// Points `parent`'s `side` slot at `child` and `child` back at `parent`,
    /// then stores the child followed by the parent.
    fn relink(&self, parent: &mut Node, side: Side, child: Option<&mut Node>) -> Result<(), Error> {
        parent.set_child(side, child.as_ref().map(|c| c.id()));
        if let Some(child) = child {
            child.set_parent(Some(parent.id()));
            self.nodes.put_node(child)?;
        }
        self.nodes.put_node(parent)
    }

    fn remove_leaf(&self, target: Node) -> Result<(), Error> {
        if !target.is_root() {
            let (mut parent, side) = self.parent_slot(&target)?;
            self.relink(&mut parent, side, None)?;
        }
        self.nodes.delete_node(target.id())?;
        debug!(tree = self.name(), key = target.key(), "Removed leaf.");
        Ok(())
    }

    fn remove_with_child(&self, mut target: Node, side: Side) -> Result<(), Error> {
        let mut child = self.require(&target, Link::Child(side))?;

        if target.is_root() {
            // The root id is fixed: the child's entry moves up into the root
            // record and the child's subtrees are hung below it.
            target.take_entry(&child);
            for side in [Side::Left, Side::Right] {
                let mut grandchild = self.follow(&child, Link::Child(side))?;
                self.relink(&mut target, side, grandchild.as_mut())?;
            }
            self.nodes.delete_node(child.id())?;
        } else {
            let (mut parent, slot) = self.parent_slot(&target)?;
            self.relink(&mut parent, slot, Some(&mut child))?;
            self.nodes.delete_node(target.id())?;
        }

        debug!(tree = self.name(), id = target.id(), %side, "Spliced node with one child.");
        Ok(())
    }

    fn remove_with_successor(&self, mut target: Node) -> Result<(), Error> {
        let mut successor = self.require(&target, Link::Child(Side::Right))?;
        // None while the successor is the target's own right child.
        let mut successor_parent: Option<Node> = None;
        while successor.left().is_some() {
            let next = self.require(&successor, Link::Child(Side::Left))?;
            successor_parent = Some(std::mem::replace(&mut successor, next));
        }

        let mut promoted = self.follow(&successor, Link::Child(Side::Right))?;
        match successor_parent.as_mut() {
            Some(parent) => self.relink(parent, Side::Left, promoted.as_mut())?,
            None => self.relink(&mut target, Side::Right, promoted.as_mut())?,
        }

        target.take_entry(&successor);
        self.nodes.put_node(&target)?;
        self.nodes.delete_node(successor.id())?;

        debug!(
            tree = self.name(),
            successor = successor.key(),
            "Replaced node by its in-order successor."
        );
        Ok(())
    }
}

impl<S: Store> Tree for BinarySearchTree<S> {
    fn insert(&self, key: &str, value: &str) -> Result<(), Error> {
        self.upsert(key, value).map(|_| ())
    }

    fn query(&self, key: &str) -> Result<Option<String>, Error> {
        self.get(key)
    }

    fn delete(&self, key: &str) -> Result<Option<String>, Error> {
        self.remove(key)
    }

    fn print(&self) -> Result<String, Error> {
        let lines = self.lines().collect::<Result<Vec<String>, Error>>()?;
        Ok(lines.join("\n"))
    }
}
