//! Tree nodes and their store records.
//!
//! A node is never linked in memory. Its parent and children are ids of other
//! records, so every link is a pair of fields stored in two different records.
//!
//! | **Field**    | **Record field** | **Absent means**   |
//! |--------------|------------------|--------------------|
//! | `id`         | `id`             | (required)         |
//! | `key`        | `key`            | (required)         |
//! | `value`      | `value`          | (required)         |
//! | `parent`     | `parent`         | node is the root   |
//! | `left`       | `leftChild`      | no left subtree    |
//! | `right`      | `rightChild`     | no right subtree   |
use crate::errors::Error;
use crate::storage::Record;
use std::fmt;
use uuid::Uuid;

/// Id of the root record. At most one record carries it.
pub const ROOT_ID: &str = "root";

const FIELD_ID: &str = "id";
const FIELD_KEY: &str = "key";
const FIELD_VALUE: &str = "value";
const FIELD_PARENT: &str = "parent";
const FIELD_LEFT: &str = "leftChild";
const FIELD_RIGHT: &str = "rightChild";

/// Which child slot of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left child"),
            Side::Right => write!(f, "right child"),
        }
    }
}

/// A binary tree vertex as stored in one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: String,
    key: String,
    value: String,
    parent: Option<String>,
    left: Option<String>,
    right: Option<String>,
}

impl Node {
    /// Creates the root node of an empty tree.
    pub fn root(key: &str, value: &str) -> Self {
        Self::with_id(ROOT_ID.to_string(), key, value, None)
    }

    /// Creates a fresh node below `parent`, assigning it a new random id.
    pub fn child(key: &str, value: &str, parent: &str) -> Self {
        Self::with_id(
            Uuid::new_v4().to_string(),
            key,
            value,
            Some(parent.to_string()),
        )
    }

    fn with_id(id: String, key: &str, value: &str, parent: Option<String>) -> Self {
        Self {
            id,
            key: key.to_string(),
            value: value.to_string(),
            parent,
            left: None,
            right: None,
        }
    }

    /// Rebuilds a node from a store record. The id is taken from the record
    /// as is.
    ///
    /// # Errors
    /// Returns `Error::Serialization` if `id`, `key` or `value` is missing.
    pub fn decode(record: &Record) -> Result<Self, Error> {
        let required = |field: &str| {
            record
                .get(field)
                .cloned()
                .ok_or_else(|| err!(Serialization, "Record is missing field '{}'", field))
        };
        let optional = |field: &str| record.get(field).cloned();

        Ok(Self {
            id: required(FIELD_ID)?,
            key: required(FIELD_KEY)?,
            value: required(FIELD_VALUE)?,
            parent: optional(FIELD_PARENT),
            left: optional(FIELD_LEFT),
            right: optional(FIELD_RIGHT),
        })
    }

    /// Encodes the node into a store record. Absent links are left out.
    pub fn encode(&self) -> Record {
        let mut record = Record::new();
        record.insert(FIELD_ID.into(), self.id.clone());
        record.insert(FIELD_KEY.into(), self.key.clone());
        record.insert(FIELD_VALUE.into(), self.value.clone());
        let links = [
            (FIELD_PARENT, &self.parent),
            (FIELD_LEFT, &self.left),
            (FIELD_RIGHT, &self.right),
        ];
        for (field, link) in links {
            if let Some(id) = link {
                record.insert(field.into(), id.clone());
            }
        }
        record
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn left(&self) -> Option<&str> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&str> {
        self.right.as_deref()
    }

    pub fn child_id(&self, side: Side) -> Option<&str> {
        match side {
            Side::Left => self.left(),
            Side::Right => self.right(),
        }
    }

    /// Returns the slot holding `child`, if any.
    pub fn side_of(&self, child: &str) -> Option<Side> {
        if self.left() == Some(child) {
            Some(Side::Left)
        } else if self.right() == Some(child) {
            Some(Side::Right)
        } else {
            None
        }
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }

    pub(crate) fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    /// Takes over another node's key and value; links stay untouched.
    pub(crate) fn take_entry(&mut self, other: &Node) {
        self.key = other.key.clone();
        self.value = other.value.clone();
    }

    pub(crate) fn set_parent(&mut self, parent: Option<&str>) {
        self.parent = parent.map(str::to_string);
    }

    pub(crate) fn set_child(&mut self, side: Side, child: Option<&str>) {
        let child = child.map(str::to_string);
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        let mut node = Node::child("m", "middle", ROOT_ID);
        node.set_child(Side::Left, Some("left-id"));
        node.set_child(Side::Right, Some("right-id"));

        let record = node.encode();
        assert_eq!(record.get("leftChild").map(String::as_str), Some("left-id"));
        assert_eq!(record.get("rightChild").map(String::as_str), Some("right-id"));
        assert_eq!(record.get("parent").map(String::as_str), Some(ROOT_ID));

        let decoded = Node::decode(&record).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn test_root_has_no_links() {
        let root = Node::root("k", "v");
        assert!(root.is_root());
        assert_eq!((root.left(), root.right()), (None, None));
        assert_eq!(root.parent(), None);

        let record = root.encode();
        assert_eq!(record.len(), 3);
        assert!(!record.contains_key("parent"));
        assert_eq!(Node::decode(&record).unwrap(), root);
    }

    #[test]
    fn test_child_ids_are_fresh() {
        let a = Node::child("a", "1", ROOT_ID);
        let b = Node::child("a", "1", ROOT_ID);
        assert_ne!(a.id(), b.id());
        assert!(!a.is_root());
        assert_eq!(a.parent(), Some(ROOT_ID));
    }

    #[test]
    fn test_decode_missing_field() {
        let mut record = Node::root("k", "v").encode();
        record.remove("value");
        let err = Node::decode(&record).unwrap_err();
        assert_eq!(err.code(), 6000);
        assert!(err.to_string().contains("value"));
    }

    #[test]
    fn test_side_of() {
        let mut node = Node::root("k", "v");
        node.set_child(Side::Right, Some("r"));
        assert_eq!(node.side_of("r"), Some(Side::Right));
        assert_eq!(node.side_of("l"), None);
        assert_eq!(node.child_id(Side::Left), None);
        node.set_child(Side::Right, None);
        assert_eq!(node.right(), None);
    }
}
