//! Expand API types.
//!
//! The JSON shape mirrors the OpenFGA expand response. For a flat leaf of
//! direct users it serializes as:
//!
//! ```json
//! {"tree":{"root":{"name":"document:1#viewer","leaf":{"users":["user:1"]}}}}
//! ```

use serde::{Deserialize, Serialize};

/// Result of expanding a relation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandResult {
    /// The expansion tree showing how users relate to the object.
    pub tree: UsersetTree,
}

impl ExpandResult {
    /// Builds a single-leaf tree of direct users for `object#relation`.
    pub fn leaf(object: &str, relation: &str, users: Vec<String>) -> Self {
        Self {
            tree: UsersetTree {
                root: ExpandNode {
                    name: format!("{object}#{relation}"),
                    value: NodeValue::Leaf(ExpandLeaf::Users(users)),
                },
            },
        }
    }

    /// Returns the direct users of the root leaf, if the root is a users leaf.
    pub fn root_users(&self) -> Option<&[String]> {
        match &self.tree.root.value {
            NodeValue::Leaf(ExpandLeaf::Users(users)) => Some(users),
            _ => None,
        }
    }
}

/// A tree structure representing the expansion of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersetTree {
    /// The root node of the expansion tree.
    pub root: ExpandNode,
}

/// A named node in the expansion tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandNode {
    /// Name of this node, `object#relation`.
    pub name: String,
    /// Node content.
    #[serde(flatten)]
    pub value: NodeValue,
}

/// The content of an expansion node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeValue {
    /// A leaf node.
    Leaf(ExpandLeaf),
    /// A union of child nodes (any child grants access).
    Union { nodes: Vec<ExpandNode> },
    /// An intersection of child nodes (all children must grant access).
    Intersection { nodes: Vec<ExpandNode> },
    /// A difference (exclusion) of nodes (base minus subtract).
    Difference {
        base: Box<ExpandNode>,
        subtract: Box<ExpandNode>,
    },
}

/// The value of a leaf node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandLeaf {
    /// Direct users who have the relation.
    Users(Vec<String>),
    /// A computed userset reference.
    Computed { userset: String },
    /// A tuple-to-userset reference.
    TupleToUserset {
        tupleset: String,
        computed_userset: String,
    },
}
