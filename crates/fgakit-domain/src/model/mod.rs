//! Relationship model types.
//!
//! This module contains:
//! - Core relationship types (Tuple, audit records)
//! - Expand API result tree

mod expand;
mod types;
#[cfg(test)]
mod types_proptest;

pub use expand::{ExpandLeaf, ExpandNode, ExpandResult, NodeValue, UsersetTree};
pub use types::*;
