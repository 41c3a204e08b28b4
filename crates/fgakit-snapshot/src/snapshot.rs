//! Snapshot data model.
//!
//! Every aspect is optional so a capture only carries what the test asked
//! for, and every leaf is optional so a failed lookup is recorded as `null`
//! instead of aborting the capture.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fgakit_domain::ExpandResult;
use serde::{Deserialize, Serialize};

/// user → permission entries, in capture order.
pub type UserPermissions = BTreeMap<String, Vec<PermissionEntry>>;

/// user → object → relation → decision.
pub type PermissionMatrix = BTreeMap<String, BTreeMap<String, BTreeMap<String, Option<bool>>>>;

/// object → relation → sorted users.
pub type ObjectRelationships = BTreeMap<String, BTreeMap<String, Option<Vec<String>>>>;

/// object → relation → expansion tree.
pub type InheritanceTrees = BTreeMap<String, BTreeMap<String, Option<ExpandResult>>>;

/// user → relation → object type → sorted objects.
pub type UserAccessibleObjects =
    BTreeMap<String, BTreeMap<String, BTreeMap<String, Option<Vec<String>>>>>;

/// One checked `(relation, object)` pair for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub relation: String,
    pub object: String,
    /// `None` when the check failed during capture.
    pub allowed: Option<bool>,
}

/// A point-in-time capture of permission state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub user_permissions: Option<UserPermissions>,
    #[serde(default)]
    pub permission_matrix: Option<PermissionMatrix>,
    #[serde(default)]
    pub object_relationships: Option<ObjectRelationships>,
    #[serde(default)]
    pub inheritance_trees: Option<InheritanceTrees>,
    #[serde(default)]
    pub user_accessible_objects: Option<UserAccessibleObjects>,
}

impl Snapshot {
    /// Creates a snapshot with no captured aspects.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no aspect has been captured.
    pub fn is_empty(&self) -> bool {
        self.user_permissions.is_none()
            && self.permission_matrix.is_none()
            && self.object_relationships.is_none()
            && self.inheritance_trees.is_none()
            && self.user_accessible_objects.is_none()
    }
}

/// The on-disk form of a snapshot: `{name, timestamp, snapshot}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub snapshot: Snapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_aspects_serialize_as_null() {
        let json = serde_json::to_value(Snapshot::new()).unwrap();

        assert!(json["user_permissions"].is_null());
        assert!(json["permission_matrix"].is_null());
        assert!(json["object_relationships"].is_null());
        assert!(json["inheritance_trees"].is_null());
        assert!(json["user_accessible_objects"].is_null());
    }

    #[test]
    fn test_missing_aspects_deserialize_as_none() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_failed_leaf_serializes_as_null() {
        let mut matrix = PermissionMatrix::new();
        matrix
            .entry("user:1".to_string())
            .or_default()
            .entry("document:1".to_string())
            .or_default()
            .insert("viewer".to_string(), None);
        let snapshot = Snapshot {
            permission_matrix: Some(matrix),
            ..Snapshot::default()
        };

        let json = serde_json::to_value(&snapshot).unwrap();

        assert!(json["permission_matrix"]["user:1"]["document:1"]["viewer"].is_null());
        assert!(!snapshot.is_empty());
    }
}
