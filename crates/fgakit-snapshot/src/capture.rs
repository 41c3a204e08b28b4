//! Capturing snapshots through an [`AuthorizationClient`].
//!
//! Each `capture_*` call fills one aspect of the snapshot. Lookups that fail
//! are recorded as `None` and logged; the rest of the capture carries on.

use fgakit_domain::model::{ExpandLeaf, ExpandNode, ExpandResult, NodeValue};
use fgakit_domain::{AuthorizationClient, DomainResult};
use tracing::{instrument, warn};

use crate::snapshot::{PermissionEntry, Snapshot};

/// Builds a [`Snapshot`] by querying a live client.
///
/// ```ignore
/// let snapshot = SnapshotRecorder::new(&client)
///     .capture_user_permissions(&["user:1"], &["viewer"], &["document:1"])
///     .await
///     .capture_object_relationships(&["document:1"], &["viewer"])
///     .await
///     .finish();
/// ```
pub struct SnapshotRecorder<'a, C: ?Sized> {
    client: &'a C,
    snapshot: Snapshot,
}

impl<'a, C: AuthorizationClient + ?Sized> SnapshotRecorder<'a, C> {
    /// Starts an empty capture against `client`.
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            snapshot: Snapshot::default(),
        }
    }

    /// Records, per user, one entry for every `(relation, object)` pair.
    #[instrument(skip_all, fields(users = users.len()))]
    pub async fn capture_user_permissions(
        mut self,
        users: &[&str],
        relations: &[&str],
        objects: &[&str],
    ) -> Self {
        let aspect = self.snapshot.user_permissions.get_or_insert_with(Default::default);
        for &user in users {
            let mut entries = Vec::with_capacity(relations.len() * objects.len());
            for &object in objects {
                for &relation in relations {
                    let allowed = leaf(
                        "check",
                        self.client.check(user, relation, object).await,
                    );
                    entries.push(PermissionEntry {
                        relation: relation.to_string(),
                        object: object.to_string(),
                        allowed,
                    });
                }
            }
            aspect.insert(user.to_string(), entries);
        }
        self
    }

    /// Records the check decision for every user × object × relation.
    #[instrument(skip_all, fields(users = users.len(), objects = objects.len()))]
    pub async fn capture_permission_matrix(
        mut self,
        users: &[&str],
        objects: &[&str],
        relations: &[&str],
    ) -> Self {
        let aspect = self.snapshot.permission_matrix.get_or_insert_with(Default::default);
        for &user in users {
            let by_object = aspect.entry(user.to_string()).or_default();
            for &object in objects {
                let by_relation = by_object.entry(object.to_string()).or_default();
                for &relation in relations {
                    let allowed = leaf(
                        "check",
                        self.client.check(user, relation, object).await,
                    );
                    by_relation.insert(relation.to_string(), allowed);
                }
            }
        }
        self
    }

    /// Records the sorted users holding each relation on each object.
    #[instrument(skip_all, fields(objects = objects.len()))]
    pub async fn capture_object_relationships(
        mut self,
        objects: &[&str],
        relations: &[&str],
    ) -> Self {
        let aspect = self
            .snapshot
            .object_relationships
            .get_or_insert_with(Default::default);
        for &object in objects {
            let by_relation = aspect.entry(object.to_string()).or_default();
            for &relation in relations {
                let users = leaf(
                    "list_users",
                    self.client.list_users(object, relation).await,
                )
                .map(sorted);
                by_relation.insert(relation.to_string(), users);
            }
        }
        self
    }

    /// Records the expansion tree of each relation on each object, with the
    /// users of every leaf sorted.
    #[instrument(skip_all, fields(objects = objects.len()))]
    pub async fn capture_inheritance_trees(mut self, objects: &[&str], relations: &[&str]) -> Self {
        let aspect = self
            .snapshot
            .inheritance_trees
            .get_or_insert_with(Default::default);
        for &object in objects {
            let by_relation = aspect.entry(object.to_string()).or_default();
            for &relation in relations {
                let tree = leaf("expand", self.client.expand(object, relation).await)
                    .map(sorted_tree);
                by_relation.insert(relation.to_string(), tree);
            }
        }
        self
    }

    /// Records the sorted objects of each type each user can reach per relation.
    #[instrument(skip_all, fields(users = users.len()))]
    pub async fn capture_user_accessible_objects(
        mut self,
        users: &[&str],
        relations: &[&str],
        object_types: &[&str],
    ) -> Self {
        let aspect = self
            .snapshot
            .user_accessible_objects
            .get_or_insert_with(Default::default);
        for &user in users {
            let by_relation = aspect.entry(user.to_string()).or_default();
            for &relation in relations {
                let by_type = by_relation.entry(relation.to_string()).or_default();
                for &object_type in object_types {
                    let objects = leaf(
                        "list_objects",
                        self.client.list_objects(user, relation, object_type).await,
                    )
                    .map(sorted);
                    by_type.insert(object_type.to_string(), objects);
                }
            }
        }
        self
    }

    /// Returns the captured snapshot.
    pub fn finish(self) -> Snapshot {
        self.snapshot
    }
}

/// Turns a lookup result into a snapshot leaf, logging failures.
fn leaf<T>(operation: &'static str, result: DomainResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(operation, %error, "capture lookup failed, recording null");
            None
        }
    }
}

fn sorted(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values
}

fn sorted_tree(mut result: ExpandResult) -> ExpandResult {
    sort_node(&mut result.tree.root);
    result
}

fn sort_node(node: &mut ExpandNode) {
    match &mut node.value {
        NodeValue::Leaf(ExpandLeaf::Users(users)) => users.sort(),
        NodeValue::Leaf(_) => {}
        NodeValue::Union { nodes } | NodeValue::Intersection { nodes } => {
            nodes.iter_mut().for_each(sort_node);
        }
        NodeValue::Difference { base, subtract } => {
            sort_node(base);
            sort_node(subtract);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgakit_domain::model::UsersetTree;

    fn users_leaf(users: &[&str]) -> ExpandNode {
        ExpandNode {
            name: "document:1#viewer".to_string(),
            value: NodeValue::Leaf(ExpandLeaf::Users(
                users.iter().map(|u| u.to_string()).collect(),
            )),
        }
    }

    #[test]
    fn test_sorted_tree_sorts_nested_leaves() {
        let tree = ExpandResult {
            tree: UsersetTree {
                root: ExpandNode {
                    name: "document:1#viewer".to_string(),
                    value: NodeValue::Union {
                        nodes: vec![
                            users_leaf(&["user:3", "user:1"]),
                            ExpandNode {
                                name: "document:1#viewer".to_string(),
                                value: NodeValue::Difference {
                                    base: Box::new(users_leaf(&["user:b", "user:a"])),
                                    subtract: Box::new(users_leaf(&["user:z", "user:y"])),
                                },
                            },
                        ],
                    },
                },
            },
        };

        let expected = ExpandResult {
            tree: UsersetTree {
                root: ExpandNode {
                    name: "document:1#viewer".to_string(),
                    value: NodeValue::Union {
                        nodes: vec![
                            users_leaf(&["user:1", "user:3"]),
                            ExpandNode {
                                name: "document:1#viewer".to_string(),
                                value: NodeValue::Difference {
                                    base: Box::new(users_leaf(&["user:a", "user:b"])),
                                    subtract: Box::new(users_leaf(&["user:y", "user:z"])),
                                },
                            },
                        ],
                    },
                },
            },
        };
        assert_eq!(sorted_tree(tree), expected);
    }
}
