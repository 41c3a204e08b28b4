//! Categorized comparison of two snapshots.
//!
//! Nested aspects are flattened to composite keys before comparing, so a
//! single flipped decision is reported at the cell that changed rather than
//! as a whole user or object differing. An aspect absent from a snapshot
//! compares as empty.

use std::collections::BTreeMap;
use std::fmt;

use fgakit_domain::ExpandResult;
use serde::Serialize;

use crate::snapshot::{PermissionEntry, Snapshot};

/// Before and after values of a changed key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change<V> {
    pub before: V,
    pub after: V,
}

/// Key-level differences between two maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedDiff<K: Ord, V> {
    /// Keys only present in the current map, with their values.
    pub added: BTreeMap<K, V>,
    /// Keys only present in the saved map, with their values.
    pub removed: BTreeMap<K, V>,
    /// Keys present in both with unequal values.
    pub changed: BTreeMap<K, Change<V>>,
}

impl<K: Ord, V> Default for KeyedDiff<K, V> {
    fn default() -> Self {
        Self {
            added: BTreeMap::new(),
            removed: BTreeMap::new(),
            changed: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone, V: Clone + PartialEq> KeyedDiff<K, V> {
    /// Compares `saved` against `current`.
    pub fn between(saved: &BTreeMap<K, V>, current: &BTreeMap<K, V>) -> Self {
        let mut diff = Self::default();
        for (key, before) in saved {
            match current.get(key) {
                None => {
                    diff.removed.insert(key.clone(), before.clone());
                }
                Some(after) if after != before => {
                    diff.changed.insert(
                        key.clone(),
                        Change {
                            before: before.clone(),
                            after: after.clone(),
                        },
                    );
                }
                Some(_) => {}
            }
        }
        for (key, after) in current {
            if !saved.contains_key(key) {
                diff.added.insert(key.clone(), after.clone());
            }
        }
        diff
    }
}

impl<K: Ord, V> KeyedDiff<K, V> {
    /// Returns true if nothing was added, removed or changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Total number of differing keys.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

/// `(relation, object)`
pub type PermissionKey = (String, String);

/// Differences in `user_permissions`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPermissionsDiff {
    /// Users added or removed as a whole; changed users are not listed here.
    pub users: KeyedDiff<String, Vec<PermissionEntry>>,
    /// Per-user differences keyed by `(relation, object)`, for users in both.
    pub entries: BTreeMap<String, KeyedDiff<PermissionKey, Option<bool>>>,
}

impl UserPermissionsDiff {
    fn between(
        saved: &BTreeMap<String, Vec<PermissionEntry>>,
        current: &BTreeMap<String, Vec<PermissionEntry>>,
    ) -> Self {
        let mut users = KeyedDiff::between(saved, current);
        // Users present on both sides are reported entry by entry below.
        users.changed.clear();

        let mut entries = BTreeMap::new();
        for (user, before) in saved {
            let Some(after) = current.get(user) else {
                continue;
            };
            let diff = KeyedDiff::between(&by_pair(before), &by_pair(after));
            if !diff.is_empty() {
                entries.insert(user.clone(), diff);
            }
        }

        Self { users, entries }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.entries.is_empty()
    }
}

fn by_pair(entries: &[PermissionEntry]) -> BTreeMap<PermissionKey, Option<bool>> {
    entries
        .iter()
        .map(|entry| {
            (
                (entry.relation.clone(), entry.object.clone()),
                entry.allowed,
            )
        })
        .collect()
}

/// Differences in `permission_matrix`, keyed by `(user, object, relation)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixDiff {
    pub cells: KeyedDiff<(String, String, String), Option<bool>>,
}

/// Differences in `object_relationships`, keyed by `(object, relation)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipsDiff {
    pub relations: KeyedDiff<(String, String), Option<Vec<String>>>,
}

/// Differences in `inheritance_trees`, keyed by `(object, relation)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreesDiff {
    pub trees: KeyedDiff<(String, String), Option<ExpandResult>>,
}

/// Differences in `user_accessible_objects`, keyed by `(user, relation, type)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessibleObjectsDiff {
    pub objects: KeyedDiff<(String, String, String), Option<Vec<String>>>,
}

fn flatten2<V: Clone>(
    nested: &BTreeMap<String, BTreeMap<String, V>>,
) -> BTreeMap<(String, String), V> {
    let mut flat = BTreeMap::new();
    for (a, inner) in nested {
        for (b, value) in inner {
            flat.insert((a.clone(), b.clone()), value.clone());
        }
    }
    flat
}

fn flatten3<V: Clone>(
    nested: &BTreeMap<String, BTreeMap<String, BTreeMap<String, V>>>,
) -> BTreeMap<(String, String, String), V> {
    let mut flat = BTreeMap::new();
    for (a, middle) in nested {
        for (b, inner) in middle {
            for (c, value) in inner {
                flat.insert((a.clone(), b.clone(), c.clone()), value.clone());
            }
        }
    }
    flat
}

/// All differences between a saved and a current snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub user_permissions: UserPermissionsDiff,
    pub permission_matrix: MatrixDiff,
    pub object_relationships: RelationshipsDiff,
    pub inheritance_trees: TreesDiff,
    pub user_accessible_objects: AccessibleObjectsDiff,
}

impl SnapshotDiff {
    /// Returns true if the two snapshots were equivalent.
    pub fn is_empty(&self) -> bool {
        self.user_permissions.is_empty()
            && self.permission_matrix.cells.is_empty()
            && self.object_relationships.relations.is_empty()
            && self.inheritance_trees.trees.is_empty()
            && self.user_accessible_objects.objects.is_empty()
    }
}

/// Compares `saved` against `current`, category by category.
pub fn compare_snapshots(saved: &Snapshot, current: &Snapshot) -> SnapshotDiff {
    let empty = BTreeMap::new();

    let user_permissions = UserPermissionsDiff::between(
        saved.user_permissions.as_ref().unwrap_or(&empty),
        current.user_permissions.as_ref().unwrap_or(&empty),
    );

    let permission_matrix = MatrixDiff {
        cells: KeyedDiff::between(
            &saved.permission_matrix.as_ref().map(flatten3).unwrap_or_default(),
            &current.permission_matrix.as_ref().map(flatten3).unwrap_or_default(),
        ),
    };

    let object_relationships = RelationshipsDiff {
        relations: KeyedDiff::between(
            &saved.object_relationships.as_ref().map(flatten2).unwrap_or_default(),
            &current.object_relationships.as_ref().map(flatten2).unwrap_or_default(),
        ),
    };

    let inheritance_trees = TreesDiff {
        trees: KeyedDiff::between(
            &saved.inheritance_trees.as_ref().map(flatten2).unwrap_or_default(),
            &current.inheritance_trees.as_ref().map(flatten2).unwrap_or_default(),
        ),
    };

    let user_accessible_objects = AccessibleObjectsDiff {
        objects: KeyedDiff::between(
            &saved.user_accessible_objects.as_ref().map(flatten3).unwrap_or_default(),
            &current.user_accessible_objects.as_ref().map(flatten3).unwrap_or_default(),
        ),
    };

    SnapshotDiff {
        user_permissions,
        permission_matrix,
        object_relationships,
        inheritance_trees,
        user_accessible_objects,
    }
}

// Report rendering

fn render<V: Serialize>(value: &V) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<unrenderable>".to_string())
}

fn write_section<K: Ord, V: Serialize>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    diff: &KeyedDiff<K, V>,
    label: impl Fn(&K) -> String,
) -> fmt::Result {
    if diff.is_empty() {
        return Ok(());
    }
    writeln!(f, "{title}:")?;
    for (key, value) in &diff.added {
        writeln!(f, "  + {}: {}", label(key), render(value))?;
    }
    for (key, value) in &diff.removed {
        writeln!(f, "  - {}: {}", label(key), render(value))?;
    }
    for (key, change) in &diff.changed {
        writeln!(
            f,
            "  ~ {}: {} -> {}",
            label(key),
            render(&change.before),
            render(&change.after)
        )?;
    }
    Ok(())
}

impl fmt::Display for UserPermissionsDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_section(f, "user_permissions", &self.users, |user| user.clone())?;
        for (user, diff) in &self.entries {
            write_section(f, &format!("user_permissions[{user}]"), diff, |(relation, object)| {
                format!("{object}#{relation}")
            })?;
        }
        Ok(())
    }
}

impl fmt::Display for SnapshotDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "no differences");
        }
        write!(f, "{}", self.user_permissions)?;
        write_section(
            f,
            "permission_matrix",
            &self.permission_matrix.cells,
            |(user, object, relation)| format!("{object}#{relation}@{user}"),
        )?;
        write_section(
            f,
            "object_relationships",
            &self.object_relationships.relations,
            |(object, relation)| format!("{object}#{relation}"),
        )?;
        write_section(
            f,
            "inheritance_trees",
            &self.inheritance_trees.trees,
            |(object, relation)| format!("{object}#{relation}"),
        )?;
        write_section(
            f,
            "user_accessible_objects",
            &self.user_accessible_objects.objects,
            |(user, relation, object_type)| format!("{user} {relation} {object_type}"),
        )
    }
}
