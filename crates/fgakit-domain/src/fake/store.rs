//! In-memory tuple storage for the fake engine.
//!
//! Tuples are kept in a `Vec` in insertion order. Inserts never deduplicate;
//! lookups are existence matches, so duplicates are harmless.
//!
//! # Performance Characteristics
//!
//! - **Insert**: O(1) amortized
//! - **Remove all matches**: O(N)
//! - **Contains / listing queries**: O(N) linear scan
//!
//! Test fixtures hold a handful of tuples, so linear scans are fine here.

use std::collections::HashSet;

use crate::model::Tuple;

/// Ordered collection of relationship tuples.
#[derive(Debug, Clone, Default)]
pub struct TupleStore {
    tuples: Vec<Tuple>,
}

impl TupleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a tuple without checking for duplicates.
    pub fn insert(&mut self, tuple: Tuple) {
        self.tuples.push(tuple);
    }

    /// Removes every tuple equal to `tuple`, returning how many were removed.
    pub fn remove_all(&mut self, tuple: &Tuple) -> usize {
        let before = self.tuples.len();
        self.tuples.retain(|t| t != tuple);
        before - self.tuples.len()
    }

    /// Returns true if some stored tuple matches all three fields exactly.
    pub fn contains(&self, user: &str, relation: &str, object: &str) -> bool {
        self.tuples.iter().any(|t| t.matches(user, relation, object))
    }

    /// Users holding `relation` on `object`, deduplicated in first-seen order.
    pub fn users_for(&self, object: &str, relation: &str) -> Vec<String> {
        dedup(
            self.tuples
                .iter()
                .filter(|t| t.object == object && t.relation == relation)
                .map(|t| t.user.as_str()),
        )
    }

    /// Objects of `object_type` on which `user` holds `relation`,
    /// deduplicated in first-seen order.
    pub fn objects_for(&self, user: &str, relation: &str, object_type: &str) -> Vec<String> {
        let prefix = format!("{object_type}:");
        dedup(
            self.tuples
                .iter()
                .filter(|t| t.user == user && t.relation == relation)
                .filter(|t| t.object.starts_with(&prefix))
                .map(|t| t.object.as_str()),
        )
    }

    /// Iterates over stored tuples in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter()
    }

    /// Number of stored tuples, duplicates included.
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    /// Returns true if no tuples are stored.
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Removes every tuple.
    pub fn clear(&mut self) {
        self.tuples.clear();
    }
}

fn dedup<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}
