//! Secondary tag index for the permission cache.
//!
//! Two maps are kept in step:
//! - `by_tag`: tag -> keys registered under it, for O(K) bucket invalidation
//! - `by_key`: key -> its tags, so a removed key can be pruned from every
//!   other bucket without scanning
//!
//! Empty buckets are dropped so the index does not grow with dead tags.

use std::collections::HashSet;

use dashmap::DashMap;

use super::key::Tag;

#[derive(Debug, Default, Clone)]
pub(crate) struct TagIndex {
    by_tag: DashMap<Tag, HashSet<String>>,
    by_key: DashMap<String, Vec<Tag>>,
}

impl TagIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers `key` under `tags`, replacing any previous registration.
    pub(crate) fn register(&self, key: &str, tags: &[Tag]) {
        if let Some((_, previous)) = self.by_key.remove(key) {
            for tag in previous.iter().filter(|t| !tags.contains(t)) {
                self.prune(tag, key);
            }
        }
        for tag in tags {
            self.by_tag
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        self.by_key.insert(key.to_string(), tags.to_vec());
    }

    /// Removes `key` from the index entirely.
    pub(crate) fn unregister(&self, key: &str) {
        if let Some((_, tags)) = self.by_key.remove(key) {
            for tag in &tags {
                self.prune(tag, key);
            }
        }
    }

    /// Removes the bucket for `tag` and returns its keys, pruning each key
    /// from every other bucket it was registered under.
    pub(crate) fn take(&self, tag: &Tag) -> Vec<String> {
        // Atomic bucket removal: a concurrent take of the same tag sees nothing.
        let Some((_, keys)) = self.by_tag.remove(tag) else {
            return Vec::new();
        };
        for key in &keys {
            if let Some((_, tags)) = self.by_key.remove(key) {
                for other in tags.iter().filter(|t| *t != tag) {
                    self.prune(other, key);
                }
            }
        }
        keys.into_iter().collect()
    }

    /// Keys currently registered under `tag`.
    pub(crate) fn keys_for(&self, tag: &Tag) -> Vec<String> {
        self.by_tag
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of non-empty buckets.
    pub(crate) fn tag_count(&self) -> usize {
        self.by_tag.len()
    }

    /// Number of registered keys.
    pub(crate) fn key_count(&self) -> usize {
        self.by_key.len()
    }

    pub(crate) fn clear(&self) {
        self.by_tag.clear();
        self.by_key.clear();
    }

    fn prune(&self, tag: &Tag, key: &str) {
        if let Some(mut bucket) = self.by_tag.get_mut(tag) {
            bucket.remove(key);
        }
        self.by_tag.remove_if(tag, |_, bucket| bucket.is_empty());
    }
}
