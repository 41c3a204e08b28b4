//! Tag-indexed permission caching with surgical invalidation.
//!
//! This module provides a permission cache using Moka for concurrent access
//! with built-in TTL eviction, plus a tag index that lets callers forget
//! every decision mentioning a user, object, relation, user type or object
//! type without flushing unrelated entries.
//!
//! # Performance Characteristics
//!
//! - **Put**: O(T) where T is the number of tags (5 for permissions)
//! - **Get**: O(1) - hash-based lookup
//! - **Invalidate by tag**: O(K·T) where K is keys under that tag (not O(N))
//!
//! # Key Design
//!
//! - Permission decisions: `{prefix}:perm:{user}:{relation}:{object}`
//! - List-objects results: `{prefix}:list:{user}:{relation}:{object_type}`
//!
//! # Cache Safety
//!
//! By default, caching is **disabled** (`enabled: false`). When disabled every
//! operation is a no-op returning `false` / `None`, so callers can treat the
//! cache as optional without branching.
//!
//! `get_permission` distinguishes "not cached" (`None`) from "cached deny"
//! (`Some(false)`). Callers must branch on the former before the latter.
//!
//! # Example
//!
//! ```rust,ignore
//! use fgakit_domain::cache::{PermissionCache, PermissionCacheConfig};
//!
//! let cache = PermissionCache::new(PermissionCacheConfig::default().with_enabled(true));
//!
//! cache.put_permission("user:alice", "viewer", "document:1", true).await;
//! assert_eq!(cache.get_permission("user:alice", "viewer", "document:1").await, Some(true));
//!
//! cache.invalidate_user("user:alice").await;
//! assert_eq!(cache.get_permission("user:alice", "viewer", "document:1").await, None);
//! ```

mod authorizer;
mod index;
mod key;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use moka::notification::RemovalCause;
use tracing::debug;

use self::index::TagIndex;

pub use authorizer::CachedAuthorizer;
pub use key::{list_objects_key, permission_key, Tag};

/// Configuration for the permission cache.
#[derive(Debug, Clone)]
pub struct PermissionCacheConfig {
    /// Whether caching is enabled.
    ///
    /// Defaults to `false`; a disabled cache never stores anything.
    pub enabled: bool,
    /// Prefix for every cache key.
    pub prefix: String,
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,
    /// Default TTL for cache entries.
    pub default_ttl: Duration,
}

impl Default for PermissionCacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            prefix: "openfga".to_string(),
            max_capacity: 10_000,
            default_ttl: Duration::from_secs(300),
        }
    }
}

impl PermissionCacheConfig {
    /// Enables or disables caching.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the maximum capacity.
    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Sets the default TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// A cached decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    /// A check decision.
    Permission(bool),
    /// A list-objects result.
    Objects(Vec<String>),
}

/// Permission cache with a secondary tag index.
///
/// Cloning is cheap and clones share entries and index.
///
/// # Thread Safety
///
/// Safe to share across tasks. Invalidation is several steps (take bucket,
/// drop entries, prune other buckets) and is not atomic with respect to a
/// concurrent put; a read racing an invalidation may still see the old value.
#[derive(Clone)]
pub struct PermissionCache {
    cache: Cache<String, CachedValue>,
    config: PermissionCacheConfig,
    index: Arc<TagIndex>,
}

impl std::fmt::Debug for PermissionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionCache")
            .field("config", &self.config)
            .field("entry_count", &self.cache.entry_count())
            .field("tag_index_size", &self.index.tag_count())
            .finish()
    }
}

impl PermissionCache {
    /// Creates a new permission cache with the given configuration.
    pub fn new(config: PermissionCacheConfig) -> Self {
        let index = Arc::new(TagIndex::new());
        let listener_index = Arc::clone(&index);

        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.default_ttl)
            // Entries dropped by TTL or capacity leave the index too.
            .eviction_listener(move |key: Arc<String>, _value, cause: RemovalCause| {
                if cause.was_evicted() {
                    listener_index.unregister(&key);
                }
            })
            .build();

        Self {
            cache,
            config,
            index,
        }
    }

    /// Returns the configuration for this cache.
    pub fn config(&self) -> &PermissionCacheConfig {
        &self.config
    }

    /// Returns whether caching is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Derived key for a permission decision.
    pub fn permission_key(&self, user: &str, relation: &str, object: &str) -> String {
        permission_key(&self.config.prefix, user, relation, object)
    }

    /// Derived key for a list-objects result.
    pub fn list_objects_key(&self, user: &str, relation: &str, object_type: &str) -> String {
        list_objects_key(&self.config.prefix, user, relation, object_type)
    }

    // Generic entry operations

    /// Stores `value` at `key` and registers it under `tags`.
    ///
    /// Returns `false` when caching is disabled.
    pub async fn put(&self, key: String, value: CachedValue, tags: &[Tag]) -> bool {
        if !self.config.enabled {
            return false;
        }
        // Insert before registering: replacing an expired entry fires the
        // eviction listener, which must not erase the new registration.
        self.cache.insert(key.clone(), value).await;
        self.index.register(&key, tags);
        true
    }

    /// Retrieves a cached value.
    ///
    /// Returns `None` if the key is not cached, has expired, or caching is disabled.
    ///
    /// # Metrics
    ///
    /// Records cache hit/miss to:
    /// - `fgakit_cache_hits_total` - Incremented on cache hit
    /// - `fgakit_cache_misses_total` - Incremented on cache miss
    pub async fn get(&self, key: &str) -> Option<CachedValue> {
        if !self.config.enabled {
            return None;
        }
        let result = self.cache.get(key).await;
        if result.is_some() {
            metrics::counter!("fgakit_cache_hits_total").increment(1);
        } else {
            metrics::counter!("fgakit_cache_misses_total").increment(1);
        }
        result
    }

    /// Removes a single entry. Returns true if an entry was removed.
    pub async fn forget(&self, key: &str) -> bool {
        if !self.config.enabled {
            return false;
        }
        self.index.unregister(key);
        self.cache.remove(key).await.is_some()
    }

    /// Removes every entry and clears the tag index.
    pub async fn flush(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        self.cache.invalidate_all();
        self.index.clear();
        debug!("permission cache flushed");
        true
    }

    // Permission decisions

    /// Caches a check decision under its key and all five tags.
    pub async fn put_permission(
        &self,
        user: &str,
        relation: &str,
        object: &str,
        allowed: bool,
    ) -> bool {
        let key = self.permission_key(user, relation, object);
        let tags = Tag::for_permission(user, relation, object);
        self.put(key, CachedValue::Permission(allowed), &tags).await
    }

    /// Returns the cached decision, or `None` when not cached.
    pub async fn get_permission(&self, user: &str, relation: &str, object: &str) -> Option<bool> {
        match self.get(&self.permission_key(user, relation, object)).await {
            Some(CachedValue::Permission(allowed)) => Some(allowed),
            _ => None,
        }
    }

    /// Caches a list-objects result.
    pub async fn put_list_objects(
        &self,
        user: &str,
        relation: &str,
        object_type: &str,
        objects: Vec<String>,
    ) -> bool {
        let key = self.list_objects_key(user, relation, object_type);
        let tags = Tag::for_list_objects(user, relation, object_type, &objects);
        self.put(key, CachedValue::Objects(objects), &tags).await
    }

    /// Returns the cached list-objects result, or `None` when not cached.
    pub async fn get_list_objects(
        &self,
        user: &str,
        relation: &str,
        object_type: &str,
    ) -> Option<Vec<String>> {
        match self
            .get(&self.list_objects_key(user, relation, object_type))
            .await
        {
            Some(CachedValue::Objects(objects)) => Some(objects),
            _ => None,
        }
    }

    // Invalidation

    /// Removes every entry registered under `tag`, pruning each from its
    /// other tag buckets.
    pub async fn invalidate_tag(&self, tag: &Tag) -> bool {
        if !self.config.enabled {
            return false;
        }
        let keys = self.index.take(tag);
        for key in &keys {
            self.cache.invalidate(key).await;
        }
        metrics::counter!("fgakit_cache_invalidations_total").increment(keys.len() as u64);
        debug!(tag = %tag, removed = keys.len(), "permission cache tag invalidated");
        true
    }

    /// Forgets every decision mentioning `user`.
    pub async fn invalidate_user(&self, user: &str) -> bool {
        self.invalidate_tag(&Tag::user(user)).await
    }

    /// Forgets every decision mentioning `object`.
    pub async fn invalidate_object(&self, object: &str) -> bool {
        self.invalidate_tag(&Tag::object(object)).await
    }

    /// Forgets every decision for `relation`.
    pub async fn invalidate_relation(&self, relation: &str) -> bool {
        self.invalidate_tag(&Tag::relation(relation)).await
    }

    /// Forgets every decision whose user is of `user_type`.
    pub async fn invalidate_user_type(&self, user_type: &str) -> bool {
        self.invalidate_tag(&Tag::user_type(user_type)).await
    }

    /// Forgets every decision whose object is of `object_type`.
    pub async fn invalidate_object_type(&self, object_type: &str) -> bool {
        self.invalidate_tag(&Tag::object_type(object_type)).await
    }

    /// Invalidates every entry a write or delete of `(user, relation, object)`
    /// can affect: the `user:`, `object:` and `relation:` tags.
    pub async fn invalidate_tuple(&self, user: &str, relation: &str, object: &str) -> bool {
        if !self.config.enabled {
            return false;
        }
        for tag in Tag::for_mutation(user, relation, object) {
            self.invalidate_tag(&tag).await;
        }
        true
    }

    // Inspection

    /// Keys currently registered under `tag`.
    pub fn tagged_keys(&self, tag: &Tag) -> Vec<String> {
        self.index.keys_for(tag)
    }

    /// Number of keys known to the tag index.
    pub fn indexed_key_count(&self) -> usize {
        self.index.key_count()
    }

    /// Returns the approximate number of entries in the cache.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending maintenance tasks.
    ///
    /// This triggers any pending evictions. Useful for testing TTL behavior.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

/// Registers permission cache metrics descriptions.
///
/// Call this function once during application startup to register metric
/// descriptions with the metrics recorder. This is optional.
///
/// # Metrics Registered
///
/// - `fgakit_cache_hits_total` - Total number of permission cache hits
/// - `fgakit_cache_misses_total` - Total number of permission cache misses
/// - `fgakit_cache_invalidations_total` - Total number of entries removed by tag invalidation
pub fn register_permission_cache_metrics() {
    metrics::describe_counter!(
        "fgakit_cache_hits_total",
        "Total number of permission cache hits"
    );
    metrics::describe_counter!(
        "fgakit_cache_misses_total",
        "Total number of permission cache misses"
    );
    metrics::describe_counter!(
        "fgakit_cache_invalidations_total",
        "Total number of entries removed by tag invalidation"
    );
}
