//! Caching decorator for any [`AuthorizationClient`].
//!
//! Reads go through the [`PermissionCache`]; every successful mutation
//! invalidates the `user:`, `object:` and `relation:` tags of each touched
//! tuple before it returns, so no cached check survives a permission change.
//! A failed mutation invalidates nothing and propagates the error.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::client::AuthorizationClient;
use crate::error::DomainResult;
use crate::model::{ExpandResult, Tuple};

use super::PermissionCache;

/// An [`AuthorizationClient`] that caches checks and list-objects results.
#[derive(Debug, Clone)]
pub struct CachedAuthorizer<C> {
    inner: C,
    cache: PermissionCache,
}

impl<C: AuthorizationClient> CachedAuthorizer<C> {
    /// Wraps `inner` with `cache`.
    pub fn new(inner: C, cache: PermissionCache) -> Self {
        Self { inner, cache }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// The cache in front of the client.
    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    async fn invalidate_all(&self, tuples: &[Tuple]) {
        for tuple in tuples {
            self.cache
                .invalidate_tuple(&tuple.user, &tuple.relation, &tuple.object)
                .await;
        }
    }
}

#[async_trait]
impl<C: AuthorizationClient> AuthorizationClient for CachedAuthorizer<C> {
    #[instrument(skip(self))]
    async fn check(&self, user: &str, relation: &str, object: &str) -> DomainResult<bool> {
        if let Some(allowed) = self.cache.get_permission(user, relation, object).await {
            debug!(allowed, "check served from cache");
            return Ok(allowed);
        }

        let allowed = self.inner.check(user, relation, object).await?;
        self.cache
            .put_permission(user, relation, object, allowed)
            .await;
        Ok(allowed)
    }

    async fn expand(&self, object: &str, relation: &str) -> DomainResult<ExpandResult> {
        self.inner.expand(object, relation).await
    }

    #[instrument(skip(self))]
    async fn list_objects(
        &self,
        user: &str,
        relation: &str,
        object_type: &str,
    ) -> DomainResult<Vec<String>> {
        if let Some(objects) = self
            .cache
            .get_list_objects(user, relation, object_type)
            .await
        {
            debug!(count = objects.len(), "list_objects served from cache");
            return Ok(objects);
        }

        let objects = self.inner.list_objects(user, relation, object_type).await?;
        self.cache
            .put_list_objects(user, relation, object_type, objects.clone())
            .await;
        Ok(objects)
    }

    async fn list_users(&self, object: &str, relation: &str) -> DomainResult<Vec<String>> {
        self.inner.list_users(object, relation).await
    }

    #[instrument(skip(self, writes, deletes), fields(write_count = writes.len(), delete_count = deletes.len()))]
    async fn write_batch(&self, writes: &[Tuple], deletes: &[Tuple]) -> DomainResult<()> {
        self.inner.write_batch(writes, deletes).await?;
        self.invalidate_all(writes).await;
        self.invalidate_all(deletes).await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn grant(&self, user: &str, relation: &str, object: &str) -> DomainResult<()> {
        self.inner.grant(user, relation, object).await?;
        self.cache.invalidate_tuple(user, relation, object).await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke(&self, user: &str, relation: &str, object: &str) -> DomainResult<()> {
        self.inner.revoke(user, relation, object).await?;
        self.cache.invalidate_tuple(user, relation, object).await;
        Ok(())
    }
}
