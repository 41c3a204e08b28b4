//! The authorization client contract.
//!
//! Real deployments implement [`AuthorizationClient`] on top of an OpenFGA
//! HTTP or gRPC client. Tests use [`FakeAuthorizationClient`](crate::fake::FakeAuthorizationClient),
//! and [`CachedAuthorizer`](crate::cache::CachedAuthorizer) decorates either.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{DomainError, DomainResult};
use crate::model::{ExpandResult, Tuple};

/// Client-visible contract of an OpenFGA-compatible authorization service.
#[async_trait]
pub trait AuthorizationClient: Send + Sync {
    /// Returns whether `user` has `relation` on `object`.
    async fn check(&self, user: &str, relation: &str, object: &str) -> DomainResult<bool>;

    /// Checks several triples, keyed by `"user:relation:object"`.
    ///
    /// Later entries whose key collides with an earlier one overwrite it.
    async fn batch_check(&self, checks: &[Tuple]) -> DomainResult<HashMap<String, bool>> {
        let mut results = HashMap::with_capacity(checks.len());
        for tuple in checks {
            let allowed = self
                .check(&tuple.user, &tuple.relation, &tuple.object)
                .await?;
            results.insert(tuple.key(), allowed);
        }
        Ok(results)
    }

    /// Expands the users holding `relation` on `object`.
    async fn expand(&self, object: &str, relation: &str) -> DomainResult<ExpandResult>;

    /// Lists objects of `object_type` on which `user` has `relation`.
    async fn list_objects(
        &self,
        user: &str,
        relation: &str,
        object_type: &str,
    ) -> DomainResult<Vec<String>>;

    /// Lists users holding `relation` on `object`.
    ///
    /// Not every server version supports ListUsers; the default reports it
    /// as unsupported.
    async fn list_users(&self, _object: &str, _relation: &str) -> DomainResult<Vec<String>> {
        Err(DomainError::Unsupported {
            operation: "list_users".to_string(),
        })
    }

    /// Applies all `writes`, then all `deletes`.
    async fn write_batch(&self, writes: &[Tuple], deletes: &[Tuple]) -> DomainResult<()>;

    /// Writes a single tuple.
    async fn grant(&self, user: &str, relation: &str, object: &str) -> DomainResult<()> {
        self.write_batch(&[Tuple::new(user, relation, object)], &[])
            .await
    }

    /// Deletes a single tuple.
    async fn revoke(&self, user: &str, relation: &str, object: &str) -> DomainResult<()> {
        self.write_batch(&[], &[Tuple::new(user, relation, object)])
            .await
    }
}

#[async_trait]
impl<C: AuthorizationClient + ?Sized> AuthorizationClient for Arc<C> {
    async fn check(&self, user: &str, relation: &str, object: &str) -> DomainResult<bool> {
        (**self).check(user, relation, object).await
    }

    async fn batch_check(&self, checks: &[Tuple]) -> DomainResult<HashMap<String, bool>> {
        (**self).batch_check(checks).await
    }

    async fn expand(&self, object: &str, relation: &str) -> DomainResult<ExpandResult> {
        (**self).expand(object, relation).await
    }

    async fn list_objects(
        &self,
        user: &str,
        relation: &str,
        object_type: &str,
    ) -> DomainResult<Vec<String>> {
        (**self).list_objects(user, relation, object_type).await
    }

    async fn list_users(&self, object: &str, relation: &str) -> DomainResult<Vec<String>> {
        (**self).list_users(object, relation).await
    }

    async fn write_batch(&self, writes: &[Tuple], deletes: &[Tuple]) -> DomainResult<()> {
        (**self).write_batch(writes, deletes).await
    }

    async fn grant(&self, user: &str, relation: &str, object: &str) -> DomainResult<()> {
        (**self).grant(user, relation, object).await
    }

    async fn revoke(&self, user: &str, relation: &str, object: &str) -> DomainResult<()> {
        (**self).revoke(user, relation, object).await
    }
}
