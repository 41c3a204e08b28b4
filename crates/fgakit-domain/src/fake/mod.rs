//! Fake authorization engine for tests.
//!
//! [`FakeAuthorizationClient`] answers the [`AuthorizationClient`] contract from
//! an in-memory [`TupleStore`] so that code depending on an authorization
//! service can be tested without one.
//!
//! # Semantics
//!
//! The fake is a flat existence oracle. `check` returns true only if the exact
//! `(user, relation, object)` tuple was granted. It does **not** resolve
//! computed relations: unions, intersections, exclusions and tuple-to-userset
//! rewrites are never evaluated. Tests relying on inherited permissions must
//! grant every tuple the real service would have derived.
//!
//! # Example
//!
//! ```rust,ignore
//! use fgakit_domain::{AuthorizationClient, FakeAuthorizationClient};
//!
//! let fga = FakeAuthorizationClient::new();
//! fga.grant("user:1", "owner", "document:1").await?;
//!
//! assert!(fga.check("user:1", "owner", "document:1").await?);
//! assert!(!fga.check("user:1", "viewer", "document:1").await?);
//! fga.assert_checked("user:1", "owner", "document:1").await;
//! ```

mod store;

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::client::AuthorizationClient;
use crate::error::{DomainError, DomainResult};
use crate::model::{CheckRecord, ExpandResult, Tuple, WriteRecord};

pub use store::TupleStore;

/// Composite key for list-objects mock overrides.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListObjectsQuery {
    pub user: String,
    pub relation: String,
    pub object_type: String,
}

impl ListObjectsQuery {
    pub fn new(
        user: impl Into<String>,
        relation: impl Into<String>,
        object_type: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            relation: relation.into(),
            object_type: object_type.into(),
        }
    }
}

/// Composite key for list-users mock overrides and expand calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRelation {
    pub object: String,
    pub relation: String,
}

impl ObjectRelation {
    pub fn new(object: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            relation: relation.into(),
        }
    }
}

/// A call made against the fake, recorded in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Grant(Tuple),
    Revoke(Tuple),
    Check(Tuple),
    Expand(ObjectRelation),
    ListObjects(ListObjectsQuery),
    ListUsers(ObjectRelation),
    WriteBatch(WriteRecord),
}

#[derive(Debug, Default)]
struct FakeState {
    tuples: TupleStore,
    checks: Vec<CheckRecord>,
    writes: Vec<WriteRecord>,
    calls: Vec<Operation>,
    check_mocks: HashMap<Tuple, bool>,
    list_objects_mocks: HashMap<ListObjectsQuery, Vec<String>>,
    list_users_mocks: HashMap<ObjectRelation, Vec<String>>,
    failure: Option<DomainError>,
}

impl FakeState {
    /// Returns the armed failure, if any.
    fn guard(&self) -> DomainResult<()> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// In-memory stand-in for an OpenFGA client.
///
/// Each instance owns its own state; create one per test (or call
/// [`reset`](Self::reset)) to keep scenarios independent.
#[derive(Debug, Default)]
pub struct FakeAuthorizationClient {
    state: RwLock<FakeState>,
}

impl FakeAuthorizationClient {
    /// Creates a fake with no tuples, mocks or armed failure.
    pub fn new() -> Self {
        Self::default()
    }

    // Mock overrides

    /// Forces `check(user, relation, object)` to return `allowed`,
    /// regardless of stored tuples.
    pub async fn mock_check(&self, user: &str, relation: &str, object: &str, allowed: bool) {
        self.state
            .write()
            .await
            .check_mocks
            .insert(Tuple::new(user, relation, object), allowed);
    }

    /// Forces `list_objects(user, relation, object_type)` to return `objects`.
    pub async fn mock_list_objects(
        &self,
        user: &str,
        relation: &str,
        object_type: &str,
        objects: Vec<String>,
    ) {
        self.state
            .write()
            .await
            .list_objects_mocks
            .insert(ListObjectsQuery::new(user, relation, object_type), objects);
    }

    /// Forces `list_users(object, relation)` to return `users`.
    pub async fn mock_list_users(&self, object: &str, relation: &str, users: Vec<String>) {
        self.state
            .write()
            .await
            .list_users_mocks
            .insert(ObjectRelation::new(object, relation), users);
    }

    // Failure injection

    /// Arms every subsequent operation to fail with `error`, or with
    /// [`DomainError::injected`] when `None`.
    pub async fn should_fail(&self, error: Option<DomainError>) {
        self.state.write().await.failure = Some(error.unwrap_or_else(DomainError::injected));
    }

    /// Disarms a failure set by [`should_fail`](Self::should_fail).
    pub async fn should_succeed(&self) {
        self.state.write().await.failure = None;
    }

    /// Returns the engine to its zero state.
    pub async fn reset(&self) {
        *self.state.write().await = FakeState::default();
    }

    // Inspection

    /// Stored tuples in insertion order.
    pub async fn tuples(&self) -> Vec<Tuple> {
        self.state.read().await.tuples.iter().cloned().collect()
    }

    /// Returns true if the exact tuple is stored.
    pub async fn has_tuple(&self, user: &str, relation: &str, object: &str) -> bool {
        self.state
            .read()
            .await
            .tuples
            .contains(user, relation, object)
    }

    /// Every check answered so far, in order.
    pub async fn checks(&self) -> Vec<CheckRecord> {
        self.state.read().await.checks.clone()
    }

    /// Number of checks answered so far.
    pub async fn check_count(&self) -> usize {
        self.state.read().await.checks.len()
    }

    /// Every batch write applied so far, in order.
    pub async fn writes(&self) -> Vec<WriteRecord> {
        self.state.read().await.writes.clone()
    }

    /// Every call made against the fake, failed ones included.
    pub async fn calls(&self) -> Vec<Operation> {
        self.state.read().await.calls.clone()
    }

    // Assertions (panic with a descriptive message, for test code)

    /// Panics unless the tuple is stored.
    pub async fn assert_granted(&self, user: &str, relation: &str, object: &str) {
        assert!(
            self.has_tuple(user, relation, object).await,
            "expected tuple {} to be granted",
            Tuple::new(user, relation, object)
        );
    }

    /// Panics if the tuple is stored.
    pub async fn assert_not_granted(&self, user: &str, relation: &str, object: &str) {
        assert!(
            !self.has_tuple(user, relation, object).await,
            "expected tuple {} not to be granted",
            Tuple::new(user, relation, object)
        );
    }

    /// Panics unless a check for the triple was answered.
    pub async fn assert_checked(&self, user: &str, relation: &str, object: &str) {
        let checks = self.checks().await;
        assert!(
            checks.iter().any(|c| c.is_for(user, relation, object)),
            "expected check {user}:{relation}:{object} to have been performed; performed: {:?}",
            checks
                .iter()
                .map(|c| format!("{}:{}:{}", c.user, c.relation, c.object))
                .collect::<Vec<_>>()
        );
    }

    /// Panics if a check for the triple was answered.
    pub async fn assert_not_checked(&self, user: &str, relation: &str, object: &str) {
        let checks = self.checks().await;
        assert!(
            !checks.iter().any(|c| c.is_for(user, relation, object)),
            "expected check {user}:{relation}:{object} not to have been performed"
        );
    }

    /// Panics unless exactly `expected` checks were answered.
    pub async fn assert_check_count(&self, expected: usize) {
        let actual = self.check_count().await;
        assert_eq!(
            actual, expected,
            "expected {expected} checks to have been performed, got {actual}"
        );
    }

    /// Panics if any check was answered.
    pub async fn assert_no_checks(&self) {
        self.assert_check_count(0).await;
    }

    /// Panics unless a batch with exactly these writes and deletes was applied.
    pub async fn assert_batch_written(&self, writes: &[Tuple], deletes: &[Tuple]) {
        let expected = WriteRecord {
            writes: writes.to_vec(),
            deletes: deletes.to_vec(),
        };
        let recorded = self.writes().await;
        assert!(
            recorded.contains(&expected),
            "expected batch write {expected:?}; recorded: {recorded:?}"
        );
    }
}

#[async_trait]
impl AuthorizationClient for FakeAuthorizationClient {
    #[instrument(skip(self))]
    async fn check(&self, user: &str, relation: &str, object: &str) -> DomainResult<bool> {
        let mut state = self.state.write().await;
        let tuple = Tuple::new(user, relation, object);
        state.calls.push(Operation::Check(tuple.clone()));
        state.guard()?;

        let allowed = match state.check_mocks.get(&tuple) {
            Some(mocked) => *mocked,
            None => state.tuples.contains(user, relation, object),
        };

        state.checks.push(CheckRecord {
            user: tuple.user,
            relation: tuple.relation,
            object: tuple.object,
            allowed,
        });
        debug!(allowed, "fake check answered");
        Ok(allowed)
    }

    #[instrument(skip(self))]
    async fn expand(&self, object: &str, relation: &str) -> DomainResult<ExpandResult> {
        let mut state = self.state.write().await;
        state
            .calls
            .push(Operation::Expand(ObjectRelation::new(object, relation)));
        state.guard()?;

        let users = state.tuples.users_for(object, relation);
        Ok(ExpandResult::leaf(object, relation, users))
    }

    #[instrument(skip(self))]
    async fn list_objects(
        &self,
        user: &str,
        relation: &str,
        object_type: &str,
    ) -> DomainResult<Vec<String>> {
        let mut state = self.state.write().await;
        let query = ListObjectsQuery::new(user, relation, object_type);
        state.calls.push(Operation::ListObjects(query.clone()));
        state.guard()?;

        if let Some(mocked) = state.list_objects_mocks.get(&query) {
            return Ok(mocked.clone());
        }
        Ok(state.tuples.objects_for(user, relation, object_type))
    }

    #[instrument(skip(self))]
    async fn list_users(&self, object: &str, relation: &str) -> DomainResult<Vec<String>> {
        let mut state = self.state.write().await;
        let key = ObjectRelation::new(object, relation);
        state.calls.push(Operation::ListUsers(key.clone()));
        state.guard()?;

        if let Some(mocked) = state.list_users_mocks.get(&key) {
            return Ok(mocked.clone());
        }
        Ok(state.tuples.users_for(object, relation))
    }

    #[instrument(skip(self, writes, deletes), fields(write_count = writes.len(), delete_count = deletes.len()))]
    async fn write_batch(&self, writes: &[Tuple], deletes: &[Tuple]) -> DomainResult<()> {
        let mut state = self.state.write().await;
        let record = WriteRecord {
            writes: writes.to_vec(),
            deletes: deletes.to_vec(),
        };
        state.calls.push(Operation::WriteBatch(record.clone()));
        state.guard()?;

        // Writes land before deletes are evaluated, so a tuple in both lists
        // ends up deleted.
        for tuple in writes {
            state.tuples.insert(tuple.clone());
        }
        let mut removed = 0;
        for tuple in deletes {
            removed += state.tuples.remove_all(tuple);
        }

        state.writes.push(record);
        debug!(removed, "fake batch applied");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn grant(&self, user: &str, relation: &str, object: &str) -> DomainResult<()> {
        let mut state = self.state.write().await;
        let tuple = Tuple::new(user, relation, object);
        state.calls.push(Operation::Grant(tuple.clone()));
        state.guard()?;

        state.tuples.insert(tuple);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke(&self, user: &str, relation: &str, object: &str) -> DomainResult<()> {
        let mut state = self.state.write().await;
        let tuple = Tuple::new(user, relation, object);
        state.calls.push(Operation::Revoke(tuple.clone()));
        state.guard()?;

        let removed = state.tuples.remove_all(&tuple);
        debug!(removed, "fake revoke applied");
        Ok(())
    }
}
