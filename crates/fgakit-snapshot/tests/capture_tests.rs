//! Snapshot capture against the fake engine.
//!
//! Covers full captures, partial captures where the client cannot answer,
//! and the record → verify regression workflow.

use std::collections::HashMap;

use async_trait::async_trait;
use fgakit_domain::{
    AuthorizationClient, DomainError, DomainResult, ExpandResult, FakeAuthorizationClient, Tuple,
};
use fgakit_snapshot::{
    compare_snapshots, PermissionEntry, Snapshot, SnapshotError, SnapshotRecorder, SnapshotStore,
    Verification,
};

async fn seeded_fake() -> FakeAuthorizationClient {
    let fake = FakeAuthorizationClient::new();
    fake.write_batch(
        &[
            Tuple::new("user:2", "viewer", "document:1"),
            Tuple::new("user:1", "viewer", "document:1"),
            Tuple::new("user:1", "owner", "document:2"),
        ],
        &[],
    )
    .await
    .unwrap();
    fake
}

#[tokio::test]
async fn test_capture_user_permissions() {
    let fake = seeded_fake().await;

    let snapshot = SnapshotRecorder::new(&fake)
        .capture_user_permissions(&["user:1"], &["viewer", "owner"], &["document:1"])
        .await
        .finish();

    let permissions = snapshot.user_permissions.unwrap();
    assert_eq!(
        permissions["user:1"],
        vec![
            PermissionEntry {
                relation: "viewer".to_string(),
                object: "document:1".to_string(),
                allowed: Some(true),
            },
            PermissionEntry {
                relation: "owner".to_string(),
                object: "document:1".to_string(),
                allowed: Some(false),
            },
        ]
    );
}

#[tokio::test]
async fn test_capture_all_aspects() {
    let fake = seeded_fake().await;

    let snapshot = SnapshotRecorder::new(&fake)
        .capture_permission_matrix(&["user:1"], &["document:1", "document:2"], &["owner"])
        .await
        .capture_object_relationships(&["document:1"], &["viewer"])
        .await
        .capture_inheritance_trees(&["document:1"], &["viewer"])
        .await
        .capture_user_accessible_objects(&["user:1"], &["viewer", "owner"], &["document"])
        .await
        .finish();

    let matrix = snapshot.permission_matrix.unwrap();
    assert_eq!(matrix["user:1"]["document:1"]["owner"], Some(false));
    assert_eq!(matrix["user:1"]["document:2"]["owner"], Some(true));

    // Users are sorted regardless of grant order
    let relationships = snapshot.object_relationships.unwrap();
    assert_eq!(
        relationships["document:1"]["viewer"],
        Some(vec!["user:1".to_string(), "user:2".to_string()])
    );

    let trees = snapshot.inheritance_trees.unwrap();
    let tree = trees["document:1"]["viewer"].as_ref().unwrap();
    assert_eq!(tree.tree.root.name, "document:1#viewer");

    let accessible = snapshot.user_accessible_objects.unwrap();
    assert_eq!(
        accessible["user:1"]["owner"]["document"],
        Some(vec!["document:2".to_string()])
    );
}

#[tokio::test]
async fn test_failing_client_records_null_leaves() {
    let fake = seeded_fake().await;
    fake.should_fail(None).await;

    let snapshot = SnapshotRecorder::new(&fake)
        .capture_permission_matrix(&["user:1"], &["document:1"], &["viewer"])
        .await
        .capture_object_relationships(&["document:1"], &["viewer"])
        .await
        .finish();

    assert_eq!(
        snapshot.permission_matrix.unwrap()["user:1"]["document:1"]["viewer"],
        None
    );
    assert_eq!(
        snapshot.object_relationships.unwrap()["document:1"]["viewer"],
        None
    );
}

/// A client that answers checks but has no list-users support.
struct ChecksOnly;

#[async_trait]
impl AuthorizationClient for ChecksOnly {
    async fn check(&self, _user: &str, relation: &str, _object: &str) -> DomainResult<bool> {
        Ok(relation == "viewer")
    }

    async fn expand(&self, object: &str, relation: &str) -> DomainResult<ExpandResult> {
        Ok(ExpandResult::leaf(object, relation, Vec::new()))
    }

    async fn list_objects(
        &self,
        _user: &str,
        _relation: &str,
        _object_type: &str,
    ) -> DomainResult<Vec<String>> {
        Err(DomainError::ClientError {
            message: "list_objects timed out".to_string(),
        })
    }

    async fn write_batch(&self, _writes: &[Tuple], _deletes: &[Tuple]) -> DomainResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_unsupported_list_users_is_partial_capture() {
    let snapshot = SnapshotRecorder::new(&ChecksOnly)
        .capture_user_permissions(&["user:1"], &["viewer"], &["document:1"])
        .await
        .capture_object_relationships(&["document:1"], &["viewer", "owner"])
        .await
        .capture_user_accessible_objects(&["user:1"], &["viewer"], &["document"])
        .await
        .finish();

    // Answered aspects are intact
    assert_eq!(
        snapshot.user_permissions.unwrap()["user:1"][0].allowed,
        Some(true)
    );
    // Failed lookups are null, not missing
    let relationships = snapshot.object_relationships.unwrap();
    assert_eq!(relationships["document:1"].len(), 2);
    assert!(relationships["document:1"].values().all(Option::is_none));
    assert_eq!(
        snapshot.user_accessible_objects.unwrap()["user:1"]["viewer"]["document"],
        None
    );
}

#[tokio::test]
async fn test_snapshot_round_trip_through_store() {
    let fake = seeded_fake().await;
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let snapshot = SnapshotRecorder::new(&fake)
        .capture_user_permissions(&["user:1", "user:2"], &["viewer"], &["document:1"])
        .await
        .capture_inheritance_trees(&["document:1"], &["viewer"])
        .await
        .finish();

    store.save("fake permissions", &snapshot).unwrap();
    let loaded = store.load("fake permissions").unwrap();

    assert_eq!(loaded.snapshot, snapshot);
    assert!(compare_snapshots(&loaded.snapshot, &snapshot).is_empty());
}

async fn capture_viewer_matrix(fake: &FakeAuthorizationClient) -> Snapshot {
    SnapshotRecorder::new(fake)
        .capture_permission_matrix(&["user:1"], &["document:1"], &["viewer"])
        .await
        .finish()
}

#[tokio::test]
async fn test_verify_detects_revoked_permission() {
    // Arrange - record a baseline
    let fake = seeded_fake().await;
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let baseline = capture_viewer_matrix(&fake).await;
    assert_eq!(
        store.verify("regression", &baseline).unwrap(),
        Verification::Recorded
    );

    // Act - change permission state and capture again
    fake.revoke("user:1", "viewer", "document:1").await.unwrap();
    let current = capture_viewer_matrix(&fake).await;

    // Assert
    let err = store.verify("regression", &current).unwrap_err();
    match err {
        SnapshotError::Mismatch { report, .. } => {
            assert!(report.contains("document:1#viewer@user:1: true -> false"));
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
}

async fn capture_viewer_state(client: &impl AuthorizationClient) -> Snapshot {
    SnapshotRecorder::new(client)
        .capture_object_relationships(&["document:1"], &["viewer"])
        .await
        .capture_inheritance_trees(&["document:1"], &["viewer"])
        .await
        .finish()
}

#[tokio::test]
async fn test_regrant_leaves_snapshot_unchanged() {
    // Arrange
    let fake = FakeAuthorizationClient::new();
    fake.grant("user:1", "viewer", "document:1").await.unwrap();
    fake.grant("user:2", "viewer", "document:1").await.unwrap();
    let before = capture_viewer_state(&fake).await;

    // Act - same permission state, different tuple insertion order
    fake.revoke("user:1", "viewer", "document:1").await.unwrap();
    fake.grant("user:1", "viewer", "document:1").await.unwrap();
    let after = capture_viewer_state(&fake).await;

    // Assert
    let diff = compare_snapshots(&before, &after);
    assert!(diff.is_empty(), "unexpected diff:\n{diff}");
    let trees = after.inheritance_trees.unwrap();
    assert_eq!(
        trees["document:1"]["viewer"].as_ref().unwrap().root_users(),
        Some(&["user:1".to_string(), "user:2".to_string()][..])
    );
}

#[tokio::test]
async fn test_recorder_works_through_trait_object() {
    let fake = seeded_fake().await;
    let client: &dyn AuthorizationClient = &fake;

    let snapshot = SnapshotRecorder::new(client)
        .capture_user_permissions(&["user:2"], &["viewer"], &["document:1"])
        .await
        .finish();

    let by_user: HashMap<_, _> = snapshot.user_permissions.unwrap().into_iter().collect();
    assert_eq!(by_user["user:2"][0].allowed, Some(true));
}
