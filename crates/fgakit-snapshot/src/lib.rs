//! fgakit-snapshot: Permission snapshots for regression tests
//!
//! Captures structured views of permission state through any
//! `AuthorizationClient`, persists them as JSON files and reports
//! categorized differences between two captures.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               fgakit-snapshot                │
//! ├─────────────────────────────────────────────┤
//! │  snapshot.rs - Captured aspects & record    │
//! │  capture.rs  - SnapshotRecorder             │
//! │  diff.rs     - Categorized comparison       │
//! │  store.rs    - JSON files, verify           │
//! └─────────────────────────────────────────────┘
//! ```

pub mod capture;
pub mod diff;
pub mod error;
pub mod snapshot;
pub mod store;

pub use capture::SnapshotRecorder;
pub use diff::{compare_snapshots, KeyedDiff, SnapshotDiff};
pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::{PermissionEntry, Snapshot, SnapshotRecord};
pub use store::{sanitize_name, SnapshotStore, Verification};
