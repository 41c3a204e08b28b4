//! fgakit-domain: Relationship tuples, fake engine and permission caching
//!
//! This crate contains the core of the toolkit:
//! - Relationship tuple types and the expand result tree
//! - The `AuthorizationClient` contract consumed from OpenFGA
//! - A flat, in-memory fake engine for tests
//! - A tag-indexed permission cache and a caching client decorator
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                fgakit-domain                 │
//! ├─────────────────────────────────────────────┤
//! │  model/    - Tuples, audit records, expand  │
//! │  client.rs - AuthorizationClient trait      │
//! │  fake/     - In-memory fake engine          │
//! │  cache/    - Tagged cache & decorator       │
//! └─────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod client;
pub mod error;
pub mod fake;
pub mod model;

// Re-export commonly used types at the crate root
pub use cache::{CachedAuthorizer, PermissionCache, PermissionCacheConfig, Tag};
pub use client::AuthorizationClient;
pub use error::{DomainError, DomainResult};
pub use fake::FakeAuthorizationClient;
pub use model::{ExpandResult, Tuple};
