//! fgakit: ReBAC evaluation and caching toolkit
//!
//! Ties the toolkit together for applications and test suites:
//! - [`config`] loads settings from YAML and `FGAKIT_` environment variables
//! - [`logging`] installs the `tracing` subscriber
//! - [`Toolkit`] builds a cached authorizer and a snapshot store from settings
//!
//! The building blocks are re-exported from `fgakit-domain` and
//! `fgakit-snapshot`.
//!
//! # Example
//!
//! ```ignore
//! use fgakit::{config::FgaKitConfig, logging, FakeAuthorizationClient, Toolkit};
//!
//! let config = FgaKitConfig::load("fgakit.yaml")?;
//! logging::init_logging(logging::LoggingConfig::from_settings(&config.logging));
//!
//! let toolkit = Toolkit::new(config);
//! let authorizer = toolkit.authorizer(FakeAuthorizationClient::new());
//! let snapshots = toolkit.snapshot_store();
//! ```

pub mod config;
pub mod logging;

use tracing::info;

use crate::config::FgaKitConfig;

pub use fgakit_domain::{
    AuthorizationClient, CachedAuthorizer, DomainError, DomainResult, ExpandResult,
    FakeAuthorizationClient, PermissionCache, PermissionCacheConfig, Tag, Tuple,
};
pub use fgakit_snapshot::{
    compare_snapshots, Snapshot, SnapshotDiff, SnapshotError, SnapshotRecorder, SnapshotResult,
    SnapshotStore, Verification,
};

/// Builds toolkit components from a loaded [`FgaKitConfig`].
#[derive(Debug, Clone)]
pub struct Toolkit {
    config: FgaKitConfig,
}

impl Toolkit {
    /// Creates a toolkit and registers the permission cache metric
    /// descriptions with the installed `metrics` recorder, if any.
    pub fn new(config: FgaKitConfig) -> Self {
        fgakit_domain::cache::register_permission_cache_metrics();
        Self { config }
    }

    pub fn config(&self) -> &FgaKitConfig {
        &self.config
    }

    /// A new permission cache configured from `cache` settings.
    pub fn permission_cache(&self) -> PermissionCache {
        PermissionCache::new(self.config.cache.to_cache_config())
    }

    /// Wraps `client` in a [`CachedAuthorizer`] with a fresh permission cache.
    pub fn authorizer<C: AuthorizationClient>(&self, client: C) -> CachedAuthorizer<C> {
        let cache = self.permission_cache();
        info!(
            enabled = cache.is_enabled(),
            prefix = %self.config.cache.prefix,
            "Permission cache configured"
        );
        CachedAuthorizer::new(client, cache)
    }

    /// A snapshot store rooted at `snapshot.directory`.
    pub fn snapshot_store(&self) -> SnapshotStore {
        SnapshotStore::new(&self.config.snapshot.directory)
    }
}
