//! File-backed snapshot persistence.
//!
//! Each snapshot lives at `{directory}/{sanitized_name}.json` as pretty
//! printed `{name, timestamp, snapshot}`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::diff::compare_snapshots;
use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::{Snapshot, SnapshotRecord};

const EXTENSION: &str = "json";

/// Outcome of [`SnapshotStore::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// No snapshot existed, the current one was saved.
    Recorded,
    /// The saved snapshot equals the current one.
    Matched,
}

/// Replaces every character outside `[a-zA-Z0-9_-]` with `_`. An empty
/// name maps to `_` so the file still has a stem.
pub fn sanitize_name(name: &str) -> String {
    if name.is_empty() {
        return "_".to_string();
    }
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Reads and writes snapshots under a directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    directory: PathBuf,
}

impl SnapshotStore {
    /// Creates a store rooted at `directory`. The directory is created on
    /// first save.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The file a snapshot named `name` is stored in.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.directory
            .join(format!("{}.{EXTENSION}", sanitize_name(name)))
    }

    /// Writes `snapshot` under `name`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    #[instrument(skip(self, snapshot))]
    pub fn save(&self, name: &str, snapshot: &Snapshot) -> SnapshotResult<SnapshotRecord> {
        std::fs::create_dir_all(&self.directory)?;

        let record = SnapshotRecord {
            name: name.to_string(),
            timestamp: Utc::now(),
            snapshot: snapshot.clone(),
        };
        let content =
            serde_json::to_string_pretty(&record).map_err(|e| SnapshotError::InvalidData {
                name: name.to_string(),
                message: format!("failed to encode snapshot: {e}"),
            })?;

        let path = self.path_for(name);
        std::fs::write(&path, content)?;
        debug!(path = %path.display(), "Saved snapshot");
        Ok(record)
    }

    /// Reads the snapshot saved under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::NotFound`] if nothing was saved under `name`
    /// and [`SnapshotError::InvalidData`] if the file is not a snapshot.
    #[instrument(skip(self))]
    pub fn load(&self, name: &str) -> SnapshotResult<SnapshotRecord> {
        let path = self.path_for(name);
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SnapshotError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&content).map_err(|e| SnapshotError::InvalidData {
            name: name.to_string(),
            message: format!("failed to parse {}: {e}", path.display()),
        })
    }

    /// Returns true if a snapshot is saved under `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Removes the snapshot saved under `name`. Returns false if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn delete(&self, name: &str) -> SnapshotResult<bool> {
        match std::fs::remove_file(self.path_for(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Sanitized names of all saved snapshots, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn list(&self) -> SnapshotResult<Vec<String>> {
        let entries = match std::fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Compares `current` with the snapshot saved under `name`.
    ///
    /// The first run records `current` and returns [`Verification::Recorded`].
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Mismatch`] with a readable report when the
    /// snapshots differ, or any error from loading or saving.
    #[instrument(skip(self, current))]
    pub fn verify(&self, name: &str, current: &Snapshot) -> SnapshotResult<Verification> {
        let saved = match self.load(name) {
            Ok(record) => record,
            Err(SnapshotError::NotFound { .. }) => {
                self.save(name, current)?;
                info!("Recorded new snapshot");
                return Ok(Verification::Recorded);
            }
            Err(e) => return Err(e),
        };

        let diff = compare_snapshots(&saved.snapshot, current);
        if diff.is_empty() {
            Ok(Verification::Matched)
        } else {
            Err(SnapshotError::Mismatch {
                name: name.to_string(),
                report: diff.to_string(),
            })
        }
    }

    /// Like [`verify`](Self::verify), but panics with the diff report on
    /// mismatch or error. Intended for tests.
    #[track_caller]
    pub fn assert_snapshot_matches(&self, name: &str, current: &Snapshot) {
        if let Err(e) = self.verify(name, current) {
            panic!("{e}");
        }
    }
}
