//! Application-bundle update machinery.
//!
//! | Module      | Responsibility                                          |
//! |-------------|---------------------------------------------------------|
//! | `version`   | Version token parsing and ordering                      |
//! | `manifest`  | Bundle-relative path list, sanitization                 |
//! | `state`     | Persisted version marker, apply journal, apply marker   |
//! | `backup`    | One-deep snapshot capture/restore                       |
//! | `apply`     | Manifest-driven copy of a candidate into the active set |
//! | `source`    | `UpdateSource` trait, `Candidate`, the source arbiter   |
//! | `release`   | Remote release-feed source (GitHub-style API)           |
//! | `removable` | SD-card update-folder source                            |
//!
//! Everything here operates on plain `std::fs` paths so the same code runs
//! against the ESP-IDF VFS on the device and against a temp directory in
//! host tests.

pub mod apply;
pub mod backup;
pub mod manifest;
pub mod release;
pub mod removable;
pub mod source;
pub mod state;
pub mod version;

use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// On-disk layout
// ---------------------------------------------------------------------------

/// Fixed locations of everything the orchestrator reads or writes, rooted
/// at the data partition.
///
/// Dot-prefixed names are orchestrator state and never belong to the
/// application bundle itself.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Active application bundle root (`<data>/app`).
    pub active_root: PathBuf,
    /// Backup snapshot root (`<data>/backup`).
    pub backup_root: PathBuf,
    /// Version marker: the token last confirmed successful (`<data>/.version`).
    pub version_marker: PathBuf,
    /// Apply journal, present only while an apply is in flight (`<data>/.journal`).
    pub journal: PathBuf,
    /// Apply marker, the engine's final write on success (`<data>/.applied`).
    pub apply_marker: PathBuf,
    /// Credentials file (`<data>/secrets.json`).  Lives beside the bundle,
    /// not inside it, so no update can ever touch it.
    pub secrets_file: PathBuf,
}

impl Layout {
    /// Derive the standard layout under a data-partition mount point.
    pub fn under(data_root: &Path) -> Self {
        Self {
            active_root: data_root.join("app"),
            backup_root: data_root.join("backup"),
            version_marker: data_root.join(".version"),
            journal: data_root.join(".journal"),
            apply_marker: data_root.join(".applied"),
            secrets_file: data_root.join("secrets.json"),
        }
    }
}
