//! One-deep snapshot of the managed file set.
//!
//! `capture` replaces the snapshot wholesale with a copy of every
//! manifest-covered file; `restore` copies the snapshot back over the
//! active set.  A `.snapshot` sentinel written as the final step of
//! `capture` marks the snapshot usable — a backup directory without it
//! (interrupted capture, factory-fresh device) reads as "no backup".

use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info, warn};

use super::manifest::Manifest;
use super::Layout;
use crate::error::BackupError;

/// Name of the validity sentinel inside the backup root.
pub const SNAPSHOT_SENTINEL: &str = ".snapshot";

pub struct BackupManager<'a> {
    layout: &'a Layout,
}

impl<'a> BackupManager<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    /// Whether a usable snapshot exists.
    pub fn has_backup(&self) -> bool {
        self.layout.backup_root.join(SNAPSHOT_SENTINEL).is_file()
    }

    /// Replace the snapshot with a copy of every manifest-covered file
    /// currently in the active set.
    ///
    /// The sentinel is written last, so an interrupted capture leaves the
    /// backup detectably invalid rather than half-written.  Manifest
    /// entries absent from the active set are skipped — a fresh device has
    /// no bundle yet.
    pub fn capture(&self, manifest: &Manifest) -> Result<(), BackupError> {
        let root = &self.layout.backup_root;
        if root.exists() {
            fs::remove_dir_all(root).map_err(|e| self.capture_err(root, &e))?;
        }
        fs::create_dir_all(root).map_err(|e| self.capture_err(root, &e))?;

        let mut copied = 0usize;
        for entry in manifest.entries() {
            let src = entry.join_under(&self.layout.active_root);
            if !src.exists() {
                debug!("capture: {entry} not present in active set, skipping");
                continue;
            }
            let dst = entry.join_under(root);
            copied += copy_tree(&src, &dst).map_err(|e| self.capture_err(&src, &e))?;
        }

        fs::write(root.join(SNAPSHOT_SENTINEL), []).map_err(|e| self.capture_err(root, &e))?;
        info!("backup captured: {copied} file(s)");
        Ok(())
    }

    /// Copy every file under the backup root back into the active set.
    ///
    /// Fails with `NoBackupFound` when the sentinel is missing; the active
    /// set is not touched in that case.
    pub fn restore(&self) -> Result<(), BackupError> {
        let root = &self.layout.backup_root;
        if !root.join(SNAPSHOT_SENTINEL).is_file() {
            return Err(BackupError::NoBackupFound);
        }

        let mut restored = 0usize;
        restore_dir(root, root, &self.layout.active_root, &mut restored)?;
        info!("backup restored: {restored} file(s)");
        Ok(())
    }

    fn capture_err(&self, path: &Path, e: &io::Error) -> BackupError {
        warn!("backup capture failed at {}: {e}", path.display());
        BackupError::Capture(e.kind())
    }
}

// ---------------------------------------------------------------------------
// Recursive copy helpers
// ---------------------------------------------------------------------------

/// Copy a file or a whole directory tree, creating parents as needed.
/// Returns the number of files copied.
fn copy_tree(src: &Path, dst: &Path) -> io::Result<usize> {
    if src.is_dir() {
        fs::create_dir_all(dst)?;
        let mut copied = 0usize;
        for child in fs::read_dir(src)? {
            let child = child?;
            copied += copy_tree(&child.path(), &dst.join(child.file_name()))?;
        }
        Ok(copied)
    } else {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dst)?;
        Ok(1)
    }
}

fn restore_dir(
    dir: &Path,
    backup_root: &Path,
    active_root: &Path,
    restored: &mut usize,
) -> Result<(), BackupError> {
    let entries = fs::read_dir(dir).map_err(|e| restore_err(dir, &e))?;
    for child in entries {
        let child = child.map_err(|e| restore_err(dir, &e))?;
        let path = child.path();
        if path.is_dir() {
            restore_dir(&path, backup_root, active_root, restored)?;
        } else {
            if dir == backup_root && child.file_name() == SNAPSHOT_SENTINEL {
                continue;
            }
            // strip_prefix cannot fail here: `path` was produced by walking
            // down from `backup_root`.
            let rel = path.strip_prefix(backup_root).unwrap_or(&path);
            let dst = active_root.join(rel);
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent).map_err(|e| restore_err(parent, &e))?;
            }
            fs::copy(&path, &dst).map_err(|e| restore_err(&path, &e))?;
            *restored += 1;
        }
    }
    Ok(())
}

fn restore_err(path: &Path, e: &io::Error) -> BackupError {
    warn!("backup restore failed at {}: {e}", path.display());
    BackupError::Restore(e.kind())
}
