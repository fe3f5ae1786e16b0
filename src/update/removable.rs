//! SD-card update-folder source.
//!
//! Layout on the card, under the mount root:
//!
//! ```text
//! update/
//!   version.txt        # version token, required
//!   <bundle files>     # any subset of the managed file set
//! ```
//!
//! The folder is enumerated recursively into a manifest; `version.txt` is
//! the token, not a manifest entry.  Dot-prefixed names (OS droppings,
//! orchestrator state) are skipped during enumeration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::manifest::{EntryPath, Manifest};
use super::source::{Candidate, SourceId, UpdateSource};
use super::version::Version;
use crate::error::SourceError;
use crate::ports::VolumeMount;

/// Folder name under the mount root.
pub const UPDATE_DIR: &str = "update";
/// Version token file inside the update folder.
pub const VERSION_FILE: &str = "version.txt";

pub struct RemovableSource<V: VolumeMount> {
    volume: V,
    protected: Vec<String>,
}

impl<V: VolumeMount> RemovableSource<V> {
    pub fn new(volume: V, protected: Vec<String>) -> Self {
        Self { volume, protected }
    }

    fn update_dir(&self) -> PathBuf {
        self.volume.root().join(UPDATE_DIR)
    }
}

impl<V: VolumeMount> UpdateSource for RemovableSource<V> {
    fn id(&self) -> SourceId {
        SourceId::Removable
    }

    fn probe(&mut self) -> bool {
        self.volume.mount() && self.update_dir().is_dir()
    }

    fn fetch_candidate(&mut self) -> Result<Option<Candidate>, SourceError> {
        let dir = self.update_dir();

        let token = match fs::read_to_string(dir.join(VERSION_FILE)) {
            Ok(raw) => raw.trim().to_string(),
            Err(e) => {
                info!("no readable {VERSION_FILE} in {}: {e}", dir.display());
                return Ok(None);
            }
        };
        let version = match Version::parse(&token) {
            Ok(version) => version,
            Err(e) => {
                warn!("{VERSION_FILE} token {token:?} unparseable ({e}), skipping");
                return Ok(None);
            }
        };

        let mut names = Vec::new();
        if let Err(e) = collect_files(&dir, &dir, &mut names) {
            warn!("enumerating {} failed: {e}", dir.display());
            return Ok(None);
        }
        let manifest = Manifest::sanitize(&names, &self.protected)?;
        if manifest.is_empty() {
            info!("update folder {} carries no files, skipping", dir.display());
            return Ok(None);
        }

        Ok(Some(Candidate {
            source: SourceId::Removable,
            token,
            version,
            manifest,
        }))
    }

    fn read_entry(&mut self, entry: &EntryPath) -> Result<Vec<u8>, SourceError> {
        let path = entry.join_under(&self.update_dir());
        fs::read(&path).map_err(|e| {
            warn!("reading {} failed: {e}", path.display());
            SourceError::Read(e.kind())
        })
    }
}

/// Walk `dir` collecting files as base-relative path strings.  Dot-prefixed
/// names are skipped; the top-level version token file is not an entry.
fn collect_files(dir: &Path, base: &Path, out: &mut Vec<String>) -> io::Result<()> {
    for child in fs::read_dir(dir)? {
        let child = child?;
        let name = child.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let path = child.path();
        if path.is_dir() {
            collect_files(&path, base, out)?;
        } else {
            // strip_prefix cannot fail: `path` came from walking below `base`.
            let rel = path.strip_prefix(base).unwrap_or(&path);
            let rel = rel.to_string_lossy().replace('\\', "/");
            if rel == VERSION_FILE {
                continue;
            }
            out.push(rel);
        }
    }
    Ok(())
}
