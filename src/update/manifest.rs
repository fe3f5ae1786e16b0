//! Bundle-relative path lists and their sanitization.
//!
//! A manifest is the ordered list of paths an update is permitted to touch.
//! Every path that enters the system from outside (release asset names,
//! files enumerated off an SD card, the configured managed set) passes
//! through [`Manifest::sanitize`] before the backup manager or the apply
//! engine ever sees it.

use core::fmt;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::SourceError;

// ---------------------------------------------------------------------------
// EntryPath
// ---------------------------------------------------------------------------

/// One sanitized bundle-relative path.
///
/// Guaranteed relative, free of `..`/`.` components, free of backslashes,
/// and free of dot-prefixed names (those are reserved for orchestrator
/// state files).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryPath(String);

impl EntryPath {
    /// Validate a raw path string.  A trailing `/` (folder notation) is
    /// dropped; anything that could escape or shadow the bundle root is
    /// rejected.
    pub fn new(raw: &str) -> Result<Self, SourceError> {
        if raw.starts_with('/') || raw.starts_with('\\') {
            warn!("manifest entry is absolute: {raw}");
            return Err(SourceError::Malformed);
        }
        let trimmed = raw.trim_end_matches('/');
        if trimmed.is_empty() {
            warn!("manifest entry is empty");
            return Err(SourceError::Malformed);
        }
        for component in trimmed.split('/') {
            if component.is_empty() || component.contains('\\') || component.starts_with('.') {
                warn!("manifest entry is malformed: {raw}");
                return Err(SourceError::Malformed);
            }
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The entry's location under a concrete root directory.
    pub fn join_under(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }

    /// Whether any path component equals `name`.
    fn has_component(&self, name: &str) -> bool {
        self.0.split('/').any(|c| c == name)
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Ordered list of sanitized entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<EntryPath>,
}

impl Manifest {
    /// Build a manifest from raw path strings.
    ///
    /// A single malformed entry rejects the whole list — a source that
    /// names even one escaping path is not trusted for the rest.  Entries
    /// touching a protected name are silently dropped (with a warning);
    /// duplicates are kept in first-seen order only.
    pub fn sanitize<S: AsRef<str>>(raw: &[S], protected: &[String]) -> Result<Self, SourceError> {
        let mut entries: Vec<EntryPath> = Vec::with_capacity(raw.len());
        for item in raw {
            let entry = EntryPath::new(item.as_ref())?;
            if let Some(name) = protected.iter().find(|p| entry.has_component(p)) {
                warn!("manifest entry {entry} is protected ({name}), skipping");
                continue;
            }
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[EntryPath] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
