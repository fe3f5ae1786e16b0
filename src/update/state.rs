//! Persisted device state: version marker, apply journal, apply marker.
//!
//! Three single-token text files under the data partition root:
//!
//! - `.version` — the token last confirmed successful; the single source of
//!   truth for "currently running version".  Absent means "version 0 /
//!   always update".
//! - `.journal` — written right before an apply starts, removed when the
//!   update flow reaches a terminal state.  Its presence at boot means a
//!   previous boot died inside the apply/verify window.
//! - `.applied` — the apply engine's final write; holds the candidate token
//!   of a fully copied file set.
//!
//! All reads degrade soft (absent/unreadable ⇒ `None`, with a warning);
//! writes surface `StateError` so the orchestrator can route the failure.

use std::fs;
use std::io;
use std::path::Path;

use log::warn;

use super::version::Version;
use super::Layout;
use crate::error::StateError;

// ---------------------------------------------------------------------------
// Device state
// ---------------------------------------------------------------------------

/// State loaded at orchestrator entry and returned, possibly updated, with
/// the boot report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceState {
    /// Raw version token last confirmed successful; `None` before the first
    /// successful apply (and after a user-requested rollback).
    pub version_token: Option<String>,
}

impl DeviceState {
    /// Parsed current version.  An absent or unparseable token degrades to
    /// [`Version::ZERO`] so any real candidate counts as newer.
    pub fn current_version(&self) -> Version {
        match &self.version_token {
            Some(token) => Version::parse(token).unwrap_or_else(|e| {
                warn!("stored version token {token:?} unparseable ({e}), treating as 0");
                Version::ZERO
            }),
            None => Version::ZERO,
        }
    }
}

/// Read the version marker into a fresh [`DeviceState`].
pub fn load(layout: &Layout) -> DeviceState {
    DeviceState {
        version_token: read_token(&layout.version_marker, "version marker"),
    }
}

/// Record `token` as the version last confirmed successful.
pub fn persist_version(layout: &Layout, token: &str) -> Result<(), StateError> {
    write_token(&layout.version_marker, token)
}

/// Remove the version marker (device reverts to "version 0 / always update").
pub fn clear_version(layout: &Layout) -> Result<(), StateError> {
    remove_token(&layout.version_marker)
}

// ---------------------------------------------------------------------------
// Apply journal
// ---------------------------------------------------------------------------

pub fn write_journal(layout: &Layout, token: &str) -> Result<(), StateError> {
    write_token(&layout.journal, token)
}

pub fn read_journal(layout: &Layout) -> Option<String> {
    read_token(&layout.journal, "apply journal")
}

pub fn clear_journal(layout: &Layout) -> Result<(), StateError> {
    remove_token(&layout.journal)
}

// ---------------------------------------------------------------------------
// Apply marker
// ---------------------------------------------------------------------------

pub fn write_apply_marker(layout: &Layout, token: &str) -> Result<(), StateError> {
    write_token(&layout.apply_marker, token)
}

pub fn read_apply_marker(layout: &Layout) -> Option<String> {
    read_token(&layout.apply_marker, "apply marker")
}

pub fn clear_apply_marker(layout: &Layout) -> Result<(), StateError> {
    remove_token(&layout.apply_marker)
}

// ---------------------------------------------------------------------------
// Token file primitives
// ---------------------------------------------------------------------------

fn read_token(path: &Path, what: &str) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(raw) => {
            let token = raw.trim();
            if token.is_empty() {
                warn!("{what} at {} is empty", path.display());
                None
            } else {
                Some(token.to_string())
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!("{what} unreadable at {}: {e}", path.display());
            None
        }
    }
}

fn write_token(path: &Path, token: &str) -> Result<(), StateError> {
    fs::write(path, token).map_err(|e| {
        warn!("write failed at {}: {e}", path.display());
        StateError::Write(e.kind())
    })
}

fn remove_token(path: &Path) -> Result<(), StateError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            warn!("remove failed at {}: {e}", path.display());
            Err(StateError::Write(e.kind()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scratch() -> (TempDir, Layout) {
        let dir = TempDir::new().unwrap();
        let layout = Layout::under(dir.path());
        (dir, layout)
    }

    #[test]
    fn absent_marker_is_version_zero() {
        let (_dir, layout) = scratch();
        let state = load(&layout);
        assert_eq!(state.version_token, None);
        assert_eq!(state.current_version(), Version::ZERO);
    }

    #[test]
    fn persist_then_load_round_trips() {
        let (_dir, layout) = scratch();
        persist_version(&layout, "v1.4").unwrap();
        let state = load(&layout);
        assert_eq!(state.version_token.as_deref(), Some("v1.4"));
        assert_eq!(state.current_version(), Version::new(1, 4, 0));
    }

    #[test]
    fn unparseable_marker_degrades_to_zero() {
        let (_dir, layout) = scratch();
        persist_version(&layout, "garbage").unwrap();
        assert_eq!(load(&layout).current_version(), Version::ZERO);
    }

    #[test]
    fn empty_marker_reads_as_absent() {
        let (_dir, layout) = scratch();
        fs::write(&layout.version_marker, "  \n").unwrap();
        assert_eq!(load(&layout).version_token, None);
    }

    #[test]
    fn clear_version_is_idempotent() {
        let (_dir, layout) = scratch();
        persist_version(&layout, "1.0").unwrap();
        clear_version(&layout).unwrap();
        clear_version(&layout).unwrap();
        assert_eq!(load(&layout).version_token, None);
    }

    #[test]
    fn journal_lifecycle() {
        let (_dir, layout) = scratch();
        assert_eq!(read_journal(&layout), None);
        write_journal(&layout, "1.1").unwrap();
        assert_eq!(read_journal(&layout).as_deref(), Some("1.1"));
        clear_journal(&layout).unwrap();
        assert_eq!(read_journal(&layout), None);
    }

    #[test]
    fn apply_marker_lifecycle() {
        let (_dir, layout) = scratch();
        write_apply_marker(&layout, "v2.0").unwrap();
        assert_eq!(read_apply_marker(&layout).as_deref(), Some("v2.0"));
        clear_apply_marker(&layout).unwrap();
        assert_eq!(read_apply_marker(&layout), None);
    }

    #[test]
    fn tokens_are_trimmed_on_read() {
        let (_dir, layout) = scratch();
        fs::write(&layout.version_marker, "1.2.3\n").unwrap();
        assert_eq!(load(&layout).version_token.as_deref(), Some("1.2.3"));
    }
}
