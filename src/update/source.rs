//! Update sources and the arbiter that queries them.
//!
//! A source is anything that can offer a newer application bundle: the
//! remote release feed, an SD card.  The arbiter holds them in fixed
//! priority order and yields at most one [`Candidate`] per boot; a source
//! that is unreachable, errors out, or has nothing to offer falls through
//! to the next.

use core::fmt;

use log::{info, warn};

use super::manifest::{EntryPath, Manifest};
use super::version::Version;
use crate::error::SourceError;

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// Identifies which source produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceId {
    ReleaseFeed,
    Removable,
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReleaseFeed => f.write_str("release feed"),
            Self::Removable => f.write_str("removable storage"),
        }
    }
}

/// A proposed newer file set, not yet applied.  Transient — never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source: SourceId,
    /// Version token exactly as the source declared it.
    pub token: String,
    pub version: Version,
    pub manifest: Manifest,
}

// ---------------------------------------------------------------------------
// UpdateSource
// ---------------------------------------------------------------------------

/// One place the orchestrator can obtain an update from.
///
/// `fetch_candidate` returning `Ok(None)` means "reachable but nothing to
/// offer" (feed has no release, folder has no version token) and falls
/// through to the next source, same as a failed probe or an error.
pub trait UpdateSource {
    fn id(&self) -> SourceId;

    /// Cheap reachability check; must return quickly and never block boot.
    fn probe(&mut self) -> bool;

    /// Query the source for its latest candidate.
    fn fetch_candidate(&mut self) -> Result<Option<Candidate>, SourceError>;

    /// Retrieve the bytes of one manifest entry of the candidate this
    /// source produced.
    fn read_entry(&mut self, entry: &EntryPath) -> Result<Vec<u8>, SourceError>;
}

// ---------------------------------------------------------------------------
// Arbiter
// ---------------------------------------------------------------------------

/// Queries sources in registration order; first candidate wins.
pub struct SourceArbiter {
    sources: Vec<Box<dyn UpdateSource>>,
}

impl SourceArbiter {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Register a source.  Registration order is priority order.
    pub fn push(&mut self, source: Box<dyn UpdateSource>) {
        self.sources.push(source);
    }

    /// Yield at most one candidate for this boot.
    ///
    /// Once a source yields, lower-priority sources are not consulted at
    /// all — the orchestrator never mixes payloads from two sources in one
    /// boot cycle.
    pub fn next_candidate(&mut self) -> Option<Candidate> {
        for source in &mut self.sources {
            let id = source.id();
            if !source.probe() {
                info!("{id} not reachable, falling through");
                continue;
            }
            match source.fetch_candidate() {
                Ok(Some(candidate)) => {
                    info!(
                        "{id} offers {} ({} entries)",
                        candidate.token,
                        candidate.manifest.len()
                    );
                    return Some(candidate);
                }
                Ok(None) => info!("{id} reachable but offers nothing"),
                Err(e) => warn!("{id} query failed: {e}"),
            }
        }
        None
    }

    /// Fetch one entry's bytes from the source that produced the candidate.
    pub fn read_entry(&mut self, id: SourceId, entry: &EntryPath) -> Result<Vec<u8>, SourceError> {
        match self.sources.iter_mut().find(|s| s.id() == id) {
            Some(source) => source.read_entry(entry),
            None => Err(SourceError::Unreachable),
        }
    }
}

impl Default for SourceArbiter {
    fn default() -> Self {
        Self::new()
    }
}
