//! Manifest-driven copy of a candidate into the active set.
//!
//! The engine is additive: it writes exactly the entries the candidate's
//! manifest names and leaves everything else in the active set alone, so a
//! payload may be partial (a single corrected file).  Any fetch or write
//! failure aborts the remaining entries — there is no partial success; the
//! orchestrator's restore path owns cleanup.

use std::fs;

use log::{info, warn};

use super::manifest::EntryPath;
use super::source::Candidate;
use super::{state, Layout};
use crate::error::{ApplyError, SourceError, StateError};

pub struct ApplyEngine<'a> {
    layout: &'a Layout,
}

impl<'a> ApplyEngine<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    /// Copy every manifest entry of `candidate` into the active set,
    /// retrieving bytes through `fetch`.
    ///
    /// On success the engine's final write is the apply marker holding the
    /// candidate's token; a partially applied candidate never reaches that
    /// write.  Any stale marker is removed before the first entry is
    /// copied.
    pub fn apply<F>(&self, candidate: &Candidate, mut fetch: F) -> Result<(), ApplyError>
    where
        F: FnMut(&EntryPath) -> Result<Vec<u8>, SourceError>,
    {
        state::clear_apply_marker(self.layout).map_err(marker_err)?;

        for entry in candidate.manifest.entries() {
            let bytes = fetch(entry).map_err(|e| {
                warn!("apply: fetching {entry} failed: {e}");
                ApplyError::Fetch(e)
            })?;

            let dst = entry.join_under(&self.layout.active_root);
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    warn!("apply: creating {} failed: {e}", parent.display());
                    ApplyError::Write(e.kind())
                })?;
            }
            fs::write(&dst, &bytes).map_err(|e| {
                warn!("apply: writing {} failed: {e}", dst.display());
                ApplyError::Write(e.kind())
            })?;
            info!("applied {entry} ({} bytes)", bytes.len());
        }

        state::write_apply_marker(self.layout, &candidate.token).map_err(marker_err)
    }
}

fn marker_err(e: StateError) -> ApplyError {
    match e {
        StateError::Read(kind) | StateError::Write(kind) => ApplyError::Marker(kind),
    }
}
