//! Boot-time update and rollback controller.
//!
//! Runs once per boot, strictly before the monitoring application starts,
//! and decides what the device runs next:
//!
//! ```text
//! Idle ─► RecoverySweep ─► GestureCheck ─┬► RollbackPath ──► reboot / continue
//!                                        └► UpdateCheck ─► Backup ─► Apply ─► Verify
//!                                                │                              │
//!                                                └──► continue (no candidate)   ├► reboot (confirmed)
//!                                                                               └► AutoRestore ─► reboot
//! ```
//!
//! The one property everything below serves: an apply that did not
//! confirm its success marker never lets the device keep running the
//! half-written file set — every such path routes through `AutoRestore`
//! before a reboot is issued.
//!
//! The controller mutates nothing outside [`Layout`]'s paths and is the
//! only caller of the backup manager's and apply engine's mutating
//! methods. It takes the loaded [`DeviceState`] as input and returns a
//! [`BootReport`]; the binary performs the actual restart or hands over
//! to the application.

use log::{error, info, warn};

use crate::config::{CheckPolicy, SystemConfig};
use crate::error::BackupError;
use crate::gesture::{self, BootGesture};
use crate::ports::{ButtonProbe, Clock, WatchdogFeed};
use crate::status::{StatusCode, StatusReporter};
use crate::update::apply::ApplyEngine;
use crate::update::backup::BackupManager;
use crate::update::manifest::Manifest;
use crate::update::source::SourceArbiter;
use crate::update::state::{self, DeviceState};
use crate::update::Layout;

// ---------------------------------------------------------------------------
// Boot steps
// ---------------------------------------------------------------------------

/// Sequential steps of one boot pass; used for transition logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BootStep {
    Idle,
    RecoverySweep,
    GestureCheck,
    RollbackPath,
    UpdateCheck,
    Backup,
    Apply,
    Verify,
    AutoRestore,
}

impl BootStep {
    fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::RecoverySweep => "RecoverySweep",
            Self::GestureCheck => "GestureCheck",
            Self::RollbackPath => "RollbackPath",
            Self::UpdateCheck => "UpdateCheck",
            Self::Backup => "Backup",
            Self::Apply => "Apply",
            Self::Verify => "Verify",
            Self::AutoRestore => "AutoRestore",
        }
    }
}

// ---------------------------------------------------------------------------
// Boot report
// ---------------------------------------------------------------------------

/// Terminal action the binary must take.  There is no idle/halt exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    /// Issue a full device restart.
    Reboot,
    /// Hand over to the monitoring application.
    ContinueBoot,
}

/// Why the boot pass ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootDetail {
    /// Recovery sweep confirmed an apply a previous boot finished.
    RolledForward,
    /// A newer candidate was applied and confirmed.
    UpdateApplied,
    /// A candidate existed but was not newer.
    UpToDate,
    /// No source yielded a candidate.
    NoCandidate,
    /// Policy is single-press and no press occurred.
    CheckSkipped,
    /// Capture or journal write failed before any mutation; update aborted.
    UpdateAborted,
    /// Apply failed and the snapshot was restored.
    UpdateFailedRestored,
    /// Apply failed and the restore failed too.
    UpdateFailed,
    /// User-requested rollback succeeded.
    RolledBack,
    /// User-requested rollback with no snapshot to restore.
    NoBackup,
    /// User-requested rollback failed reading the snapshot.
    RestoreFailed,
}

/// Result of one boot pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootReport {
    pub outcome: BootOutcome,
    /// `None` when the pass ended before gesture detection (recovery sweep).
    pub gesture: Option<BootGesture>,
    pub detail: BootDetail,
    /// Device state as left on disk, possibly updated.
    pub state: DeviceState,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct RollbackController<'a> {
    config: &'a SystemConfig,
    layout: &'a Layout,
    arbiter: &'a mut SourceArbiter,
    button: &'a mut dyn ButtonProbe,
    clock: &'a dyn Clock,
    watchdog: &'a dyn WatchdogFeed,
    reporter: StatusReporter<'a>,
    step: BootStep,
}

impl<'a> RollbackController<'a> {
    pub fn new(
        config: &'a SystemConfig,
        layout: &'a Layout,
        arbiter: &'a mut SourceArbiter,
        button: &'a mut dyn ButtonProbe,
        clock: &'a dyn Clock,
        watchdog: &'a dyn WatchdogFeed,
        reporter: StatusReporter<'a>,
    ) -> Self {
        Self {
            config,
            layout,
            arbiter,
            button,
            clock,
            watchdog,
            reporter,
            step: BootStep::Idle,
        }
    }

    /// Execute one full boot pass.
    pub fn run(&mut self, mut device: DeviceState) -> BootReport {
        if let Some(report) = self.recovery_sweep(&mut device) {
            return report;
        }

        self.enter(BootStep::GestureCheck);
        let gesture = gesture::detect(
            &mut *self.button,
            self.clock,
            self.config.gesture_window_ms,
            self.config.gesture_gap_ms,
        );

        match gesture {
            BootGesture::Double => self.rollback_path(device, gesture),
            BootGesture::None if self.config.check_policy == CheckPolicy::SinglePress => {
                info!("no press and check policy is single-press, skipping update check");
                BootReport {
                    outcome: BootOutcome::ContinueBoot,
                    gesture: Some(gesture),
                    detail: BootDetail::CheckSkipped,
                    state: device,
                }
            }
            _ => self.update_check(device, gesture),
        }
    }

    // -----------------------------------------------------------------------
    // Recovery sweep
    // -----------------------------------------------------------------------

    /// Consume a leftover apply journal from a boot that died mid-update.
    ///
    /// Journal plus a matching apply marker means the copy itself finished
    /// and only the confirmation was lost: roll forward.  Anything else
    /// means the active set may be half-written: restore the snapshot.
    fn recovery_sweep(&mut self, device: &mut DeviceState) -> Option<BootReport> {
        let token = state::read_journal(self.layout)?;
        self.enter(BootStep::RecoverySweep);
        warn!("apply journal found (token {token:?}): previous boot died mid-update");

        let marker = state::read_apply_marker(self.layout);
        if marker.as_deref() == Some(token.as_str()) {
            if self.confirm_apply(&token, device) {
                info!("rolled forward to {token}");
                self.reporter.report(StatusCode::UpdateApplied);
                return Some(BootReport {
                    outcome: BootOutcome::Reboot,
                    gesture: None,
                    detail: BootDetail::RolledForward,
                    state: device.clone(),
                });
            }
            // Confirmation not durable; the marker and the files would
            // disagree if we continued, so fall through to the restore.
        }

        let detail = self.auto_restore();
        Some(BootReport {
            outcome: BootOutcome::Reboot,
            gesture: None,
            detail,
            state: device.clone(),
        })
    }

    // -----------------------------------------------------------------------
    // Rollback path (double press)
    // -----------------------------------------------------------------------

    fn rollback_path(&mut self, mut device: DeviceState, gesture: BootGesture) -> BootReport {
        self.enter(BootStep::RollbackPath);
        self.reporter.report(StatusCode::RollbackStarted);

        let backup = BackupManager::new(self.layout);
        let (outcome, detail) = match backup.restore() {
            Ok(()) => {
                // The snapshot does not include the version marker; a
                // stale token naming the rolled-back version would lie
                // about what is running, so the device reverts to
                // "version 0 / always update".
                state::clear_version(self.layout).ok();
                device.version_token = None;
                info!("rollback complete");
                self.reporter.report(StatusCode::RollbackApplied);
                (BootOutcome::Reboot, BootDetail::RolledBack)
            }
            Err(BackupError::NoBackupFound) => {
                warn!("rollback requested but no snapshot exists");
                self.reporter.report(StatusCode::NoBackup);
                (BootOutcome::ContinueBoot, BootDetail::NoBackup)
            }
            Err(e) => {
                error!("rollback restore failed ({e}), continuing with current active set");
                self.reporter.report(StatusCode::UpdateFailed);
                (BootOutcome::ContinueBoot, BootDetail::RestoreFailed)
            }
        };

        BootReport {
            outcome,
            gesture: Some(gesture),
            detail,
            state: device,
        }
    }

    // -----------------------------------------------------------------------
    // Update path
    // -----------------------------------------------------------------------

    fn update_check(&mut self, mut device: DeviceState, gesture: BootGesture) -> BootReport {
        self.enter(BootStep::UpdateCheck);
        self.reporter.report(StatusCode::Checking);

        let continue_with = |detail, device| BootReport {
            outcome: BootOutcome::ContinueBoot,
            gesture: Some(gesture),
            detail,
            state: device,
        };

        let Some(candidate) = self.arbiter.next_candidate() else {
            info!("no update candidate this boot");
            return continue_with(BootDetail::NoCandidate, device);
        };

        let current = device.current_version();
        if candidate.version <= current {
            info!(
                "candidate {} from {} is not newer than {current}",
                candidate.version, candidate.source
            );
            self.reporter.report(StatusCode::UpToDate);
            return continue_with(BootDetail::UpToDate, device);
        }
        info!(
            "updating {current} -> {} from {}",
            candidate.version, candidate.source
        );

        // Backup before any mutation of the active set.
        self.enter(BootStep::Backup);
        let managed =
            match Manifest::sanitize(&self.config.managed_paths, &self.config.protected_paths) {
                Ok(manifest) => manifest,
                Err(e) => {
                    error!("configured managed set is malformed ({e}), aborting update");
                    self.reporter.report(StatusCode::UpdateFailed);
                    return continue_with(BootDetail::UpdateAborted, device);
                }
            };
        if let Err(e) = BackupManager::new(self.layout).capture(&managed) {
            error!("backup capture failed ({e}), aborting update");
            self.reporter.report(StatusCode::UpdateFailed);
            return continue_with(BootDetail::UpdateAborted, device);
        }
        if let Err(e) = state::write_journal(self.layout, &candidate.token) {
            error!("apply journal write failed ({e}), aborting update");
            self.reporter.report(StatusCode::UpdateFailed);
            return continue_with(BootDetail::UpdateAborted, device);
        }

        self.enter(BootStep::Apply);
        self.reporter.report(StatusCode::Applying);
        let engine = ApplyEngine::new(self.layout);
        let source = candidate.source;
        let arbiter = &mut *self.arbiter;
        let watchdog = self.watchdog;
        // Fed per entry: each fetch may block up to the download timeout.
        if let Err(e) = engine.apply(&candidate, |entry| {
            watchdog.feed();
            arbiter.read_entry(source, entry)
        }) {
            warn!("apply failed: {e}");
        }

        // Trust only the durable marker, not the in-memory result: the
        // same check must hold when this boot is the recovery sweep's
        // predecessor.
        self.enter(BootStep::Verify);
        let confirmed =
            state::read_apply_marker(self.layout).as_deref() == Some(candidate.token.as_str());
        if confirmed && self.confirm_apply(&candidate.token, &mut device) {
            info!("update to {} confirmed", candidate.token);
            self.reporter.report(StatusCode::UpdateApplied);
            return BootReport {
                outcome: BootOutcome::Reboot,
                gesture: Some(gesture),
                detail: BootDetail::UpdateApplied,
                state: device,
            };
        }

        let detail = self.auto_restore();
        BootReport {
            outcome: BootOutcome::Reboot,
            gesture: Some(gesture),
            detail,
            state: device,
        }
    }

    // -----------------------------------------------------------------------
    // Shared tails
    // -----------------------------------------------------------------------

    /// Persist the new version token and clean up the transient markers.
    /// Returns `false` if the token could not be made durable.
    fn confirm_apply(&mut self, token: &str, device: &mut DeviceState) -> bool {
        if let Err(e) = state::persist_version(self.layout, token) {
            error!("version marker write failed: {e}");
            return false;
        }
        device.version_token = Some(token.to_string());
        state::clear_journal(self.layout).ok();
        state::clear_apply_marker(self.layout).ok();
        true
    }

    /// Put the snapshot back over the (possibly half-written) active set.
    ///
    /// The journal is removed even when the restore fails — a persistently
    /// broken backup must degrade to a logged failure, not a reboot loop.
    fn auto_restore(&mut self) -> BootDetail {
        self.enter(BootStep::AutoRestore);
        let detail = match BackupManager::new(self.layout).restore() {
            Ok(()) => {
                info!("active set restored from snapshot");
                self.reporter.report(StatusCode::FailedThenRestored);
                BootDetail::UpdateFailedRestored
            }
            Err(e) => {
                error!("auto-restore failed ({e}), rebooting with current active set");
                self.reporter.report(StatusCode::UpdateFailed);
                BootDetail::UpdateFailed
            }
        };
        state::clear_journal(self.layout).ok();
        state::clear_apply_marker(self.layout).ok();
        detail
    }

    fn enter(&mut self, next: BootStep) {
        info!("boot step: {} -> {}", self.step.name(), next.name());
        self.watchdog.feed();
        self.step = next;
    }
}
