//! Multi-boot persistence: crash recovery and rollback round trips.
//!
//! Each test runs the controller more than once over the same data
//! partition, which is exactly what consecutive power cycles look like.

use tankmon::orchestrator::{BootDetail, BootOutcome};
use tankmon::update::backup::BackupManager;
use tankmon::update::manifest::Manifest;
use tankmon::update::removable::RemovableSource;
use tankmon::update::source::SourceArbiter;
use tankmon::update::state;

use crate::mock_env::{run_boot, Fixture};

fn card_arbiter(fixture: &Fixture) -> SourceArbiter {
    let mut arbiter = SourceArbiter::new();
    arbiter.push(Box::new(RemovableSource::new(
        fixture.sd_volume(),
        fixture.config.protected_paths.clone(),
    )));
    arbiter
}

fn double_press() -> Vec<(u64, bool)> {
    vec![(0, true), (100, false), (400, true), (500, false)]
}

#[test]
fn update_then_rollback_round_trip() {
    let fixture = Fixture::new();
    fixture.write_active("config.json", "v1 config");
    fixture.write_active("rules.json", "v1 rules");
    state::persist_version(&fixture.layout, "1.0").unwrap();
    fixture.write_sd_update("1.1", &[("config.json", "v2 config"), ("rules.json", "v2 rules")]);

    // Boot 1: the card update applies.
    let report = run_boot(&fixture, &mut card_arbiter(&fixture), vec![]);
    assert_eq!(report.outcome, BootOutcome::Reboot);
    assert_eq!(report.detail, BootDetail::UpdateApplied);
    assert_eq!(fixture.read_active("config.json"), "v2 config");

    // Boot 2: double press rolls the device back.
    let report = run_boot(&fixture, &mut card_arbiter(&fixture), double_press());
    assert_eq!(report.detail, BootDetail::RolledBack);
    assert_eq!(fixture.read_active("config.json"), "v1 config");
    assert_eq!(fixture.read_active("rules.json"), "v1 rules");
    assert_eq!(state::load(&fixture.layout).version_token, None);

    // Boot 3: marker gone, so the same 1.1 candidate applies again.
    let report = run_boot(&fixture, &mut card_arbiter(&fixture), vec![]);
    assert_eq!(report.detail, BootDetail::UpdateApplied);
    assert_eq!(fixture.read_active("config.json"), "v2 config");
}

#[test]
fn applied_update_is_not_reapplied_next_boot() {
    let fixture = Fixture::new();
    fixture.write_active("config.json", "v1");
    fixture.write_sd_update("1.1", &[("config.json", "v2")]);

    let report = run_boot(&fixture, &mut card_arbiter(&fixture), vec![]);
    assert_eq!(report.detail, BootDetail::UpdateApplied);

    // Same card still inserted on the next boot.
    let report = run_boot(&fixture, &mut card_arbiter(&fixture), vec![]);
    assert_eq!(report.outcome, BootOutcome::ContinueBoot);
    assert_eq!(report.detail, BootDetail::UpToDate);
}

#[test]
fn crash_before_marker_restores_on_next_boot() {
    let fixture = Fixture::new();
    fixture.write_active("config.json", "v1");
    state::persist_version(&fixture.layout, "1.0").unwrap();

    // Hand-build the crash site: snapshot taken, journal written, copy
    // half done, no apply marker.
    let managed =
        Manifest::sanitize(&fixture.config.managed_paths, &fixture.config.protected_paths)
            .unwrap();
    BackupManager::new(&fixture.layout).capture(&managed).unwrap();
    state::write_journal(&fixture.layout, "1.1").unwrap();
    fixture.write_active("config.json", "torn write");

    let report = run_boot(&fixture, &mut card_arbiter(&fixture), vec![]);
    assert_eq!(report.outcome, BootOutcome::Reboot);
    assert_eq!(report.detail, BootDetail::UpdateFailedRestored);
    assert_eq!(fixture.read_active("config.json"), "v1");
    assert_eq!(
        state::load(&fixture.layout).version_token.as_deref(),
        Some("1.0")
    );

    // The boot after the recovery reboot is clean.
    let report = run_boot(&fixture, &mut card_arbiter(&fixture), vec![]);
    assert_eq!(report.outcome, BootOutcome::ContinueBoot);
    assert_eq!(report.detail, BootDetail::NoCandidate);
}

#[test]
fn crash_after_marker_rolls_forward_on_next_boot() {
    let fixture = Fixture::new();
    fixture.write_active("config.json", "v2 complete");
    state::persist_version(&fixture.layout, "1.0").unwrap();
    state::write_journal(&fixture.layout, "1.1").unwrap();
    state::write_apply_marker(&fixture.layout, "1.1").unwrap();

    let report = run_boot(&fixture, &mut card_arbiter(&fixture), vec![]);
    assert_eq!(report.outcome, BootOutcome::Reboot);
    assert_eq!(report.detail, BootDetail::RolledForward);
    assert_eq!(
        state::load(&fixture.layout).version_token.as_deref(),
        Some("1.1")
    );
    assert_eq!(fixture.read_active("config.json"), "v2 complete");
}

#[test]
fn recovery_outranks_a_requested_rollback() {
    let fixture = Fixture::new();
    fixture.write_active("config.json", "v1");
    let managed =
        Manifest::sanitize(&fixture.config.managed_paths, &fixture.config.protected_paths)
            .unwrap();
    BackupManager::new(&fixture.layout).capture(&managed).unwrap();
    state::write_journal(&fixture.layout, "1.1").unwrap();

    // The user holds the button, but the sweep runs first and reboots;
    // the gesture is never even sampled.
    let report = run_boot(&fixture, &mut card_arbiter(&fixture), double_press());
    assert_eq!(report.detail, BootDetail::UpdateFailedRestored);
    assert_eq!(report.gesture, None);
}
