//! Boot gesture detection through the port traits.
//!
//! The state-machine unit tests live next to the detector; these runs
//! go through `gesture::detect` exactly as the orchestrator calls it,
//! with the default config windows.

use tankmon::config::SystemConfig;
use tankmon::gesture::{self, BootGesture};

use crate::mock_env::{ScriptButton, SimClock};

fn detect(presses: Vec<(u64, bool)>) -> BootGesture {
    let config = SystemConfig::default();
    let clock = SimClock::new();
    let mut button = ScriptButton::new(&clock, presses);
    gesture::detect(
        &mut button,
        &clock,
        config.gesture_window_ms,
        config.gesture_gap_ms,
    )
}

#[test]
fn idle_button_classifies_none() {
    assert_eq!(detect(vec![]), BootGesture::None);
}

#[test]
fn one_press_classifies_single() {
    assert_eq!(detect(vec![(0, true), (150, false)]), BootGesture::Single);
}

#[test]
fn two_presses_classify_double() {
    assert_eq!(
        detect(vec![(0, true), (100, false), (400, true), (520, false)]),
        BootGesture::Double
    );
}

#[test]
fn press_after_the_window_is_ignored() {
    // First press lands well past the 2 s window.
    assert_eq!(detect(vec![(2500, true), (2600, false)]), BootGesture::None);
}

#[test]
fn contact_bounce_is_not_a_press() {
    // 20 ms blip, under the 50 ms debounce.
    assert_eq!(detect(vec![(0, true), (20, false)]), BootGesture::None);
}

#[test]
fn held_press_still_classifies_single() {
    // Held through the whole window and beyond.
    assert_eq!(detect(vec![(0, true)]), BootGesture::Single);
}
