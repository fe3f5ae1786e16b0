//! Status signalling over the single status LED.
//!
//! The orchestrator's only feedback channel is one LED, so every named
//! state maps to a fixed blink pattern a human can tell apart by pulse
//! count. A pattern is a frame string of `1`/`0`; each frame holds the
//! lamp on or off for 150 ms, and the whole pattern is played twice with
//! a 300 ms dark pause after each repetition.
//!
//! ## Pattern table
//!
//! | Code                 | Frames     | Reads as                  |
//! |----------------------|------------|---------------------------|
//! | `Connecting`         | `10`       | single quick blink        |
//! | `Checking`           | `1010`     | double blink              |
//! | `Applying`           | `101010`   | triple blink              |
//! | `UpToDate`           | `11`       | one long pulse            |
//! | `UpdateApplied`      | `11011`    | long-short                |
//! | `UpdateFailed`       | `111`      | one very long pulse       |
//! | `FailedThenRestored` | `1110111`  | two very long pulses      |
//! | `RollbackStarted`    | `1011`     | short-long                |
//! | `RollbackApplied`    | `110110`   | two long pulses           |
//! | `NoBackup`           | `11101`    | very long, then short     |
//!
//! Reporting is write-only and best-effort: a dead LED must never fail
//! the update flow, so nothing here returns a `Result`.

use log::debug;

use crate::ports::{Clock, StatusLamp};

/// On/off time per frame.
const FRAME_MS: u32 = 150;
/// Dark pause after each pattern repetition.
const PAUSE_MS: u32 = 300;
/// How many times each pattern is played.
const REPEATS: u32 = 2;

/// Closed set of reportable orchestrator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Connecting,
    Checking,
    Applying,
    UpToDate,
    UpdateApplied,
    UpdateFailed,
    FailedThenRestored,
    RollbackStarted,
    RollbackApplied,
    NoBackup,
}

impl StatusCode {
    /// Every code, for exhaustiveness checks in tests.
    pub const ALL: [Self; 10] = [
        Self::Connecting,
        Self::Checking,
        Self::Applying,
        Self::UpToDate,
        Self::UpdateApplied,
        Self::UpdateFailed,
        Self::FailedThenRestored,
        Self::RollbackStarted,
        Self::RollbackApplied,
        Self::NoBackup,
    ];

    /// Frame string for this code; `1` = lamp on, `0` = lamp off.
    pub fn frames(self) -> &'static str {
        match self {
            Self::Connecting => "10",
            Self::Checking => "1010",
            Self::Applying => "101010",
            Self::UpToDate => "11",
            Self::UpdateApplied => "11011",
            Self::UpdateFailed => "111",
            Self::FailedThenRestored => "1110111",
            Self::RollbackStarted => "1011",
            Self::RollbackApplied => "110110",
            Self::NoBackup => "11101",
        }
    }
}

/// Plays [`StatusCode`] patterns on a [`StatusLamp`].
pub struct StatusReporter<'a> {
    lamp: &'a mut dyn StatusLamp,
    clock: &'a dyn Clock,
}

impl<'a> StatusReporter<'a> {
    pub fn new(lamp: &'a mut dyn StatusLamp, clock: &'a dyn Clock) -> Self {
        Self { lamp, clock }
    }

    /// Play the pattern for `code`, blocking for its duration.
    ///
    /// The longest pattern is 7 frames ≈ (7×150 + 300)×2 = 2.7 s.
    pub fn report(&mut self, code: StatusCode) {
        debug!("status: {code:?}");
        for _ in 0..REPEATS {
            for frame in code.frames().chars() {
                self.lamp.set(frame == '1');
                self.clock.sleep_ms(FRAME_MS);
            }
            self.lamp.set(false);
            self.clock.sleep_ms(PAUSE_MS);
        }
    }
}
