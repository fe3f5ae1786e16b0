//! Boot-time button gesture classification.
//!
//! One digital input, one bounded window, three outcomes:
//!
//! ```text
//! no press within window            -> None
//! one press, gap passes quietly     -> Single
//! second press within the gap       -> Double
//! ```
//!
//! The pure sampling machine ([`GestureDetector`]) is advanced by
//! `(now_ms, pressed)` observations and is fully host-testable; [`detect`]
//! wraps it in a blocking poll loop over the button and clock ports.
//! Classification is final once the window or the gap expires — presses
//! after that are ignored.  A double is reported as soon as the second
//! press debounces; nothing waits for its release.

use log::info;

use crate::ports::{ButtonProbe, Clock};

/// Classified boot-time user intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootGesture {
    None,
    Single,
    Double,
}

/// Poll period of the blocking wrapper.
const SAMPLE_PERIOD_MS: u32 = 10;
/// A press shorter than this is contact bounce, not intent.
const DEBOUNCE_MS: u32 = 50;

// ---------------------------------------------------------------------------
// Sampling state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No press seen yet; the outer window is running.
    Idle,
    /// First press in progress.
    FirstPress { since_ms: u64 },
    /// First press released; the double-press gap is running.
    AwaitSecond { released_ms: u64 },
    /// Second press in progress, not yet past debounce.
    SecondPress { released_ms: u64, since_ms: u64 },
    Done(BootGesture),
}

/// Pure gesture classifier.  Feed it `(now_ms, pressed)` samples until it
/// yields; it keeps yielding the same answer afterwards.
pub struct GestureDetector {
    window_ms: u32,
    gap_ms: u32,
    start_ms: Option<u64>,
    phase: Phase,
}

impl GestureDetector {
    pub fn new(window_ms: u32, gap_ms: u32) -> Self {
        Self {
            window_ms,
            gap_ms,
            start_ms: None,
            phase: Phase::Idle,
        }
    }

    /// Advance the machine with one observation.  `now_ms` must be
    /// monotonic across calls.
    pub fn sample(&mut self, now_ms: u64, pressed: bool) -> Option<BootGesture> {
        let start = *self.start_ms.get_or_insert(now_ms);

        self.phase = match self.phase {
            Phase::Idle => {
                if now_ms - start >= u64::from(self.window_ms) {
                    Phase::Done(BootGesture::None)
                } else if pressed {
                    Phase::FirstPress { since_ms: now_ms }
                } else {
                    Phase::Idle
                }
            }

            Phase::FirstPress { since_ms } => {
                let held = now_ms - since_ms;
                if now_ms - start >= u64::from(self.window_ms) {
                    // Window closed mid-press; a real press counts as Single.
                    if held >= u64::from(DEBOUNCE_MS) {
                        Phase::Done(BootGesture::Single)
                    } else {
                        Phase::Done(BootGesture::None)
                    }
                } else if !pressed {
                    if held >= u64::from(DEBOUNCE_MS) {
                        Phase::AwaitSecond { released_ms: now_ms }
                    } else {
                        // Contact bounce.
                        Phase::Idle
                    }
                } else {
                    Phase::FirstPress { since_ms }
                }
            }

            Phase::AwaitSecond { released_ms } => {
                if now_ms - released_ms >= u64::from(self.gap_ms) {
                    Phase::Done(BootGesture::Single)
                } else if pressed {
                    Phase::SecondPress {
                        released_ms,
                        since_ms: now_ms,
                    }
                } else {
                    Phase::AwaitSecond { released_ms }
                }
            }

            Phase::SecondPress {
                released_ms,
                since_ms,
            } => {
                if pressed {
                    if now_ms - since_ms >= u64::from(DEBOUNCE_MS) {
                        Phase::Done(BootGesture::Double)
                    } else {
                        Phase::SecondPress {
                            released_ms,
                            since_ms,
                        }
                    }
                } else if now_ms - since_ms >= u64::from(DEBOUNCE_MS) {
                    Phase::Done(BootGesture::Double)
                } else {
                    // Bounce during the gap; keep waiting for a real press.
                    Phase::AwaitSecond { released_ms }
                }
            }

            done @ Phase::Done(_) => done,
        };

        match self.phase {
            Phase::Done(gesture) => Some(gesture),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Blocking wrapper
// ---------------------------------------------------------------------------

/// Sample the button until the gesture is classified.
///
/// Blocks the caller for at most `window_ms + gap_ms` (plus one sample
/// period); with validated config that is under 3 s.
pub fn detect(
    button: &mut dyn ButtonProbe,
    clock: &dyn Clock,
    window_ms: u32,
    gap_ms: u32,
) -> BootGesture {
    let mut detector = GestureDetector::new(window_ms, gap_ms);
    loop {
        if let Some(gesture) = detector.sample(clock.now_ms(), button.is_pressed()) {
            info!("boot gesture: {gesture:?}");
            return gesture;
        }
        clock.sleep_ms(SAMPLE_PERIOD_MS);
    }
}
