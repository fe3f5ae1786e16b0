//! Port traits — the seams between orchestrator logic and the platform.
//!
//! | Port           | Device adapter          | Host / test adapter      |
//! |----------------|-------------------------|--------------------------|
//! | `ButtonProbe`  | `drivers::button`       | scripted press timeline  |
//! | `StatusLamp`   | `drivers::status_led`   | frame recorder           |
//! | `Clock`        | `adapters::time`        | simulated clock          |
//! | `WatchdogFeed` | `drivers::watchdog`     | feed counter             |
//! | `Connectivity` | `adapters::wifi`        | flag                     |
//! | `HttpFetch`    | `adapters::http`        | canned responses         |
//! | `VolumeMount`  | `adapters::sdcard`      | temp directory           |
//!
//! Core modules depend only on these traits; everything ESP-IDF lives on
//! the adapter side of the seam.

use std::path::Path;

use crate::error::{CommsError, SourceError};

// ---------------------------------------------------------------------------
// Boot-time user input / output
// ---------------------------------------------------------------------------

/// Debounced-at-the-sampling-level digital input.
pub trait ButtonProbe {
    /// Raw instantaneous level; `true` = pressed.
    fn is_pressed(&mut self) -> bool;
}

/// Single binary status output.  Write-only and best-effort: adapters
/// swallow their own I/O failures, a dead LED must never fail an update.
pub trait StatusLamp {
    fn set(&mut self, on: bool);
}

/// Monotonic time and blocking delay.
pub trait Clock {
    fn now_ms(&self) -> u64;
    fn sleep_ms(&self, ms: u32);
}

/// Stall protection.  The controller feeds this between steps and once
/// per applied manifest entry, so the hardware watchdog's budget only has
/// to cover the longest single blocking operation, not a whole pass.
pub trait WatchdogFeed {
    fn feed(&self);
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// Station-mode network association.
pub trait Connectivity {
    /// Associate and obtain an address, blocking up to `timeout_ms`.
    fn connect(&mut self, timeout_ms: u32) -> Result<(), CommsError>;
    fn is_connected(&self) -> bool;
}

/// Response to a completed HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Blocking HTTP GET with a per-request deadline.
pub trait HttpFetch {
    fn get(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        timeout_ms: u32,
    ) -> Result<HttpResponse, SourceError>;
}

// ---------------------------------------------------------------------------
// Removable storage
// ---------------------------------------------------------------------------

/// A mountable filesystem volume (the SD card).
pub trait VolumeMount {
    /// Attempt to mount (idempotent).  `true` when the volume is readable.
    fn mount(&mut self) -> bool;
    /// Filesystem root once mounted.
    fn root(&self) -> &Path;
}
