//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the device if boot-time update
//! work or the monitoring loop stalls.  The budget is generous because
//! a single legitimate step (a large file copy during apply, the full
//! gesture window) can take a few seconds.
//!
//! The main task feeds it between orchestrator steps and once per
//! monitoring-loop tick.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::ports::WatchdogFeed;

/// TWDT timeout.  The controller feeds between steps, so the budget only
/// has to outlast the longest single blocking operation — one asset
/// download, bounded by `download_timeout_ms` (30 s default).
pub const TIMEOUT_MS: u32 = 60_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the current task.
    ///
    /// Subscription failure is tolerated: the device still boots, just
    /// without stall protection, and `feed` becomes a no-op.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        let cfg = esp_task_wdt_config_t {
            timeout_ms: TIMEOUT_MS,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: cfg outlives the call; reconfigure copies it.
        let rc = unsafe { esp_task_wdt_reconfigure(&cfg) };
        if rc != ESP_OK {
            log::warn!("TWDT reconfigure returned {rc} (may already be configured)");
        }

        // SAFETY: null task handle means the calling task.
        let rc = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
        if rc == ESP_OK {
            log::info!("Watchdog: subscribed ({}s timeout)", TIMEOUT_MS / 1000);
        } else {
            log::warn!("Watchdog: failed to subscribe ({rc})");
        }
        Self {
            subscribed: rc == ESP_OK,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        log::info!("Watchdog(sim): no-op");
        Self {}
    }

    /// Feed the watchdog.  Must be called at least every [`TIMEOUT_MS`].
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: only called after new() subscribed this task.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}

impl WatchdogFeed for Watchdog {
    fn feed(&self) {
        Watchdog::feed(self);
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}
