//! Device restart seam.
//!
//! The orchestrator returns its terminal action to `main()`, and this is
//! the one place that actually pulls the trigger.  Kept out of the
//! orchestrator so host tests can assert on the returned action instead
//! of dying mid-test.

use log::warn;

/// Restart the device.  On the host the process exits cleanly instead,
/// which makes scripted simulation runs composable.
pub fn restart(reason: &str) -> ! {
    warn!("restarting device: {reason}");

    #[cfg(target_os = "espidf")]
    {
        // SAFETY: esp_restart takes no arguments and does not return.
        unsafe { esp_idf_svc::sys::esp_restart() };
        unreachable!("esp_restart returned");
    }

    #[cfg(not(target_os = "espidf"))]
    {
        log::info!("restart(sim): exiting process");
        std::process::exit(0);
    }
}
