//! TankMon Firmware — Main Entry Point
//!
//! Boot sequence:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ bootstrap → hw_init → watchdog → data partition → config     │
//! │      │                                                        │
//! │      ▼                                                        │
//! │ WiFi connect (best effort) → update sources (feed, SD card)  │
//! │      │                                                        │
//! │      ▼                                                        │
//! │ RollbackController::run  ──► Reboot ── esp_restart           │
//! │      │                                                        │
//! │      └──► ContinueBoot ── monitoring loop (sensors, heartbeat)│
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The controller owns every update decision; `main` only wires adapters
//! to ports and executes the terminal action.

#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use tankmon::adapters::sdcard::SdCardVolume;
use tankmon::adapters::time::SystemClock;
use tankmon::adapters::{system, vfs, wifi::WifiLink};
use tankmon::config::{SecretsConfig, SystemConfig};
use tankmon::drivers::button::BootButton;
use tankmon::drivers::status_led::StatusLed;
use tankmon::drivers::watchdog::Watchdog;
use tankmon::drivers::hw_init::{self, ADC_CH_PUMP_CURRENT, ADC_CH_WATER_TEMP};
use tankmon::orchestrator::{BootOutcome, RollbackController};
use tankmon::ports::{Clock, Connectivity};
use tankmon::status::{StatusCode, StatusReporter};
use tankmon::update::release::ReleaseFeedSource;
use tankmon::update::removable::RemovableSource;
use tankmon::update::source::SourceArbiter;
use tankmon::update::state;
use tankmon::update::Layout;

/// Monitoring loop period.  Sensor trends in an aquarium move over
/// minutes; one second is plenty.
const MONITOR_TICK_MS: u32 = 1_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }

    info!("╔══════════════════════════════════════╗");
    info!("║  TankMon v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Hardware peripherals + watchdog ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt.
        // The watchdog reset recovers the device after timeout.
        error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    let watchdog = Watchdog::new();
    let clock = SystemClock::new();

    // ── 3. Data partition ─────────────────────────────────────
    // Without the data partition there is no bundle, no backup, and
    // nothing to update; skip straight to degraded monitoring.
    let Ok(data_root) = vfs::mount_data_partition() else {
        error!("data partition unavailable, monitoring without a bundle");
        run_monitoring_loop(&watchdog, &clock);
    };
    let layout = Layout::under(&data_root);

    // ── 4. Configuration ──────────────────────────────────────
    let config = SystemConfig::load_or_default(&layout.active_root.join("config.json"));
    let secrets = SecretsConfig::load(&layout.secrets_file).unwrap_or_default();

    // ── 5. Status reporter ────────────────────────────────────
    let mut lamp = StatusLed::new();
    let mut reporter = StatusReporter::new(&mut lamp, &clock);

    // ── 6. WiFi (best effort) ─────────────────────────────────
    let online = if secrets.has_wifi() {
        reporter.report(StatusCode::Connecting);
        match connect_wifi(&secrets, &config) {
            Ok(()) => true,
            Err(e) => {
                warn!("WiFi unavailable ({e}), checking removable media only");
                false
            }
        }
    } else {
        info!("no WiFi credentials provisioned, checking removable media only");
        false
    };

    // ── 7. Update sources, feed first ─────────────────────────
    let mut sources = SourceArbiter::new();
    sources.push(Box::new(ReleaseFeedSource::new(
        &config,
        secrets.feed_token.clone(),
        online,
        tankmon::adapters::http::EspHttpFetch::new(),
    )));
    sources.push(Box::new(RemovableSource::new(
        sd_card_volume(),
        config.protected_paths.clone(),
    )));

    // ── 8. Update / rollback pass ─────────────────────────────
    watchdog.feed();
    let device = state::load(&layout);
    let mut button = BootButton::new();
    let mut controller = RollbackController::new(
        &config,
        &layout,
        &mut sources,
        &mut button,
        &clock,
        &watchdog,
        reporter,
    );
    let report = controller.run(device);
    watchdog.feed();
    info!(
        "boot pass finished: {:?} (gesture {:?})",
        report.detail, report.gesture
    );

    match report.outcome {
        BootOutcome::Reboot => system::restart(&format!("{:?}", report.detail)),
        BootOutcome::ContinueBoot => run_monitoring_loop(&watchdog, &clock),
    }
}

#[cfg(target_os = "espidf")]
fn connect_wifi(secrets: &SecretsConfig, config: &SystemConfig) -> Result<()> {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let mut wifi = WifiLink::new(peripherals.modem, sysloop, nvs, secrets)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    wifi.connect(config.wifi_connect_timeout_ms)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    // The driver must stay alive for the feed requests later in boot.
    std::mem::forget(wifi);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn connect_wifi(secrets: &SecretsConfig, config: &SystemConfig) -> Result<()> {
    let mut wifi = WifiLink::new(secrets).map_err(|e| anyhow::anyhow!("{e}"))?;
    wifi.connect(config.wifi_connect_timeout_ms)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(())
}

#[cfg(target_os = "espidf")]
fn sd_card_volume() -> SdCardVolume {
    SdCardVolume::new()
}

#[cfg(not(target_os = "espidf"))]
fn sd_card_volume() -> SdCardVolume {
    let root = std::env::var_os("TANKMON_SDCARD_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from("./sdcard"));
    SdCardVolume::simulated(root)
}

/// Monitoring application stand-in: sample the tank sensors, log a
/// heartbeat, feed the watchdog.  The real application bundle drives
/// this from its own rules once loaded.
fn run_monitoring_loop(watchdog: &Watchdog, clock: &SystemClock) -> ! {
    info!("monitoring loop started");
    let mut tick: u64 = 0;
    loop {
        let temp_raw = hw_init::adc1_read(ADC_CH_WATER_TEMP);
        let current_raw = hw_init::adc1_read(ADC_CH_PUMP_CURRENT);
        if tick % 60 == 0 {
            info!("heartbeat: temp_raw={temp_raw} current_raw={current_raw}");
        }
        watchdog.feed();
        clock.sleep_ms(MONITOR_TICK_MS);
        tick += 1;
    }
}
