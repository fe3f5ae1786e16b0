//! WiFi station-mode adapter.
//!
//! Implements the [`Connectivity`] port for the boot-time release-feed
//! check.  Update work is strictly boot-time and sequential, so there is
//! no reconnection loop here: one blocking connect attempt, then the
//! orchestrator either has a network or falls back to the SD card source.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from
//!   `esp_idf_svc::wifi`.
//! - **all other targets**: a flag, flipped after credential validation,
//!   for host-side simulation runs.

use core::fmt;

use log::{info, warn};

use crate::config::SecretsConfig;
use crate::error::CommsError;
use crate::ports::Connectivity;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl fmt::Display for WifiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Credential validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_credentials(ssid: &str, psk: &str) -> Result<(), CommsError> {
    if ssid.is_empty() || !is_printable_ascii(ssid) {
        warn!("WiFi: SSID invalid (must be 1-32 printable ASCII bytes)");
        return Err(CommsError::WifiConnectFailed);
    }
    // Empty = open network; WPA2 requires 8-64 bytes.
    if !psk.is_empty() && psk.len() < 8 {
        warn!("WiFi: passphrase invalid (must be 8-64 bytes for WPA2, or empty)");
        return Err(CommsError::WifiConnectFailed);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiLink {
    state: WifiState,
    ssid: heapless::String<32>,
    psk: heapless::String<64>,
    #[cfg(target_os = "espidf")]
    driver: BlockingWifi<EspWifi<'static>>,
}

impl WifiLink {
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        secrets: &SecretsConfig,
    ) -> Result<Self, CommsError> {
        let wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs)).map_err(|e| {
            warn!("WiFi: driver init failed: {e}");
            CommsError::WifiConnectFailed
        })?;
        let driver = BlockingWifi::wrap(wifi, sysloop).map_err(|e| {
            warn!("WiFi: blocking wrapper failed: {e}");
            CommsError::WifiConnectFailed
        })?;
        Ok(Self {
            state: WifiState::Disconnected,
            ssid: secrets.wifi_ssid.clone(),
            psk: secrets.wifi_psk.clone(),
            driver,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(secrets: &SecretsConfig) -> Result<Self, CommsError> {
        Ok(Self {
            state: WifiState::Disconnected,
            ssid: secrets.wifi_ssid.clone(),
            psk: secrets.wifi_psk.clone(),
        })
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, timeout_ms: u32) -> Result<(), CommsError> {
        // BlockingWifi applies its own per-phase deadlines; the caller's
        // budget is logged so a hung associate is attributable.
        info!(
            "WiFi: connecting to '{}' (budget {timeout_ms} ms)",
            self.ssid
        );
        let auth_method = if self.psk.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.clone(),
            password: self.psk.clone(),
            auth_method,
            ..Default::default()
        });

        let failed = |e: esp_idf_svc::sys::EspError| {
            warn!("WiFi: connect failed: {e}");
            CommsError::WifiConnectFailed
        };
        self.driver.set_configuration(&config).map_err(failed)?;
        self.driver.start().map_err(failed)?;
        self.driver.connect().map_err(failed)?;
        self.driver.wait_netif_up().map_err(failed)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, timeout_ms: u32) -> Result<(), CommsError> {
        info!(
            "WiFi(sim): connected to '{}' (budget {timeout_ms} ms)",
            self.ssid
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }
}

impl Connectivity for WifiLink {
    fn connect(&mut self, timeout_ms: u32) -> Result<(), CommsError> {
        if self.state == WifiState::Connected {
            return Ok(());
        }
        // Validate before touching the radio so a blank provisioning
        // never burns the connect budget.
        validate_credentials(&self.ssid, &self.psk)?;

        self.state = WifiState::Connecting;
        match self.platform_connect(timeout_ms) {
            Ok(()) => {
                self.state = WifiState::Connected;
                info!("WiFi: up");
                Ok(())
            }
            Err(e) => {
                self.state = WifiState::Failed;
                Err(e)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }
}
