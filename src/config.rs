//! System configuration parameters
//!
//! All tunable parameters for the TankMon update orchestrator.
//! Loaded from `config.json` inside the active application bundle — which
//! means an update can ship new settings; anything missing or out of range
//! falls back to the compiled-in defaults.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// When the boot-time update check runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPolicy {
    /// Check on every boot; the button only disambiguates rollback.
    #[default]
    EveryBoot,
    /// Check only when the user single-presses during the boot window.
    SinglePress,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Boot gesture ---
    /// Button sampling window at boot (milliseconds)
    pub gesture_window_ms: u32,
    /// Gap after a release within which a second press counts as a double (milliseconds)
    pub gesture_gap_ms: u32,

    // --- Update check ---
    /// When the update check runs
    pub check_policy: CheckPolicy,
    /// Release-feed repository owner (empty disables the remote source)
    pub feed_owner: String,
    /// Release-feed repository name
    pub feed_repo: String,
    /// Release-feed API request timeout (milliseconds)
    pub api_timeout_ms: u32,
    /// Per-file download timeout (milliseconds)
    pub download_timeout_ms: u32,

    // --- Managed file set ---
    /// Bundle-relative paths an update may touch
    pub managed_paths: Vec<String>,
    /// Names an update must never touch
    pub protected_paths: Vec<String>,

    // --- Connectivity ---
    /// WiFi association timeout (milliseconds)
    pub wifi_connect_timeout_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Boot gesture
            gesture_window_ms: 2000,
            gesture_gap_ms: 1000,

            // Update check
            check_policy: CheckPolicy::EveryBoot,
            feed_owner: String::new(),
            feed_repo: String::new(),
            api_timeout_ms: 5_000,
            download_timeout_ms: 30_000,

            // Managed file set
            managed_paths: vec![
                "config.json".to_string(),
                "rules.json".to_string(),
                "calibration".to_string(),
                "web".to_string(),
            ],
            protected_paths: vec!["secrets.json".to_string()],

            // Connectivity
            wifi_connect_timeout_ms: 15_000,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  The boot gesture bound keeps the blocking
    /// button wait under 3 s total.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=2500).contains(&self.gesture_window_ms) {
            return Err(ConfigError::ValidationFailed("gesture_window_ms"));
        }
        if !(100..=1000).contains(&self.gesture_gap_ms) {
            return Err(ConfigError::ValidationFailed("gesture_gap_ms"));
        }
        if self.gesture_window_ms + self.gesture_gap_ms > 3000 {
            return Err(ConfigError::ValidationFailed(
                "gesture_window_ms + gesture_gap_ms",
            ));
        }
        if !(500..=5000).contains(&self.api_timeout_ms) {
            return Err(ConfigError::ValidationFailed("api_timeout_ms"));
        }
        if !(1000..=120_000).contains(&self.download_timeout_ms) {
            return Err(ConfigError::ValidationFailed("download_timeout_ms"));
        }
        if !(1000..=60_000).contains(&self.wifi_connect_timeout_ms) {
            return Err(ConfigError::ValidationFailed("wifi_connect_timeout_ms"));
        }
        if self.managed_paths.is_empty() {
            return Err(ConfigError::ValidationFailed("managed_paths"));
        }
        Ok(())
    }

    /// Strict load: read, parse, validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            info!("config not readable at {}: {e}", path.display());
            ConfigError::Load
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            warn!("config at {} is not valid JSON: {e}", path.display());
            ConfigError::Malformed
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load with fallback: any failure yields the compiled-in defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("using default config ({e})");
                Self::default()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// Device credentials, stored outside the managed bundle and never touched
/// by an update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// WiFi SSID (empty = offline device)
    pub wifi_ssid: heapless::String<32>,
    /// WiFi passphrase (WPA2, 8-63 chars, or empty for open networks)
    pub wifi_psk: heapless::String<64>,
    /// Release-feed API token
    pub feed_token: Option<String>,
}

impl SecretsConfig {
    pub fn load(path: &Path) -> Option<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                info!("no secrets at {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(secrets) => Some(secrets),
            Err(e) => {
                warn!("secrets at {} are not valid JSON: {e}", path.display());
                None
            }
        }
    }

    pub fn has_wifi(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.validate().is_ok());
        assert!(c.gesture_window_ms + c.gesture_gap_ms <= 3000);
        assert!(c.api_timeout_ms <= 5000);
        assert!(!c.managed_paths.is_empty());
        assert_eq!(c.check_policy, CheckPolicy::EveryBoot);
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.gesture_window_ms, c2.gesture_window_ms);
        assert_eq!(c.managed_paths, c2.managed_paths);
        assert_eq!(c.check_policy, c2.check_policy);
    }

    #[test]
    fn missing_fields_fill_from_defaults() {
        let c: SystemConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(c.gesture_window_ms, SystemConfig::default().gesture_window_ms);

        let c: SystemConfig =
            serde_json::from_str(r#"{"feed_owner":"tankmon","feed_repo":"bundle"}"#).unwrap();
        assert_eq!(c.feed_owner, "tankmon");
        assert_eq!(c.download_timeout_ms, 30_000);
    }

    #[test]
    fn check_policy_uses_snake_case() {
        let c: SystemConfig = serde_json::from_str(r#"{"check_policy":"single_press"}"#).unwrap();
        assert_eq!(c.check_policy, CheckPolicy::SinglePress);
    }

    #[test]
    fn out_of_range_gesture_window_is_rejected() {
        let config = SystemConfig {
            gesture_window_ms: 50,
            ..SystemConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ValidationFailed("gesture_window_ms"))
        );
    }

    #[test]
    fn gesture_budget_is_capped() {
        let config = SystemConfig {
            gesture_window_ms: 2500,
            gesture_gap_ms: 1000,
            ..SystemConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ValidationFailed(
                "gesture_window_ms + gesture_gap_ms"
            ))
        );
    }

    #[test]
    fn empty_managed_set_is_rejected() {
        let config = SystemConfig {
            managed_paths: Vec::new(),
            ..SystemConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ValidationFailed("managed_paths"))
        );
    }

    #[test]
    fn secrets_default_to_offline() {
        let s = SecretsConfig::default();
        assert!(!s.has_wifi());
        assert_eq!(s.feed_token, None);
    }

    #[test]
    fn secrets_parse_with_optional_token() {
        let s: SecretsConfig =
            serde_json::from_str(r#"{"wifi_ssid":"reef","wifi_psk":"corals123"}"#).unwrap();
        assert!(s.has_wifi());
        assert_eq!(s.feed_token, None);

        let s: SecretsConfig = serde_json::from_str(
            r#"{"wifi_ssid":"reef","wifi_psk":"corals123","feed_token":"ghp_abc"}"#,
        )
        .unwrap();
        assert_eq!(s.feed_token.as_deref(), Some("ghp_abc"));
    }
}
