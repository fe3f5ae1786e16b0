//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter  | Implements     | Connects to                    |
//! |----------|----------------|--------------------------------|
//! | `time`   | `Clock`        | ESP high-resolution timer      |
//! | `wifi`   | `Connectivity` | ESP-IDF WiFi STA               |
//! | `http`   | `HttpFetch`    | ESP-IDF HTTP client            |
//! | `sdcard` | `VolumeMount`  | SD card over SPI, FAT VFS      |
//! | `vfs`    | data partition | wear-levelled FAT on flash     |
//! | `system` | restart seam   | `esp_restart`                  |
//!
//! Every adapter compiles on the host with a simulation fallback so the
//! orchestrator and its tests never need a device.

pub mod http;
pub mod sdcard;
pub mod system;
pub mod time;
pub mod vfs;
pub mod wifi;
