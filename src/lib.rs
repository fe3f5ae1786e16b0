//! TankMon firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod config;
pub mod error;
pub mod gesture;
pub mod orchestrator;
pub mod pins;
pub mod ports;
pub mod status;
pub mod update;

pub mod adapters;
pub mod drivers;
