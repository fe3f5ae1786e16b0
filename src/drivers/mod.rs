//! Board-level drivers: one-shot peripheral init and GPIO-backed ports.

pub mod button;
pub mod hw_init;
pub mod status_led;
pub mod watchdog;
