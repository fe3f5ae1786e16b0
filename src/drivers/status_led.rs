//! Status LED driver.
//!
//! Single LED, active HIGH, driven only by the boot status reporter.
//! On the host the GPIO write is a no-op; the last level is kept
//! in-memory so tests can read it back.

use crate::drivers::hw_init;
use crate::pins;
use crate::ports::StatusLamp;

pub struct StatusLed {
    gpio: i32,
    lit: bool,
}

impl StatusLed {
    pub fn new() -> Self {
        Self {
            gpio: pins::STATUS_LED_GPIO,
            lit: false,
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl Default for StatusLed {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusLamp for StatusLed {
    fn set(&mut self, on: bool) {
        hw_init::gpio_write(self.gpio, on);
        self.lit = on;
    }
}
