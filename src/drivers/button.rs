//! Boot button driver.
//!
//! Active-low momentary switch with a pull-up; a pressed button reads
//! LOW.  There is no ISR — the boot gesture window is the only consumer
//! and it polls at its own sample rate, so a level read is all the
//! hardware side has to provide.
//!
//! On the host the underlying GPIO read always reports idle, which makes
//! the gesture detector classify `None` and the boot continue — the
//! right default for a simulated run.

use crate::drivers::hw_init;
use crate::pins;
use crate::ports::ButtonProbe;

pub struct BootButton {
    gpio: i32,
}

impl BootButton {
    pub fn new() -> Self {
        Self {
            gpio: pins::BUTTON_GPIO,
        }
    }
}

impl Default for BootButton {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonProbe for BootButton {
    fn is_pressed(&mut self) -> bool {
        // Active low.
        !hw_init::gpio_read(self.gpio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_button_reads_idle() {
        let mut button = BootButton::new();
        assert!(!button.is_pressed());
    }
}
