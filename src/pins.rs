//! GPIO / peripheral pin assignments for the TankMon main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// User button (active-low with external pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button sampled during the boot gesture window.
/// LOW = pressed.
pub const BUTTON_GPIO: i32 = 0;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// Single status LED driven by the update orchestrator (active HIGH).
pub const STATUS_LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// SD card (SPI2 host)
// ---------------------------------------------------------------------------

pub const SD_SPI_MOSI_GPIO: i32 = 35;
pub const SD_SPI_MISO_GPIO: i32 = 37;
pub const SD_SPI_SCLK_GPIO: i32 = 36;
/// Chip select for the SD card socket.
pub const SD_SPI_CS_GPIO: i32 = 38;

// ---------------------------------------------------------------------------
// Sensors — Analog (ADC1), read by the monitoring application
// ---------------------------------------------------------------------------

/// NTC thermistor (water) — 10 kΩ @ 25 °C, voltage-divider to ADC.
pub const WATER_TEMP_ADC_GPIO: i32 = 5;
/// SCT-013 current clamp — burden-resistor output to ADC.
pub const CURRENT_ADC_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// UART debug
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 43;
pub const UART_RX_GPIO: i32 = 44;
