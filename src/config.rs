//! Configuration constants for both lab programs

use crate::logger::Level;

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = 8_000_000;

/// Scheduler tick in milliseconds (Timer2 compare match)
pub const TICK_MS: u16 = 1;

/// Timer2 compare value for a 1ms tick at /64
pub const TICK_COMPARE: u8 = 124;

/// Console baud rate
pub const UART_BAUD: u32 = 9600;

/// Boot splash duration in milliseconds
pub const SPLASH_MS: u16 = 2000;

#[cfg(feature = "debug")]
pub const LOG_LEVEL: Level = Level::Debug;
#[cfg(not(feature = "debug"))]
pub const LOG_LEVEL: Level = Level::Info;

/// Character LCD geometry and timing
pub mod lcd {
    pub const COLUMNS: u8 = 16;
    pub const LINES: u8 = 2;
    /// Enable pulse width in microseconds
    pub const ENABLE_PULSE_US: u16 = 1000;
}

/// Reaction-time tester (lab1)
pub mod reaction {
    /// Confirm button debounce period
    pub const DEBOUNCE_PERIOD_MS: u16 = 30;
    /// Game state machine period
    pub const STATE_MACHINE_PERIOD_MS: u16 = 50;
    /// Screen refresh period
    pub const DISPLAY_PERIOD_MS: u16 = 100;

    /// Ticks spent in WAIT before the indicator comes on
    pub const WAIT_DURATION_TICKS: u16 = 2000;
    /// Response counter ceiling; reaching it means "too slow"
    pub const RESPONSE_CEILING_TICKS: u16 = 400;

    /// EEPROM slot of the best score
    pub const BEST_SCORE_SLOT: u16 = 0;
}

/// Autoranging multimeter (lab2)
pub mod multimeter {
    pub const BUTTON_PERIOD_MS: u16 = 30;
    pub const BUTTON_EVENT_PERIOD_MS: u16 = 100;
    pub const MEASUREMENT_PERIOD_MS: u16 = 200;
    pub const AUTORANGING_PERIOD_MS: u16 = 300;
    pub const DISPLAY_PERIOD_MS: u16 = 500;

    /// Timer1 prescalers, finest first
    pub const PRESCALERS: [u16; 5] = [1, 8, 64, 256, 1024];
    /// Lowest frequency each prescaler measures accurately
    pub const FREQUENCY_LOWER_HZ: [u32; 5] = [2000, 1000, 500, 100, 0];

    /// ADC references in millivolts
    pub const VREF_HIGH_MV: u16 = 5000;
    pub const VREF_LOW_MV: u16 = 1100;
    /// Full-scale 10-bit ADC reading
    pub const ADC_FULL_SCALE: f32 = 1023.0;

    /// Above this (on the 1.1V reference) switch to 5V
    pub const VOLTAGE_UPPER_V: f32 = 1.0;
    /// Below this (on the 5V reference) switch to 1.1V
    pub const VOLTAGE_LOWER_V: f32 = 0.8;

    /// Divider supply voltage
    pub const SUPPLY_V: f32 = 5.0;
    /// Reference resistors in ohms
    pub const R_LOW_OHM: u16 = 1000;
    pub const R_HIGH_OHM: u16 = 10000;
    /// Above this (on 1k) switch to 10k
    pub const RESISTANCE_UPPER_KOHM: f32 = 8.0;
    /// Below this (on 10k) switch to 1k
    pub const RESISTANCE_LOWER_KOHM: f32 = 6.0;
}
