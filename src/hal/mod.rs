//! Register-level ATmega328P access, compiled only for AVR targets

pub mod adc;
pub mod eeprom;
pub mod exint;
pub mod front_end;
pub mod gpio;
pub mod lcd_bus;
pub mod timer;
pub mod uart;

// Re-export commonly used types
pub use adc::Adc;
pub use eeprom::Eeprom;
pub use front_end::MeterHardware;
pub use gpio::{board, Input, Output, Pin};
pub use lcd_bus::PortLcdBus;
pub use timer::{CaptureTimer, Delay, TickTimer};
pub use uart::Console;
