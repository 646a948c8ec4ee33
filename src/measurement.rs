//! Measurement registers written by the capture, overflow and ADC interrupts,
//! and the conversions from raw readings to physical quantities.

use portable_atomic::{AtomicU16, AtomicU32, Ordering};

use crate::config::multimeter::{ADC_FULL_SCALE, SUPPLY_V};
use crate::config::CPU_FREQ_HZ;

/// Frequency derived from input-capture ticks.
///
/// `hertz` is written only by the capture and overflow interrupts;
/// `divisor` only by the foreground when it changes the prescaler.
pub struct FrequencyCapture {
    hertz: AtomicU32,
    divisor: AtomicU16,
}

impl FrequencyCapture {
    pub const fn new(divisor: u16) -> Self {
        Self {
            hertz: AtomicU32::new(0),
            divisor: AtomicU16::new(divisor),
        }
    }

    /// Record the prescaler now driving the capture timer.
    pub fn set_divisor(&self, divisor: u16) {
        self.divisor.store(divisor, Ordering::Release);
    }

    pub fn divisor(&self) -> u16 {
        self.divisor.load(Ordering::Acquire)
    }

    /// Capture interrupt: `ticks` elapsed since the previous edge.
    pub fn on_capture(&self, ticks: u16) {
        if ticks == 0 {
            return;
        }
        let period = self.divisor() as u32 * ticks as u32;
        self.hertz.store(CPU_FREQ_HZ / period, Ordering::Release);
    }

    /// Overflow interrupt: no edge within a full timer period.
    pub fn on_overflow(&self) {
        self.hertz.store(0, Ordering::Release);
    }

    pub fn hertz(&self) -> u32 {
        self.hertz.load(Ordering::Acquire)
    }
}

/// One finished conversion, numbered in completion order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub raw: u16,
    pub sequence: u16,
}

impl Sample {
    /// Whether this conversion completed after conversion number `sequence`.
    /// Valid while the two are less than half the sequence space apart.
    pub fn is_after(self, sequence: u16) -> bool {
        (self.sequence.wrapping_sub(sequence) as i16) > 0
    }
}

/// Latest 10-bit conversion result and its sequence number, packed in one
/// word so a reader never pairs a result with another conversion's number.
/// Written only by the ADC interrupt.
pub struct AnalogChannel {
    latest: AtomicU32,
}

impl AnalogChannel {
    pub const fn new() -> Self {
        Self {
            latest: AtomicU32::new(0),
        }
    }

    pub fn on_conversion(&self, raw: u16) {
        let sequence = self.sample().sequence.wrapping_add(1);
        let packed = ((sequence as u32) << 16) | (raw & 0x03FF) as u32;
        self.latest.store(packed, Ordering::Release);
    }

    /// The most recent conversion; sequence 0 until the first one completes.
    pub fn sample(&self) -> Sample {
        let packed = self.latest.load(Ordering::Acquire);
        Sample {
            raw: packed as u16,
            sequence: (packed >> 16) as u16,
        }
    }
}

impl Default for AnalogChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert an ADC reading against a reference given in millivolts.
pub fn volts(raw: u16, reference_mv: u16) -> f32 {
    raw as f32 * (reference_mv as f32 / 1000.0) / ADC_FULL_SCALE
}

/// Unknown resistor of a divider against `reference_ohm`, in kilo-ohms.
/// An open circuit (divider node at the supply) reads as infinity.
pub fn resistance_kohm(volts: f32, reference_ohm: u16) -> f32 {
    if volts >= SUPPLY_V {
        return f32::INFINITY;
    }
    volts * reference_ohm as f32 / (SUPPLY_V - volts) / 1000.0
}

/// Round to thousandths for fixed-point display; saturates at `u32::MAX`.
pub fn to_milli(value: f32) -> u32 {
    (value * 1000.0 + 0.5) as u32
}
