//! Measurement ranges and the autoranging rules

use crate::config::multimeter::{
    FREQUENCY_LOWER_HZ, PRESCALERS, RESISTANCE_LOWER_KOHM, RESISTANCE_UPPER_KOHM, R_HIGH_OHM,
    R_LOW_OHM, VOLTAGE_LOWER_V, VOLTAGE_UPPER_V, VREF_HIGH_MV, VREF_LOW_MV,
};

/// Capture timer prescaler, by position in the prescaler table
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Prescaler(u8);

impl Prescaler {
    pub const FINEST: Self = Self(0);
    pub const COARSEST: Self = Self(PRESCALERS.len() as u8 - 1);

    pub const fn from_index(index: u8) -> Option<Self> {
        if (index as usize) < PRESCALERS.len() {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    /// Clock divisor applied to the CPU clock
    pub const fn divisor(self) -> u16 {
        PRESCALERS[self.0 as usize]
    }

    /// Lowest frequency this prescaler measures accurately
    pub const fn lower_bound_hz(self) -> u32 {
        FREQUENCY_LOWER_HZ[self.0 as usize]
    }

    pub const fn coarser(self) -> Option<Self> {
        Self::from_index(self.0 + 1)
    }

    pub const fn finer(self) -> Option<Self> {
        match self.0 {
            0 => None,
            i => Some(Self(i - 1)),
        }
    }

    /// Manual range step: coarser, wrapping back to the finest.
    pub const fn cycled(self) -> Self {
        match self.coarser() {
            Some(next) => next,
            None => Self::FINEST,
        }
    }
}

/// ADC reference
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoltageReference {
    /// AVCC, 5.0 V
    Supply,
    /// Internal 1.1 V bandgap
    Internal,
}

impl VoltageReference {
    pub const fn millivolts(self) -> u16 {
        match self {
            VoltageReference::Supply => VREF_HIGH_MV,
            VoltageReference::Internal => VREF_LOW_MV,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            VoltageReference::Supply => VoltageReference::Internal,
            VoltageReference::Internal => VoltageReference::Supply,
        }
    }
}

/// Known resistor forming the divider with the resistor under test
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceResistor {
    /// 1 kOhm leg on PD5
    Low,
    /// 10 kOhm leg on PC1
    High,
}

impl ReferenceResistor {
    pub const fn ohms(self) -> u16 {
        match self {
            ReferenceResistor::Low => R_LOW_OHM,
            ReferenceResistor::High => R_HIGH_OHM,
        }
    }

    pub const fn label(self) -> &'static [u8] {
        match self {
            ReferenceResistor::Low => b"1K",
            ReferenceResistor::High => b"10K",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            ReferenceResistor::Low => ReferenceResistor::High,
            ReferenceResistor::High => ReferenceResistor::Low,
        }
    }
}

/// Current range of every measurement mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeSettings {
    pub prescaler: Prescaler,
    pub reference: VoltageReference,
    pub resistor: ReferenceResistor,
}

impl RangeSettings {
    pub const BOOT: Self = Self {
        prescaler: Prescaler::FINEST,
        reference: VoltageReference::Supply,
        resistor: ReferenceResistor::Low,
    };
}

impl Default for RangeSettings {
    fn default() -> Self {
        Self::BOOT
    }
}

/// One autoranging decision for frequency. A pending overflow steps one
/// notch coarser (never past the coarsest); otherwise a frequency above the
/// next finer prescaler's lower bound steps one notch finer.
pub fn autorange_frequency(current: Prescaler, overflowed: bool, hertz: u32) -> Option<Prescaler> {
    if overflowed {
        return current.coarser();
    }
    current.finer().filter(|finer| hertz > finer.lower_bound_hz())
}

/// Hysteresis between the two references; holds inside the band.
pub fn autorange_voltage(current: VoltageReference, volts: f32) -> Option<VoltageReference> {
    match current {
        VoltageReference::Internal if volts > VOLTAGE_UPPER_V => Some(VoltageReference::Supply),
        VoltageReference::Supply if volts < VOLTAGE_LOWER_V => Some(VoltageReference::Internal),
        _ => None,
    }
}

pub fn autorange_resistance(current: ReferenceResistor, kohm: f32) -> Option<ReferenceResistor> {
    match current {
        ReferenceResistor::Low if kohm > RESISTANCE_UPPER_KOHM => Some(ReferenceResistor::High),
        ReferenceResistor::High if kohm < RESISTANCE_LOWER_KOHM => Some(ReferenceResistor::Low),
        _ => None,
    }
}
