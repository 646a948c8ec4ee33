use avr_device::atmega328p::ADC;

use crate::application::multimeter::VoltageReference;

const REFS0: u8 = 1 << 6;
const REFS1: u8 = 1 << 7;
const REFS_MASK: u8 = REFS1 | REFS0;

const ADEN: u8 = 1 << 7;
const ADSC: u8 = 1 << 6;
const ADIE: u8 = 1 << 3;
/// /64: 125 kHz conversion clock at 8 MHz
const ADPS_64: u8 = 0x06;

/// Interrupt-driven single conversions on ADC0
pub struct Adc {
    _private: (),
}

impl Adc {
    pub fn new(reference: VoltageReference) -> Self {
        unsafe {
            let p = &*ADC::ptr();
            p.admux.write(|w| w.bits(refs(reference)));
            p.adcsra.write(|w| w.bits(ADEN | ADIE | ADPS_64));
        }
        Self { _private: () }
    }

    pub fn set_reference(&mut self, reference: VoltageReference) {
        unsafe {
            (*ADC::ptr())
                .admux
                .modify(|r, w| w.bits((r.bits() & !REFS_MASK) | refs(reference)));
        }
    }

    pub fn is_converting(&self) -> bool {
        unsafe { (*ADC::ptr()).adcsra.read().bits() & ADSC != 0 }
    }

    pub fn start(&mut self) {
        unsafe {
            (*ADC::ptr()).adcsra.modify(|r, w| w.bits(r.bits() | ADSC));
        }
    }

    /// Conversion-complete interrupt body
    #[inline]
    pub fn result() -> u16 {
        unsafe { (*ADC::ptr()).adc.read().bits() }
    }
}

const fn refs(reference: VoltageReference) -> u8 {
    match reference {
        VoltageReference::Supply => REFS0,
        VoltageReference::Internal => REFS1 | REFS0,
    }
}
