use avr_device::atmega328p::{PORTC, PORTD};

use super::adc::Adc;
use super::timer::CaptureTimer;
use crate::application::multimeter::{FrontEnd, Prescaler, ReferenceResistor, VoltageReference};

/// 1 kOhm leg
const R_LOW: u8 = 1 << 5;
/// 10 kOhm leg
const R_HIGH: u8 = 1 << 1;

/// Multimeter analog front end: Timer1 capture, ADC and the divider legs.
/// A connected leg is driven high; a disconnected one floats.
pub struct MeterHardware {
    capture: CaptureTimer,
    adc: Adc,
}

impl MeterHardware {
    pub fn new(capture: CaptureTimer, adc: Adc) -> Self {
        Self { capture, adc }
    }

    fn connect_low(connected: bool) {
        unsafe {
            let d = &*PORTD::ptr();
            if connected {
                d.ddrd.modify(|r, w| w.bits(r.bits() | R_LOW));
                d.portd.modify(|r, w| w.bits(r.bits() | R_LOW));
            } else {
                d.portd.modify(|r, w| w.bits(r.bits() & !R_LOW));
                d.ddrd.modify(|r, w| w.bits(r.bits() & !R_LOW));
            }
        }
    }

    fn connect_high(connected: bool) {
        unsafe {
            let c = &*PORTC::ptr();
            if connected {
                c.ddrc.modify(|r, w| w.bits(r.bits() | R_HIGH));
                c.portc.modify(|r, w| w.bits(r.bits() | R_HIGH));
            } else {
                c.portc.modify(|r, w| w.bits(r.bits() & !R_HIGH));
                c.ddrc.modify(|r, w| w.bits(r.bits() & !R_HIGH));
            }
        }
    }
}

impl FrontEnd for MeterHardware {
    fn select_prescaler(&mut self, prescaler: Prescaler) {
        self.capture.select_prescaler(prescaler);
    }

    fn select_reference(&mut self, reference: VoltageReference) {
        self.adc.set_reference(reference);
    }

    fn select_resistor(&mut self, resistor: ReferenceResistor) {
        // Break before make
        match resistor {
            ReferenceResistor::Low => {
                Self::connect_high(false);
                Self::connect_low(true);
            }
            ReferenceResistor::High => {
                Self::connect_low(false);
                Self::connect_high(true);
            }
        }
    }

    fn conversion_in_progress(&self) -> bool {
        self.adc.is_converting()
    }

    fn start_conversion(&mut self) {
        self.adc.start();
    }
}
