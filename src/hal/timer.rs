use avr_device::atmega328p::{AC, TC0, TC1, TC2};
use core::marker::PhantomData;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use crate::application::multimeter::Prescaler;
use crate::config::TICK_COMPARE;

const WGM21: u8 = 1 << 1;
const CS22: u8 = 1 << 2;
const OCIE2A: u8 = 1 << 1;

const ICNC1: u8 = 1 << 7;
const ICES1: u8 = 1 << 6;
const CS1_MASK: u8 = 0x07;
const ICIE1: u8 = 1 << 5;
const TOIE1: u8 = 1 << 0;
const ACIC: u8 = 1 << 2;

const CS01: u8 = 1 << 1;

/// Scheduler time base: Timer2 in CTC mode at /64, compare every 1 ms
pub struct TickTimer {
    _timer: PhantomData<TC2>,
}

impl TickTimer {
    pub fn start() -> Self {
        unsafe {
            let p = &*TC2::ptr();
            p.tcnt2.write(|w| w.bits(0));
            p.ocr2a.write(|w| w.bits(TICK_COMPARE));
            p.tccr2a.write(|w| w.bits(WGM21));
            p.tccr2b.write(|w| w.bits(CS22));
            p.timsk2.write(|w| w.bits(OCIE2A));
        }
        Self { _timer: PhantomData }
    }
}

/// Timer1 input capture fed by the analog comparator (rising edge, noise
/// canceller on), with overflow detection
pub struct CaptureTimer {
    _timer: PhantomData<TC1>,
}

impl CaptureTimer {
    pub fn start(prescaler: Prescaler) -> Self {
        unsafe {
            (*AC::ptr()).acsr.modify(|r, w| w.bits(r.bits() | ACIC));

            let p = &*TC1::ptr();
            p.tccr1a.write(|w| w.bits(0));
            p.tcnt1.write(|w| w.bits(0));
            p.tccr1b.write(|w| w.bits(ICNC1 | ICES1 | clock_select(prescaler)));
            p.timsk1.write(|w| w.bits(ICIE1 | TOIE1));
        }
        Self { _timer: PhantomData }
    }

    pub fn select_prescaler(&mut self, prescaler: Prescaler) {
        unsafe {
            (*TC1::ptr())
                .tccr1b
                .modify(|r, w| w.bits((r.bits() & !CS1_MASK) | clock_select(prescaler)));
        }
    }

    /// Capture interrupt body: restart the count and return the ticks
    /// captured at the edge.
    #[inline]
    pub fn take_capture() -> u16 {
        unsafe {
            let p = &*TC1::ptr();
            p.tcnt1.write(|w| w.bits(0));
            p.icr1.read().bits()
        }
    }
}

/// CS12:0 for a table prescaler: /1 is 1, /8 is 2 and so on up to /1024.
const fn clock_select(prescaler: Prescaler) -> u8 {
    (prescaler.index() + 1) & CS1_MASK
}

/// Busy-wait delay on Timer0 running at /8, one count per microsecond
pub struct Delay {
    _timer: PhantomData<TC0>,
}

impl Delay {
    pub fn new() -> Self {
        unsafe {
            let p = &*TC0::ptr();
            p.tccr0a.write(|w| w.bits(0));
            p.tccr0b.write(|w| w.bits(CS01));
        }
        Self { _timer: PhantomData }
    }

    fn wait_counts(&mut self, counts: u8) {
        unsafe {
            let p = &*TC0::ptr();
            p.tcnt0.write(|w| w.bits(0));
            while p.tcnt0.read().bits() < counts {}
        }
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayUs<u16> for Delay {
    fn delay_us(&mut self, us: u16) {
        let mut remaining = us;
        while remaining > 0 {
            let chunk = remaining.min(200);
            self.wait_counts(chunk as u8);
            remaining -= chunk;
        }
    }
}

impl DelayMs<u16> for Delay {
    fn delay_ms(&mut self, ms: u16) {
        for _ in 0..ms {
            self.delay_us(1000);
        }
    }
}
