use avr_device::atmega328p::{PORTB, PORTC};
use core::convert::Infallible;
use embedded_hal::blocking::delay::DelayUs;

use super::timer::Delay;
use crate::config::lcd::ENABLE_PULSE_US;
use crate::drivers::{LcdBus, Register};

const RS: u8 = 1 << 3;
const RW: u8 = 1 << 4;
const EN: u8 = 1 << 5;
const CONTROL: u8 = RS | RW | EN;
const BUSY: u8 = 1 << 7;

/// HD44780 on PORTB (data) with RS, RW and EN on PC3..PC5
pub struct PortLcdBus {
    delay: Delay,
}

impl PortLcdBus {
    pub fn new(delay: Delay) -> Self {
        unsafe {
            let c = &*PORTC::ptr();
            c.ddrc.modify(|r, w| w.bits(r.bits() | CONTROL));
            c.portc.modify(|r, w| w.bits(r.bits() & !CONTROL));
            let b = &*PORTB::ptr();
            b.ddrb.write(|w| w.bits(0xFF));
            b.portb.write(|w| w.bits(0x00));
        }
        Self { delay }
    }

    fn control(&mut self, set: u8, clear: u8) {
        unsafe {
            (*PORTC::ptr())
                .portc
                .modify(|r, w| w.bits((r.bits() & !clear) | set));
        }
    }

    fn pulse_enable(&mut self) {
        self.control(EN, 0);
        self.delay.delay_us(ENABLE_PULSE_US);
        self.control(0, EN);
    }
}

impl LcdBus for PortLcdBus {
    type Error = Infallible;

    fn poll_ready(&mut self) -> nb::Result<(), Infallible> {
        let b = unsafe { &*PORTB::ptr() };
        // Busy flag on D7: input without pull-up, read cycle
        b.portb.modify(|r, w| unsafe { w.bits(r.bits() & !BUSY) });
        b.ddrb.modify(|r, w| unsafe { w.bits(r.bits() & !BUSY) });
        self.control(RW, RS);
        self.pulse_enable();

        if b.pinb.read().bits() & BUSY != 0 {
            return Err(nb::Error::WouldBlock);
        }

        b.ddrb.modify(|r, w| unsafe { w.bits(r.bits() | BUSY) });
        self.control(0, RW);
        Ok(())
    }

    fn write(&mut self, register: Register, byte: u8) -> Result<(), Infallible> {
        unsafe {
            (*PORTB::ptr()).portb.write(|w| w.bits(byte));
        }
        match register {
            Register::Command => self.control(0, RS | RW),
            Register::Data => self.control(RS, RW),
        }
        self.pulse_enable();
        Ok(())
    }
}
