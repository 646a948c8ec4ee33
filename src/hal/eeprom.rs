use avr_device::atmega328p::EEPROM;
use core::convert::Infallible;

use crate::drivers::WordStorage;

const EERE: u8 = 1 << 0;
const EEPE: u8 = 1 << 1;
const EEMPE: u8 = 1 << 2;

/// On-chip EEPROM addressed in 16-bit little-endian words
pub struct Eeprom {
    _private: (),
}

impl Eeprom {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn wait_ready(&self) {
        unsafe { while (*EEPROM::ptr()).eecr.read().bits() & EEPE != 0 {} }
    }

    fn read_byte(&mut self, address: u16) -> u8 {
        self.wait_ready();
        unsafe {
            let p = &*EEPROM::ptr();
            p.eear.write(|w| w.bits(address));
            p.eecr.write(|w| w.bits(EERE));
            p.eedr.read().bits()
        }
    }

    fn update_byte(&mut self, address: u16, value: u8) {
        if self.read_byte(address) == value {
            return;
        }
        self.wait_ready();
        // EEMPE then EEPE within four cycles
        avr_device::interrupt::free(|_| unsafe {
            let p = &*EEPROM::ptr();
            p.eear.write(|w| w.bits(address));
            p.eedr.write(|w| w.bits(value));
            p.eecr.write(|w| w.bits(EEMPE));
            p.eecr.write(|w| w.bits(EEMPE | EEPE));
        });
    }
}

impl Default for Eeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl WordStorage for Eeprom {
    type Error = Infallible;

    fn read_word(&mut self, slot: u16) -> Result<u16, Infallible> {
        let address = slot * 2;
        let low = self.read_byte(address) as u16;
        let high = self.read_byte(address + 1) as u16;
        Ok(high << 8 | low)
    }

    fn write_word(&mut self, slot: u16, value: u16) -> Result<(), Infallible> {
        let address = slot * 2;
        self.update_byte(address, value as u8);
        self.update_byte(address + 1, (value >> 8) as u8);
        Ok(())
    }
}
