use avr_device::atmega328p::EXINT;

const ISC01: u8 = 1 << 1;
const INT0: u8 = 1 << 0;

/// INT0 (PD2) on the falling edge
pub fn enable_int0_falling() {
    unsafe {
        let p = &*EXINT::ptr();
        p.eicra.modify(|r, w| w.bits((r.bits() & !0x03) | ISC01));
        p.eimsk.modify(|r, w| w.bits(r.bits() | INT0));
    }
}
