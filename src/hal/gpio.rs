use avr_device::atmega328p::{PORTB, PORTC, PORTD};
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::digital::v2::{InputPin, OutputPin};

pub trait PinMode {}
pub struct Input;
pub struct Output;
impl PinMode for Input {}
impl PinMode for Output {}

/// Pin `N` of `PORT`, typed by its direction
#[derive(Debug)]
pub struct Pin<PORT, const N: u8, MODE> {
    _port: PhantomData<PORT>,
    _mode: PhantomData<MODE>,
}

impl<PORT, const N: u8, MODE> Pin<PORT, N, MODE> {
    /// Handle to a pin whose direction is then set with `into_input` or
    /// `into_output`.
    ///
    /// # Safety
    /// At most one handle may exist per physical pin.
    pub const unsafe fn steal() -> Self {
        Pin {
            _port: PhantomData,
            _mode: PhantomData,
        }
    }
}

macro_rules! impl_port {
    ($PORT:ident, $pin:ident, $ddr:ident, $port:ident) => {
        impl<const N: u8, MODE: PinMode> Pin<$PORT, N, MODE> {
            pub fn into_output(self) -> Pin<$PORT, N, Output> {
                unsafe {
                    (*$PORT::ptr()).$ddr.modify(|r, w| w.bits(r.bits() | (1 << N)));
                }
                Pin {
                    _port: PhantomData,
                    _mode: PhantomData,
                }
            }

            /// Input without the internal pull-up (the boards use external ones).
            pub fn into_input(self) -> Pin<$PORT, N, Input> {
                unsafe {
                    (*$PORT::ptr()).$ddr.modify(|r, w| w.bits(r.bits() & !(1 << N)));
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() & !(1 << N)));
                }
                Pin {
                    _port: PhantomData,
                    _mode: PhantomData,
                }
            }
        }

        impl<const N: u8> OutputPin for Pin<$PORT, N, Output> {
            type Error = Infallible;

            #[inline]
            fn set_high(&mut self) -> Result<(), Infallible> {
                unsafe {
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() | (1 << N)));
                }
                Ok(())
            }

            #[inline]
            fn set_low(&mut self) -> Result<(), Infallible> {
                unsafe {
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() & !(1 << N)));
                }
                Ok(())
            }
        }

        impl<const N: u8> InputPin for Pin<$PORT, N, Input> {
            type Error = Infallible;

            #[inline]
            fn is_high(&self) -> Result<bool, Infallible> {
                Ok(unsafe { (*$PORT::ptr()).$pin.read().bits() } & (1 << N) != 0)
            }

            #[inline]
            fn is_low(&self) -> Result<bool, Infallible> {
                self.is_high().map(|high| !high)
            }
        }
    };
}

impl_port!(PORTB, pinb, ddrb, portb);
impl_port!(PORTC, pinc, ddrc, portc);
impl_port!(PORTD, pind, ddrd, portd);

/// Pin assignments of the lab boards
pub mod board {
    use super::*;

    /// Reaction tester "go" LED
    pub type Led = Pin<PORTC, 0, Output>;
    /// SW1 on the reaction tester, button 0 on the multimeter
    pub type Sw1 = Pin<PORTC, 2, Input>;
    /// SW2 (INT0) on the reaction tester, button 1 on the multimeter
    pub type Sw2 = Pin<PORTD, 2, Input>;
    /// Multimeter button 2
    pub type Sw3 = Pin<PORTD, 3, Input>;
}
