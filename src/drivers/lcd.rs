//! Character LCD: the display contract used by the renderers and an HD44780
//! driver for an 8-bit parallel bus.

use ufmt::uwrite;

use crate::config::lcd::{COLUMNS, LINES};

/// Cursor position on the 2x16 panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    line: u8,
    column: u8,
}

impl Position {
    pub const HOME: Self = Self::new(0, 0);

    /// Line is 0 or 1, column 0 to 15.
    pub const fn new(line: u8, column: u8) -> Self {
        assert!(line < LINES && column < COLUMNS);
        Self { line, column }
    }

    pub const fn line(self) -> u8 {
        self.line
    }

    pub const fn column(self) -> u8 {
        self.column
    }

    /// "Set DDRAM address" command for this position
    pub const fn address(self) -> u8 {
        0x80 | (self.line * 0x40) | self.column
    }
}

/// Display collaborator
///
/// Implementors provide the three primitives; number, fixed-point and region
/// helpers are built on `write_text`. Field widths are chosen by the caller
/// and must match the field on screen.
pub trait Display {
    type Error;

    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Clear the screen and return the cursor home.
    fn reset_to_home(&mut self) -> Result<(), Self::Error>;

    /// Write bytes starting at `position`. Text running past the end of the
    /// first line continues on the second.
    fn write_text(&mut self, text: &[u8], position: Position) -> Result<(), Self::Error>;

    /// Left-aligned decimal, truncated to `digits` characters.
    fn write_number(&mut self, value: u32, digits: u8, position: Position) -> Result<(), Self::Error> {
        let mut text = heapless::String::<10>::new();
        let _ = uwrite!(text, "{}", value);
        let len = text.len().min(digits as usize);
        self.write_text(&text.as_bytes()[..len], position)
    }

    /// Fixed-point value given in thousandths, shown with `decimals` (0 to 3)
    /// fractional digits and truncated to `width` characters.
    fn write_milli(
        &mut self,
        milli: u32,
        decimals: u8,
        width: u8,
        position: Position,
    ) -> Result<(), Self::Error> {
        let mut text = heapless::String::<16>::new();
        let _ = uwrite!(text, "{}", milli / 1000);
        if decimals > 0 {
            let decimals = decimals.min(3) as u32;
            let fraction = (milli % 1000) / 10u32.pow(3 - decimals);
            let _ = text.push('.');
            let mut scale = 10u32.pow(decimals - 1);
            while scale > 1 && fraction < scale {
                let _ = text.push('0');
                scale /= 10;
            }
            let _ = uwrite!(text, "{}", fraction);
        }
        let len = text.len().min(width as usize);
        self.write_text(&text.as_bytes()[..len], position)
    }

    /// Blank `cells` characters from `position`.
    fn clear_region(&mut self, cells: u8, position: Position) -> Result<(), Self::Error> {
        const BLANK: [u8; COLUMNS as usize] = [b' '; COLUMNS as usize];
        let cells = (cells as usize).min(BLANK.len());
        self.write_text(&BLANK[..cells], position)
    }

    /// Up to 32 characters: the first 16 on line 0, the rest on line 1.
    fn write_lines(&mut self, text: &[u8]) -> Result<(), Self::Error> {
        let split = text.len().min(COLUMNS as usize);
        self.write_text(&text[..split], Position::new(0, 0))?;
        if text.len() > split {
            self.write_text(&text[split..], Position::new(1, 0))?;
        }
        Ok(())
    }
}

/// Register selected by the RS line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    Command,
    Data,
}

/// Parallel bus to the controller
pub trait LcdBus {
    type Error;

    /// `WouldBlock` while the controller's busy flag is set.
    fn poll_ready(&mut self) -> nb::Result<(), Self::Error>;

    fn write(&mut self, register: Register, byte: u8) -> Result<(), Self::Error>;
}

/// Access to the bus, obtainable only once the controller is idle
pub struct Ready<'a, B: LcdBus> {
    bus: &'a mut B,
}

impl<B: LcdBus> Ready<'_, B> {
    pub fn command(self, byte: u8) -> Result<(), B::Error> {
        self.bus.write(Register::Command, byte)
    }

    pub fn data(self, byte: u8) -> Result<(), B::Error> {
        self.bus.write(Register::Data, byte)
    }
}

const FUNCTION_SET_8BIT_2LINE: u8 = 0x38;
const CLEAR_DISPLAY: u8 = 0x01;
const RETURN_HOME: u8 = 0x02;
const DISPLAY_ON_CURSOR_BLINK: u8 = 0x0E;

pub struct Hd44780<B> {
    bus: B,
}

impl<B: LcdBus> Hd44780<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Wait out the busy flag and hand out the bus.
    pub fn acquire(&mut self) -> Result<Ready<'_, B>, B::Error> {
        nb::block!(self.bus.poll_ready())?;
        Ok(Ready { bus: &mut self.bus })
    }

    fn command(&mut self, byte: u8) -> Result<(), B::Error> {
        self.acquire()?.command(byte)
    }

    fn data(&mut self, byte: u8) -> Result<(), B::Error> {
        self.acquire()?.data(byte)
    }

    pub fn release(self) -> B {
        self.bus
    }
}

impl<B: LcdBus> Display for Hd44780<B> {
    type Error = B::Error;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.command(FUNCTION_SET_8BIT_2LINE)?;
        self.command(CLEAR_DISPLAY)?;
        self.command(RETURN_HOME)?;
        self.command(DISPLAY_ON_CURSOR_BLINK)
    }

    fn reset_to_home(&mut self) -> Result<(), Self::Error> {
        self.command(CLEAR_DISPLAY)?;
        self.command(RETURN_HOME)
    }

    fn write_text(&mut self, text: &[u8], position: Position) -> Result<(), Self::Error> {
        let mut line = position.line();
        let mut column = position.column();
        self.command(position.address())?;

        for &byte in text {
            if byte == 0 {
                break;
            }
            self.data(byte)?;

            column += 1;
            if column >= COLUMNS && line == 0 {
                line = 1;
                column = 0;
                self.command(Position::new(line, column).address())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    /// Bus that records traffic and reports busy a set number of polls
    struct RecordingBus {
        busy_polls: u8,
        polls: u32,
        log: heapless::Vec<(Register, u8), 64>,
    }

    impl RecordingBus {
        fn new(busy_polls: u8) -> Self {
            Self {
                busy_polls,
                polls: 0,
                log: heapless::Vec::new(),
            }
        }
    }

    impl LcdBus for RecordingBus {
        type Error = Infallible;

        fn poll_ready(&mut self) -> nb::Result<(), Infallible> {
            self.polls += 1;
            if self.busy_polls > 0 {
                self.busy_polls -= 1;
                Err(nb::Error::WouldBlock)
            } else {
                Ok(())
            }
        }

        fn write(&mut self, register: Register, byte: u8) -> Result<(), Infallible> {
            self.log.push((register, byte)).unwrap();
            Ok(())
        }
    }

    #[test]
    fn position_addresses() {
        assert_eq!(Position::HOME.address(), 0x80);
        assert_eq!(Position::new(0, 11).address(), 0x8B);
        assert_eq!(Position::new(1, 0).address(), 0xC0);
        assert_eq!(Position::new(1, 15).address(), 0xCF);
    }

    #[test]
    fn initialize_waits_for_busy_flag() {
        let mut lcd = Hd44780::new(RecordingBus::new(3));
        lcd.initialize().unwrap();

        let bus = lcd.release();
        assert_eq!(bus.polls, 3 + 4);
        let commands: heapless::Vec<u8, 8> = bus.log.iter().map(|&(_, b)| b).collect();
        assert_eq!(commands.as_slice(), &[0x38, 0x01, 0x02, 0x0E]);
    }

    #[test]
    fn text_wraps_from_first_to_second_line() {
        let mut lcd = Hd44780::new(RecordingBus::new(0));
        lcd.write_text(b"ABC", Position::new(0, 14)).unwrap();

        let bus = lcd.release();
        assert_eq!(
            bus.log.as_slice(),
            &[
                (Register::Command, 0x8E),
                (Register::Data, b'A'),
                (Register::Data, b'B'),
                (Register::Command, 0xC0),
                (Register::Data, b'C'),
            ]
        );
    }

    #[test]
    fn number_is_truncated_to_field() {
        let mut lcd = Hd44780::new(RecordingBus::new(0));
        lcd.write_number(12345, 3, Position::new(0, 11)).unwrap();

        let bus = lcd.release();
        let data: heapless::Vec<u8, 8> = bus
            .log
            .iter()
            .filter(|(r, _)| *r == Register::Data)
            .map(|&(_, b)| b)
            .collect();
        assert_eq!(data.as_slice(), b"123");
    }

    #[test]
    fn milli_values_keep_leading_fraction_zeros() {
        let mut lcd = Hd44780::new(RecordingBus::new(0));
        lcd.write_milli(1_050, 3, 5, Position::new(1, 0)).unwrap();
        lcd.write_milli(5_000, 2, 4, Position::new(1, 10)).unwrap();

        let bus = lcd.release();
        let data: heapless::Vec<u8, 16> = bus
            .log
            .iter()
            .filter(|(r, _)| *r == Register::Data)
            .map(|&(_, b)| b)
            .collect();
        assert_eq!(data.as_slice(), b"1.0505.00");
    }
}
