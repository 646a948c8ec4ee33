//! Shared test infrastructure for the lab program integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use avr_lab_firmware::application::multimeter::{
    FrontEnd, Prescaler, ReferenceResistor, VoltageReference,
};
use avr_lab_firmware::drivers::{Display, Position, WordStorage};
use embedded_hal::digital::v2::{InputPin, OutputPin};

// ============================================================================
// Display
// ============================================================================

/// 2x16 character panel that keeps what is on screen
pub struct TestLcd {
    cells: [[u8; 16]; 2],
    pub resets: u32,
    pub initialized: bool,
}

impl TestLcd {
    pub fn new() -> Self {
        Self {
            cells: [[b' '; 16]; 2],
            resets: 0,
            initialized: false,
        }
    }

    /// Line contents with trailing blanks removed
    pub fn line(&self, line: usize) -> String {
        String::from_utf8_lossy(&self.cells[line]).trim_end().to_string()
    }

    /// Text of `len` cells starting at `column` on `line`
    pub fn field(&self, line: usize, column: usize, len: usize) -> String {
        String::from_utf8_lossy(&self.cells[line][column..column + len])
            .trim_end()
            .to_string()
    }
}

impl Display for TestLcd {
    type Error = Infallible;

    fn initialize(&mut self) -> Result<(), Infallible> {
        self.initialized = true;
        self.cells = [[b' '; 16]; 2];
        Ok(())
    }

    fn reset_to_home(&mut self) -> Result<(), Infallible> {
        self.resets += 1;
        self.cells = [[b' '; 16]; 2];
        Ok(())
    }

    fn write_text(&mut self, text: &[u8], position: Position) -> Result<(), Infallible> {
        let mut line = position.line() as usize;
        let mut column = position.column() as usize;
        for &byte in text {
            if byte == 0 || line > 1 {
                break;
            }
            self.cells[line][column] = byte;
            column += 1;
            if column == 16 {
                line += 1;
                column = 0;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Word storage starting out erased (all ones), counting writes
pub struct MemoryStorage {
    pub words: [u16; 8],
    pub writes: u32,
}

impl MemoryStorage {
    pub fn erased() -> Self {
        Self {
            words: [0xFFFF; 8],
            writes: 0,
        }
    }
}

impl WordStorage for MemoryStorage {
    type Error = Infallible;

    fn read_word(&mut self, slot: u16) -> Result<u16, Infallible> {
        Ok(self.words[slot as usize])
    }

    fn write_word(&mut self, slot: u16, value: u16) -> Result<(), Infallible> {
        self.words[slot as usize] = value;
        self.writes += 1;
        Ok(())
    }
}

// ============================================================================
// Pins
// ============================================================================

/// Active-low push button pin; the test holds a clone to press it
#[derive(Clone, Default)]
pub struct TestButton {
    pressed: Rc<Cell<bool>>,
}

impl TestButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pressed(&self, pressed: bool) {
        self.pressed.set(pressed);
    }
}

impl InputPin for TestButton {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(!self.pressed.get())
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        Ok(self.pressed.get())
    }
}

/// Output pin whose level the test can observe
#[derive(Clone, Default)]
pub struct TestLed {
    lit: Rc<Cell<bool>>,
}

impl TestLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_lit(&self) -> bool {
        self.lit.get()
    }
}

impl OutputPin for TestLed {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.lit.set(true);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.lit.set(false);
        Ok(())
    }
}

// ============================================================================
// Multimeter front end
// ============================================================================

/// What is connected across the multimeter leads
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Input {
    /// A voltage source, in volts
    Volts(f32),
    /// A resistor in ohms; infinite for an open circuit
    Ohms(f32),
}

impl Input {
    /// ADC reading of this input under the given range
    fn convert(self, reference: VoltageReference, resistor: ReferenceResistor) -> u16 {
        let volts = match self {
            Input::Volts(volts) => volts,
            Input::Ohms(ohms) if ohms.is_infinite() => 5.0,
            Input::Ohms(ohms) => 5.0 * ohms / (ohms + resistor.ohms() as f32),
        };
        raw_for(volts, reference.millivolts()).min(1023)
    }
}

/// Test-side handle on the bench: swaps the input and hands over
/// conversion results as the ADC interrupt would
#[derive(Clone)]
pub struct Bench {
    input: Rc<Cell<Input>>,
    in_flight: Rc<Cell<Option<u16>>>,
}

impl Bench {
    pub fn connect(&self, input: Input) {
        self.input.set(input);
    }

    /// Result of the conversion in flight, if any
    pub fn finish_conversion(&self) -> Option<u16> {
        self.in_flight.take()
    }
}

/// Records the selected ranges. A conversion samples the input against the
/// range in force when it starts and stays in flight until the bench
/// finishes it.
pub struct FakeFrontEnd {
    pub prescaler: Prescaler,
    pub reference: VoltageReference,
    pub resistor: ReferenceResistor,
    pub conversions_started: u32,
    bench: Bench,
}

impl FakeFrontEnd {
    pub fn new() -> Self {
        Self {
            prescaler: Prescaler::COARSEST,
            reference: VoltageReference::Internal,
            resistor: ReferenceResistor::High,
            conversions_started: 0,
            bench: Bench {
                input: Rc::new(Cell::new(Input::Volts(0.0))),
                in_flight: Rc::new(Cell::new(None)),
            },
        }
    }

    pub fn bench(&self) -> Bench {
        self.bench.clone()
    }
}

impl FrontEnd for FakeFrontEnd {
    fn select_prescaler(&mut self, prescaler: Prescaler) {
        self.prescaler = prescaler;
    }

    fn select_reference(&mut self, reference: VoltageReference) {
        self.reference = reference;
    }

    fn select_resistor(&mut self, resistor: ReferenceResistor) {
        self.resistor = resistor;
    }

    fn conversion_in_progress(&self) -> bool {
        self.bench.in_flight.get().is_some()
    }

    fn start_conversion(&mut self) {
        let raw = self.bench.input.get().convert(self.reference, self.resistor);
        self.bench.in_flight.set(Some(raw));
        self.conversions_started += 1;
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// ADC reading for `volts` against a reference in millivolts
pub fn raw_for(volts: f32, reference_mv: u16) -> u16 {
    (volts * 1023.0 / (reference_mv as f32 / 1000.0)).round() as u16
}
