//! Multimeter screen: heading and range label per mode, value on the left
//! of line 1, range and the A/M indicator on the right.

use crate::application::multimeter::{MeterFlag, Mode, RangeSettings};
use crate::drivers::{Display, Position};
use crate::error::{Error, Result};
use crate::measurement::to_milli;
use crate::rtos::{FlagBus, FlagSet};

const VALUE_AT: Position = Position::new(1, 0);
const RANGE_AT: Position = Position::new(1, 10);
const RESISTOR_AT: Position = Position::new(1, 11);
const INDICATOR_AT: Position = Position::new(1, 15);

/// Everything the screen shows, captured by the multimeter before rendering
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeterView {
    pub mode: Mode,
    pub range: RangeSettings,
    pub autoranging: bool,
    pub hertz: u32,
    pub volts: f32,
    pub kohm: f32,
}

struct Layout {
    heading: &'static [u8],
    label: &'static [u8],
    label_at: Position,
}

const fn layout(mode: Mode) -> Layout {
    match mode {
        Mode::Frequency => Layout {
            heading: b"Frequency(Hz):-",
            label: b"PSc",
            label_at: Position::new(1, 7),
        },
        Mode::Voltage => Layout {
            heading: b"VOLTAGE(V):-",
            label: b"VRef",
            label_at: Position::new(1, 6),
        },
        Mode::Resistance => Layout {
            heading: b"RESISTANCE(Kohm)",
            label: b"Rref",
            label_at: Position::new(1, 7),
        },
    }
}

/// Redraws only the parts of the screen whose flags are pending.
pub struct MeterRenderer {
    shown: Option<Mode>,
}

impl MeterRenderer {
    pub const fn new() -> Self {
        Self { shown: None }
    }

    pub fn shown(&self) -> Option<Mode> {
        self.shown
    }

    /// Draw pending changes and consume their flags. Does nothing unless an
    /// update was requested. Returns whether anything was drawn.
    pub fn render<D: Display>(
        &mut self,
        display: &mut D,
        flags: &FlagBus<MeterFlag>,
        view: &MeterView,
    ) -> Result<bool> {
        let pending = flags.snapshot();
        if !pending.contains(MeterFlag::UpdateDisplay) {
            return Ok(false);
        }

        let redraw = pending.contains(MeterFlag::ModeChanged) || self.shown != Some(view.mode);
        if redraw {
            Self::frame(display, view.mode).map_err(|_| Error::Display)?;
            self.shown = Some(view.mode);
        }
        if redraw || pending.contains(MeterFlag::ValueChanged) {
            Self::value(display, view).map_err(|_| Error::Display)?;
        }
        if redraw || pending.contains(MeterFlag::RangeChanged) {
            Self::range(display, view).map_err(|_| Error::Display)?;
        }

        let consumed = FlagSet::EMPTY
            .with(MeterFlag::UpdateDisplay)
            .with(MeterFlag::ModeChanged)
            .with(MeterFlag::ValueChanged)
            .with(MeterFlag::RangeChanged);
        flags.apply(consumed, FlagSet::EMPTY);
        Ok(true)
    }

    fn frame<D: Display>(display: &mut D, mode: Mode) -> core::result::Result<(), D::Error> {
        let layout = layout(mode);
        display.reset_to_home()?;
        display.write_text(layout.heading, Position::HOME)?;
        display.write_text(layout.label, layout.label_at)
    }

    fn value<D: Display>(display: &mut D, view: &MeterView) -> core::result::Result<(), D::Error> {
        match view.mode {
            Mode::Frequency => {
                display.clear_region(7, VALUE_AT)?;
                display.write_number(view.hertz, 7, VALUE_AT)
            }
            Mode::Voltage => {
                display.clear_region(6, VALUE_AT)?;
                display.write_milli(to_milli(view.volts), 3, 5, VALUE_AT)
            }
            Mode::Resistance => {
                display.clear_region(6, VALUE_AT)?;
                if view.kohm.is_finite() {
                    display.write_milli(to_milli(view.kohm), 3, 6, VALUE_AT)
                } else {
                    display.write_text(b"OL", VALUE_AT)
                }
            }
        }
    }

    fn range<D: Display>(display: &mut D, view: &MeterView) -> core::result::Result<(), D::Error> {
        match view.mode {
            Mode::Frequency => {
                display.clear_region(4, RANGE_AT)?;
                display.write_number(view.range.prescaler.divisor() as u32, 4, RANGE_AT)?;
            }
            Mode::Voltage => {
                display.clear_region(4, RANGE_AT)?;
                display.write_milli(view.range.reference.millivolts() as u32, 2, 4, RANGE_AT)?;
            }
            Mode::Resistance => {
                display.clear_region(3, RESISTOR_AT)?;
                display.write_text(view.range.resistor.label(), RESISTOR_AT)?;
            }
        }
        let indicator: &[u8] = if view.autoranging { b"A" } else { b"M" };
        display.write_text(indicator, INDICATOR_AT)
    }
}

impl Default for MeterRenderer {
    fn default() -> Self {
        Self::new()
    }
}
