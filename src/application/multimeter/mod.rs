//! Autoranging multimeter (lab2)
//!
//! Button 0 cycles the measured quantity, button 1 toggles autoranging and
//! button 2 steps the range by hand while autoranging is off.

pub mod range;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::InputPin;

pub use range::{
    autorange_frequency, autorange_resistance, autorange_voltage, Prescaler, RangeSettings,
    ReferenceResistor, VoltageReference,
};

use crate::config::multimeter::{
    AUTORANGING_PERIOD_MS, BUTTON_EVENT_PERIOD_MS, BUTTON_PERIOD_MS, DISPLAY_PERIOD_MS,
    MEASUREMENT_PERIOD_MS,
};
use crate::config::SPLASH_MS;
use crate::drivers::{Button, Display};
use crate::error::{Error, Result};
use crate::measurement::{self, AnalogChannel, FrequencyCapture};
use crate::render::{MeterRenderer, MeterView};
use crate::rtos::{FlagBus, Scheduler, Task};

crate::flags! {
    pub enum MeterFlag {
        UpdateDisplay,
        ModeChanged,
        ValueChanged,
        Autoranging,
        /// Raised by the capture overflow interrupt
        IncreasePrescaler,
        RangeChanged,
        ModeButton,
        AutorangeButton,
        /// Only raised while autoranging is off
        RangeButton,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Frequency,
    Voltage,
    Resistance,
}

impl Mode {
    pub const fn next(self) -> Self {
        match self {
            Mode::Frequency => Mode::Voltage,
            Mode::Voltage => Mode::Resistance,
            Mode::Resistance => Mode::Frequency,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Mode::Frequency => "frequency",
            Mode::Voltage => "voltage",
            Mode::Resistance => "resistance",
        }
    }
}

impl ufmt::uDisplay for Mode {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeterTask {
    Buttons,
    ButtonEvents,
    Measurement,
    Autoranging,
    Display,
}

impl Task for MeterTask {
    const ALL: &'static [Self] = &[
        MeterTask::Buttons,
        MeterTask::ButtonEvents,
        MeterTask::Measurement,
        MeterTask::Autoranging,
        MeterTask::Display,
    ];

    fn period_ms(self) -> u16 {
        match self {
            MeterTask::Buttons => BUTTON_PERIOD_MS,
            MeterTask::ButtonEvents => BUTTON_EVENT_PERIOD_MS,
            MeterTask::Measurement => MEASUREMENT_PERIOD_MS,
            MeterTask::Autoranging => AUTORANGING_PERIOD_MS,
            MeterTask::Display => DISPLAY_PERIOD_MS,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

pub const TASKS: usize = 5;

/// State shared between the interrupt handlers and the foreground tasks
pub struct MeterShared {
    pub flags: FlagBus<MeterFlag>,
    pub scheduler: Scheduler<MeterTask, TASKS>,
    pub frequency: FrequencyCapture,
    pub analog: AnalogChannel,
}

impl MeterShared {
    pub const fn new() -> Self {
        Self {
            flags: FlagBus::new(),
            scheduler: Scheduler::new(),
            frequency: FrequencyCapture::new(Prescaler::FINEST.divisor()),
            analog: AnalogChannel::new(),
        }
    }

    /// 1 ms tick interrupt.
    pub fn on_tick(&self) {
        self.scheduler.tick();
    }

    /// Timer1 input capture: ticks since the previous rising edge.
    pub fn on_capture(&self, ticks: u16) {
        self.frequency.on_capture(ticks);
    }

    /// Timer1 overflow: no edge seen within a full timer period.
    pub fn on_overflow(&self) {
        self.frequency.on_overflow();
        self.flags.set(MeterFlag::IncreasePrescaler);
    }

    /// ADC conversion complete.
    pub fn on_conversion(&self, raw: u16) {
        self.analog.on_conversion(raw);
    }
}

impl Default for MeterShared {
    fn default() -> Self {
        Self::new()
    }
}

/// Analog front end: capture prescaler, ADC reference and divider legs
pub trait FrontEnd {
    fn select_prescaler(&mut self, prescaler: Prescaler);

    fn select_reference(&mut self, reference: VoltageReference);

    /// Connect `resistor` and disconnect the other leg.
    fn select_resistor(&mut self, resistor: ReferenceResistor);

    fn conversion_in_progress(&self) -> bool;

    fn start_conversion(&mut self);
}

/// Values last computed by the measurement task
#[derive(Clone, Copy, Debug, PartialEq)]
struct Readings {
    hertz: u32,
    /// Raw ADC value the voltage was computed from; `None` forces a recompute
    raw: Option<u16>,
    /// Last conversion that must not be used: it was started under a
    /// previous range or mode
    stale_through: u16,
    volts: f32,
    kohm: f32,
}

impl Readings {
    const fn new() -> Self {
        Self {
            hertz: 0,
            raw: None,
            stale_through: 0,
            volts: 0.0,
            kohm: 0.0,
        }
    }
}

/// The lab2 program
pub struct Multimeter<'a, B0, B1, B2, D, F> {
    shared: &'a MeterShared,
    mode_button: Button<B0>,
    autorange_button: Button<B1>,
    range_button: Button<B2>,
    display: D,
    front_end: F,
    mode: Mode,
    range: RangeSettings,
    readings: Readings,
    renderer: MeterRenderer,
}

impl<'a, B0, B1, B2, D, F> Multimeter<'a, B0, B1, B2, D, F>
where
    B0: InputPin,
    B1: InputPin,
    B2: InputPin,
    D: Display,
    F: FrontEnd,
{
    pub fn new(
        shared: &'a MeterShared,
        buttons: (B0, B1, B2),
        display: D,
        front_end: F,
    ) -> Self {
        Self {
            shared,
            mode_button: Button::new(buttons.0),
            autorange_button: Button::new(buttons.1),
            range_button: Button::new(buttons.2),
            display,
            front_end,
            mode: Mode::Frequency,
            range: RangeSettings::BOOT,
            readings: Readings::new(),
            renderer: MeterRenderer::new(),
        }
    }

    /// Configure the front end, show the splash and request the first full
    /// screen. Runs before interrupts are enabled.
    pub fn boot<T: DelayMs<u16>>(&mut self, delay: &mut T) -> Result<()> {
        self.select_range(RangeSettings::BOOT);
        self.display.initialize().map_err(|_| Error::Display)?;
        self.display
            .write_lines(b"AUTORANGING     MULTIMETER")
            .map_err(|_| Error::Display)?;
        delay.delay_ms(SPLASH_MS);

        let flags = &self.shared.flags;
        flags.set(MeterFlag::ModeChanged);
        flags.set(MeterFlag::Autoranging);
        flags.set(MeterFlag::RangeChanged);
        flags.set(MeterFlag::UpdateDisplay);

        crate::log_info!("multimeter up, mode {}", self.mode);
        Ok(())
    }

    /// Run every due task once.
    pub fn poll(&mut self) -> Result<()> {
        let mut outcome = Ok(());
        let shared = self.shared;
        shared.scheduler.dispatch(|task| {
            if let Err(e) = self.run(task) {
                crate::log_error!("task failed: {}", e);
                outcome = Err(e);
            }
        });
        outcome
    }

    pub fn run(&mut self, task: MeterTask) -> Result<()> {
        match task {
            MeterTask::Buttons => self.sample_buttons(),
            MeterTask::ButtonEvents => {
                self.handle_button_events();
                Ok(())
            }
            MeterTask::Measurement => {
                self.measure();
                Ok(())
            }
            MeterTask::Autoranging => {
                self.autorange();
                Ok(())
            }
            MeterTask::Display => self.render(),
        }
    }

    fn sample_buttons(&mut self) -> Result<()> {
        let shared = self.shared;
        let flags = &shared.flags;
        if self.mode_button.poll()? {
            flags.set(MeterFlag::ModeButton);
        }
        if self.autorange_button.poll()? {
            flags.set(MeterFlag::AutorangeButton);
        }
        if self.range_button.poll()? && !flags.is_set(MeterFlag::Autoranging) {
            flags.set(MeterFlag::RangeButton);
        }
        Ok(())
    }

    fn handle_button_events(&mut self) {
        let shared = self.shared;
        let flags = &shared.flags;

        if flags.take(MeterFlag::ModeButton) {
            self.mode = self.mode.next();
            if self.mode == Mode::Resistance && self.range.reference != VoltageReference::Supply {
                self.range.reference = VoltageReference::Supply;
                self.front_end.select_reference(VoltageReference::Supply);
            }
            self.discard_stale_samples();

            flags.set(MeterFlag::Autoranging);
            flags.set(MeterFlag::ModeChanged);
            flags.set(MeterFlag::RangeChanged);
            flags.set(MeterFlag::UpdateDisplay);
            crate::log_info!("mode {}", self.mode);
        }

        if flags.take(MeterFlag::AutorangeButton) {
            flags.toggle(MeterFlag::Autoranging);
            flags.set(MeterFlag::RangeChanged);
            flags.set(MeterFlag::UpdateDisplay);
            let state = if flags.is_set(MeterFlag::Autoranging) { "on" } else { "off" };
            crate::log_debug!("autoranging {}", state);
        }

        if flags.take(MeterFlag::RangeButton) {
            let mut range = self.range;
            match self.mode {
                Mode::Frequency => range.prescaler = range.prescaler.cycled(),
                Mode::Voltage => range.reference = range.reference.toggled(),
                Mode::Resistance => range.resistor = range.resistor.toggled(),
            }
            self.change_range(range);
        }
    }

    fn measure(&mut self) {
        let shared = self.shared;
        let flags = &shared.flags;

        match self.mode {
            Mode::Frequency => {
                let hertz = shared.frequency.hertz();
                if hertz != self.readings.hertz {
                    self.readings.hertz = hertz;
                    flags.set(MeterFlag::ValueChanged);
                    flags.set(MeterFlag::UpdateDisplay);
                }
            }
            Mode::Voltage | Mode::Resistance => {
                let sample = shared.analog.sample();
                if sample.is_after(self.readings.stale_through) {
                    self.readings.stale_through = sample.sequence.wrapping_sub(1);
                    if self.readings.raw != Some(sample.raw) {
                        self.readings.raw = Some(sample.raw);
                        self.readings.volts =
                            measurement::volts(sample.raw, self.range.reference.millivolts());
                        if self.mode == Mode::Resistance {
                            self.readings.kohm = measurement::resistance_kohm(
                                self.readings.volts,
                                self.range.resistor.ohms(),
                            );
                        }
                        flags.set(MeterFlag::ValueChanged);
                        flags.set(MeterFlag::UpdateDisplay);
                    }
                }

                if !self.front_end.conversion_in_progress() {
                    self.front_end.start_conversion();
                }
            }
        }
    }

    fn autorange(&mut self) {
        let shared = self.shared;
        let flags = &shared.flags;
        if !flags.is_set(MeterFlag::Autoranging) {
            return;
        }

        let mut range = self.range;
        match self.mode {
            Mode::Frequency => {
                let overflowed = flags.take(MeterFlag::IncreasePrescaler);
                if let Some(p) = autorange_frequency(range.prescaler, overflowed, self.readings.hertz) {
                    range.prescaler = p;
                }
            }
            Mode::Voltage => {
                if let Some(r) = autorange_voltage(range.reference, self.readings.volts) {
                    range.reference = r;
                }
            }
            Mode::Resistance => {
                if let Some(r) = autorange_resistance(range.resistor, self.readings.kohm) {
                    range.resistor = r;
                }
            }
        }
        self.change_range(range);
    }

    fn change_range(&mut self, range: RangeSettings) {
        if range == self.range {
            return;
        }
        self.select_range(range);
        self.discard_stale_samples();

        let flags = &self.shared.flags;
        flags.set(MeterFlag::RangeChanged);
        flags.set(MeterFlag::UpdateDisplay);
        crate::log_debug!(
            "range: /{} {}mV {}R",
            range.prescaler.divisor(),
            range.reference.millivolts(),
            range.resistor.ohms()
        );
    }

    /// Only conversions started from now on are used: the latest completed
    /// one, and one still in flight, belong to the previous range.
    fn discard_stale_samples(&mut self) {
        // Checked before reading the sequence, so a conversion finishing in
        // between is still counted as stale
        let in_flight = self.front_end.conversion_in_progress() as u16;
        let completed = self.shared.analog.sample().sequence;
        self.readings.stale_through = completed.wrapping_add(in_flight);
        self.readings.raw = None;
    }

    fn select_range(&mut self, range: RangeSettings) {
        self.front_end.select_prescaler(range.prescaler);
        self.shared.frequency.set_divisor(range.prescaler.divisor());
        self.front_end.select_reference(range.reference);
        self.front_end.select_resistor(range.resistor);
        self.range = range;
    }

    fn render(&mut self) -> Result<()> {
        let view = self.view();
        self.renderer.render(&mut self.display, &self.shared.flags, &view)?;
        Ok(())
    }

    /// Snapshot of what the display shows
    pub fn view(&self) -> MeterView {
        MeterView {
            mode: self.mode,
            range: self.range,
            autoranging: self.shared.flags.is_set(MeterFlag::Autoranging),
            hertz: self.readings.hertz,
            volts: self.readings.volts,
            kohm: self.readings.kohm,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn range(&self) -> RangeSettings {
        self.range
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn front_end(&self) -> &F {
        &self.front_end
    }
}
