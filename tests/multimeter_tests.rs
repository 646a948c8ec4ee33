//! Whole-program tests of the multimeter, driven tick by tick

mod common;

use avr_lab_firmware::application::multimeter::{
    MeterFlag, MeterShared, Mode, Multimeter, Prescaler, ReferenceResistor, VoltageReference,
};
use avr_lab_firmware::config::multimeter::AUTORANGING_PERIOD_MS;
use common::{Bench, FakeFrontEnd, Input, TestButton, TestLcd};
use embedded_hal_mock::delay::MockNoop;

type Meter<'a> = Multimeter<'a, TestButton, TestButton, TestButton, TestLcd, FakeFrontEnd>;

struct Rig<'a> {
    shared: &'a MeterShared,
    meter: Meter<'a>,
    bench: Bench,
    mode: TestButton,
    autorange: TestButton,
    range: TestButton,
}

impl<'a> Rig<'a> {
    fn boot(shared: &'a MeterShared) -> Self {
        let (mode, autorange, range) = (TestButton::new(), TestButton::new(), TestButton::new());
        let front_end = FakeFrontEnd::new();
        let bench = front_end.bench();
        let mut meter = Multimeter::new(
            shared,
            (mode.clone(), autorange.clone(), range.clone()),
            TestLcd::new(),
            front_end,
        );
        meter.boot(&mut MockNoop::new()).unwrap();
        assert_eq!(meter.display().line(0), "AUTORANGING");
        assert_eq!(meter.display().line(1), "MULTIMETER");

        let mut rig = Self {
            shared,
            meter,
            bench,
            mode,
            autorange,
            range,
        };
        rig.run(1);
        rig
    }

    /// One millisecond: tick interrupt, one pass of the main loop, then
    /// the ADC interrupt for a conversion started during that pass
    fn tick(&mut self) {
        self.shared.on_tick();
        self.meter.poll().unwrap();
        if let Some(raw) = self.bench.finish_conversion() {
            self.shared.on_conversion(raw);
        }
    }

    fn run(&mut self, ms: u32) {
        for _ in 0..ms {
            self.tick();
        }
    }

    /// Press and release, then let the display catch up.
    fn press(&mut self, which: fn(&Self) -> &TestButton) {
        which(self).set_pressed(true);
        self.run(100);
        which(self).set_pressed(false);
        self.run(700);
    }

    fn press_mode(&mut self) {
        self.press(|rig| &rig.mode);
    }

    fn press_autorange(&mut self) {
        self.press(|rig| &rig.autorange);
    }

    fn press_range(&mut self) {
        self.press(|rig| &rig.range);
    }

    fn lcd(&self) -> &TestLcd {
        self.meter.display()
    }

    fn front_end(&self) -> &FakeFrontEnd {
        self.meter.front_end()
    }

    /// Run while recording every distinct value the reading field shows.
    fn run_recording(&mut self, ms: u32) -> Vec<String> {
        let mut shown: Vec<String> = Vec::new();
        for _ in 0..ms {
            self.tick();
            let value = self.lcd().field(1, 0, 6);
            if shown.last() != Some(&value) {
                shown.push(value);
            }
        }
        shown
    }
}

fn numbers(shown: &[String]) -> Vec<f32> {
    shown.iter().filter_map(|v| v.parse().ok()).collect()
}

#[test]
fn boot_selects_default_range_and_draws_frequency_screen() {
    let shared = MeterShared::new();
    let rig = Rig::boot(&shared);

    assert_eq!(rig.front_end().prescaler, Prescaler::FINEST);
    assert_eq!(rig.front_end().reference, VoltageReference::Supply);
    assert_eq!(rig.front_end().resistor, ReferenceResistor::Low);
    assert_eq!(shared.frequency.divisor(), 1);

    assert_eq!(rig.lcd().line(0), "Frequency(Hz):-");
    assert_eq!(rig.lcd().field(1, 0, 7), "0");
    assert_eq!(rig.lcd().field(1, 7, 3), "PSc");
    assert_eq!(rig.lcd().field(1, 10, 4), "1");
    assert_eq!(rig.lcd().field(1, 15, 1), "A");
}

#[test]
fn modes_cycle_and_reenable_autoranging() {
    let shared = MeterShared::new();
    let mut rig = Rig::boot(&shared);

    rig.press_mode();
    assert_eq!(rig.meter.mode(), Mode::Voltage);
    assert_eq!(rig.lcd().line(0), "VOLTAGE(V):-");
    assert_eq!(rig.lcd().field(1, 0, 6), "0.000");
    assert_eq!(rig.lcd().field(1, 6, 4), "VRef");

    rig.press_autorange();
    assert!(!shared.flags.is_set(MeterFlag::Autoranging));
    assert_eq!(rig.lcd().field(1, 15, 1), "M");

    rig.press_mode();
    assert_eq!(rig.meter.mode(), Mode::Resistance);
    assert!(shared.flags.is_set(MeterFlag::Autoranging));
    assert_eq!(rig.lcd().line(0), "RESISTANCE(Kohm)");
    assert_eq!(rig.lcd().field(1, 7, 4), "Rref");
    assert_eq!(rig.lcd().field(1, 11, 3), "1K");
    assert_eq!(rig.lcd().field(1, 15, 1), "A");

    rig.press_mode();
    assert_eq!(rig.meter.mode(), Mode::Frequency);
    assert_eq!(rig.lcd().line(0), "Frequency(Hz):-");
}

#[test]
fn range_button_only_acts_in_manual_mode() {
    let shared = MeterShared::new();
    let mut rig = Rig::boot(&shared);

    rig.press_range();
    assert_eq!(rig.meter.range().prescaler, Prescaler::FINEST);

    rig.press_autorange();
    rig.press_range();
    assert_eq!(rig.meter.range().prescaler.divisor(), 8);
    assert_eq!(rig.front_end().prescaler.divisor(), 8);
    assert_eq!(shared.frequency.divisor(), 8);
    assert_eq!(rig.lcd().field(1, 10, 4), "8");
    assert_eq!(rig.lcd().field(1, 15, 1), "M");

    // Manual stepping wraps around the table
    for _ in 0..4 {
        rig.press_range();
    }
    assert_eq!(rig.meter.range().prescaler, Prescaler::FINEST);
}

#[test]
fn entering_resistance_forces_supply_reference() {
    let shared = MeterShared::new();
    let mut rig = Rig::boot(&shared);

    // An idle input autoranges down to the internal reference
    rig.press_mode();
    assert_eq!(rig.front_end().reference, VoltageReference::Internal);
    assert_eq!(rig.lcd().field(1, 10, 4), "1.10");

    rig.press_mode();
    assert_eq!(rig.meter.mode(), Mode::Resistance);
    assert_eq!(rig.front_end().reference, VoltageReference::Supply);
}

#[test]
fn frequency_autorange_steps_one_notch_and_clamps() {
    let shared = MeterShared::new();
    let mut rig = Rig::boot(&shared);

    shared.on_overflow();
    rig.run(AUTORANGING_PERIOD_MS as u32);
    assert_eq!(rig.meter.range().prescaler.divisor(), 8);
    assert!(!shared.flags.is_set(MeterFlag::IncreasePrescaler));

    for _ in 0..10 {
        shared.on_overflow();
        rig.run(AUTORANGING_PERIOD_MS as u32);
    }
    assert_eq!(rig.meter.range().prescaler, Prescaler::COARSEST);
    assert_eq!(shared.frequency.divisor(), 1024);

    rig.run(600);
    assert_eq!(rig.lcd().field(1, 10, 4), "1024");
    assert_eq!(rig.lcd().field(1, 0, 7), "0");
}

#[test]
fn fast_signal_moves_to_finer_prescaler() {
    let shared = MeterShared::new();
    let mut rig = Rig::boot(&shared);

    for _ in 0..2 {
        shared.on_overflow();
        rig.run(AUTORANGING_PERIOD_MS as u32);
    }
    assert_eq!(rig.meter.range().prescaler.divisor(), 64);

    // 8 MHz / (64 * 100) = 1250 Hz, above the 1000 Hz floor of /8
    shared.on_capture(100);
    rig.run(2 * AUTORANGING_PERIOD_MS as u32);
    assert_eq!(rig.meter.range().prescaler.divisor(), 8);

    // 1250 Hz is below the 2000 Hz floor of /1, so /8 holds
    rig.run(5 * AUTORANGING_PERIOD_MS as u32);
    assert_eq!(rig.meter.range().prescaler.divisor(), 8);

    rig.run(600);
    assert_eq!(rig.lcd().field(1, 0, 7), "1250");
}

#[test]
fn voltage_autorange_has_a_hysteresis_band() {
    let shared = MeterShared::new();
    let mut rig = Rig::boot(&shared);
    rig.press_mode();
    assert_eq!(rig.meter.range().reference, VoltageReference::Internal);

    // Inside the band nothing moves, however long it is held
    rig.bench.connect(Input::Volts(0.9));
    rig.run(3000);
    assert_eq!(rig.meter.range().reference, VoltageReference::Internal);
    assert_eq!(rig.lcd().field(1, 0, 6), "0.900");
    assert_eq!(rig.lcd().field(1, 10, 4), "1.10");

    rig.bench.connect(Input::Volts(1.05));
    rig.run(2000);
    assert_eq!(rig.meter.range().reference, VoltageReference::Supply);
    assert_eq!(rig.front_end().reference, VoltageReference::Supply);
    assert_eq!(rig.lcd().field(1, 0, 6), "1.051");
    assert_eq!(rig.lcd().field(1, 10, 4), "5.00");

    rig.run(3000);
    assert_eq!(rig.meter.range().reference, VoltageReference::Supply);

    rig.bench.connect(Input::Volts(0.5));
    rig.run(2000);
    assert_eq!(rig.meter.range().reference, VoltageReference::Internal);
    assert_eq!(rig.lcd().field(1, 0, 6), "0.500");
    assert!(rig.front_end().conversions_started > 0);
}

#[test]
fn range_change_never_shows_a_reading_from_the_old_range() {
    let shared = MeterShared::new();
    let mut rig = Rig::boot(&shared);
    rig.press_mode();
    rig.bench.connect(Input::Volts(0.9));
    rig.run(1000);

    // 1.05 V read on 1.1 V, then on 5 V; never re-scaled in between
    rig.bench.connect(Input::Volts(1.05));
    let shown = rig.run_recording(2000);
    assert_eq!(rig.meter.range().reference, VoltageReference::Supply);
    assert!(
        numbers(&shown).iter().all(|v| (0.85..1.1).contains(v)),
        "shown: {:?}",
        shown
    );

    rig.bench.connect(Input::Volts(0.5));
    let shown = rig.run_recording(2000);
    assert_eq!(rig.meter.range().reference, VoltageReference::Internal);
    assert!(
        numbers(&shown).iter().all(|v| (0.45..1.1).contains(v)),
        "shown: {:?}",
        shown
    );
}

#[test]
fn resistance_reading_and_open_circuit() {
    let shared = MeterShared::new();
    let mut rig = Rig::boot(&shared);
    rig.bench.connect(Input::Ohms(1000.0));
    rig.press_mode();
    rig.press_mode();
    rig.run(1000);

    // Divider at mid supply: unknown equals the 1k reference
    assert_eq!(rig.meter.range().resistor, ReferenceResistor::Low);
    let kohm: f32 = rig.lcd().field(1, 0, 6).parse().unwrap();
    assert!((kohm - 1.0).abs() < 0.01);

    // 9k overranges the 1k leg; the 10k reading follows directly
    rig.bench.connect(Input::Ohms(9000.0));
    let shown = rig.run_recording(2000);
    assert_eq!(rig.meter.range().resistor, ReferenceResistor::High);
    assert_eq!(rig.lcd().field(1, 0, 6), "9.015");
    assert!(
        numbers(&shown).iter().all(|v| *v < 9.5),
        "shown: {:?}",
        shown
    );

    // Input open: infinite, shown as OL, and the 10k leg stays
    rig.bench.connect(Input::Ohms(f32::INFINITY));
    rig.run(1000);
    assert_eq!(rig.meter.range().resistor, ReferenceResistor::High);
    assert_eq!(rig.front_end().resistor, ReferenceResistor::High);
    assert_eq!(rig.lcd().field(1, 0, 6), "OL");
    assert_eq!(rig.lcd().field(1, 11, 3), "10K");

    // 3.3k on the 10k leg drops back to 1k
    rig.bench.connect(Input::Ohms(3300.0));
    let shown = rig.run_recording(2000);
    assert_eq!(rig.meter.range().resistor, ReferenceResistor::Low);
    let kohm: f32 = rig.lcd().field(1, 0, 6).parse().unwrap();
    assert!((kohm - 3.3).abs() < 0.05);
    assert!(
        numbers(&shown).iter().all(|v| *v > 3.0),
        "shown: {:?}",
        shown
    );
}
