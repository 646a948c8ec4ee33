//! Autoranging multimeter

#![cfg_attr(target_arch = "avr", no_std, no_main, feature(abi_avr_interrupt))]

#[cfg(target_arch = "avr")]
mod firmware {
    use panic_halt as _;

    use avr_lab_firmware::application::multimeter::RangeSettings;
    use avr_lab_firmware::application::{MeterShared, Multimeter};
    use avr_lab_firmware::drivers::Hd44780;
    use avr_lab_firmware::hal::timer::CaptureTimer;
    use avr_lab_firmware::hal::{
        adc, board, uart, Adc, Console, Delay, MeterHardware, PortLcdBus, TickTimer,
    };
    use avr_lab_firmware::{log_error, log_info, logger};

    static SHARED: MeterShared = MeterShared::new();

    #[avr_device::entry]
    fn main() -> ! {
        logger::install(Console::new());

        let buttons = unsafe {
            (
                board::Sw1::steal().into_input(),
                board::Sw2::steal().into_input(),
                board::Sw3::steal().into_input(),
            )
        };
        let display = Hd44780::new(PortLcdBus::new(Delay::new()));
        let front_end = MeterHardware::new(
            CaptureTimer::start(RangeSettings::BOOT.prescaler),
            Adc::new(RangeSettings::BOOT.reference),
        );
        let mut meter = Multimeter::new(&SHARED, buttons, display, front_end);

        let mut delay = Delay::new();
        if let Err(e) = meter.boot(&mut delay) {
            log_error!("boot failed: {}", e);
        }

        let _tick = TickTimer::start();
        unsafe { avr_device::interrupt::enable() };
        log_info!("lab2 running");

        loop {
            // Failed tasks are logged inside and rescheduled next period
            let _ = meter.poll();
        }
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER2_COMPA() {
        SHARED.on_tick();
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER1_CAPT() {
        SHARED.on_capture(CaptureTimer::take_capture());
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER1_OVF() {
        SHARED.on_overflow();
    }

    #[avr_device::interrupt(atmega328p)]
    fn ADC() {
        SHARED.on_conversion(adc::Adc::result());
    }

    #[avr_device::interrupt(atmega328p)]
    fn USART_UDRE() {
        uart::on_data_register_empty();
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {}
