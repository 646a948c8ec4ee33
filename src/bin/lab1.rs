//! Reaction-time tester

#![cfg_attr(target_arch = "avr", no_std, no_main, feature(abi_avr_interrupt))]

#[cfg(target_arch = "avr")]
mod firmware {
    use panic_halt as _;

    use avr_lab_firmware::application::ReactionShared;
    use avr_lab_firmware::application::ReactionTester;
    use avr_lab_firmware::drivers::Hd44780;
    use avr_lab_firmware::hal::{board, exint, uart, Console, Delay, Eeprom, PortLcdBus, TickTimer};
    use avr_lab_firmware::{log_error, log_info, logger};

    static SHARED: ReactionShared = ReactionShared::new();

    #[avr_device::entry]
    fn main() -> ! {
        logger::install(Console::new());

        let (led, sw1) = unsafe { (board::Led::steal().into_output(), board::Sw1::steal().into_input()) };
        let display = Hd44780::new(PortLcdBus::new(Delay::new()));
        let mut tester = ReactionTester::new(&SHARED, sw1, led, display, Eeprom::new());

        let mut delay = Delay::new();
        if let Err(e) = tester.boot(&mut delay) {
            log_error!("boot failed: {}", e);
        }

        let _tick = TickTimer::start();
        exint::enable_int0_falling();
        unsafe { avr_device::interrupt::enable() };
        log_info!("lab1 running");

        loop {
            // Failed tasks are logged inside and rescheduled next period
            let _ = tester.poll();
        }
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER2_COMPA() {
        SHARED.on_tick();
    }

    #[avr_device::interrupt(atmega328p)]
    fn INT0() {
        SHARED.on_trigger();
    }

    #[avr_device::interrupt(atmega328p)]
    fn USART_UDRE() {
        uart::on_data_register_empty();
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {}
