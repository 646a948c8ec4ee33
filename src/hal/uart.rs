use avr_device::atmega328p::USART0;
use avr_device::interrupt::Mutex;
use core::cell::RefCell;
use core::convert::Infallible;
use heapless::spsc::Queue;

use crate::config::{CPU_FREQ_HZ, UART_BAUD};

/// Queue slots; one stays free, so 63 bytes can be pending
const TX_SLOTS: usize = 64;

const UBRR: u16 = (CPU_FREQ_HZ / (16 * UART_BAUD) - 1) as u16;

const TXEN0: u8 = 1 << 3;
const UDRIE0: u8 = 1 << 5;
/// 8 data bits, no parity, 1 stop bit
const UCSZ_8N1: u8 = 0x06;

static TX_QUEUE: Mutex<RefCell<Queue<u8, TX_SLOTS>>> = Mutex::new(RefCell::new(Queue::new()));

/// Transmit-only USART0 console drained by the data-register-empty
/// interrupt. Bytes written while the queue is full are dropped.
pub struct Console {
    _private: (),
}

impl Console {
    pub fn new() -> Self {
        unsafe {
            let p = &*USART0::ptr();
            p.ubrr0.write(|w| w.bits(UBRR));
            p.ucsr0c.write(|w| w.bits(UCSZ_8N1));
            p.ucsr0b.write(|w| w.bits(TXEN0));
        }
        Self { _private: () }
    }

    pub fn write_byte(&mut self, byte: u8) {
        avr_device::interrupt::free(|cs| {
            // Full: the byte is dropped
            let _ = TX_QUEUE.borrow(cs).borrow_mut().enqueue(byte);
        });
        unsafe {
            (*USART0::ptr()).ucsr0b.modify(|r, w| w.bits(r.bits() | UDRIE0));
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl ufmt::uWrite for Console {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
        Ok(())
    }
}

/// USART_UDRE interrupt body: send the next byte or stop when drained.
pub fn on_data_register_empty() {
    avr_device::interrupt::free(|cs| {
        let p = unsafe { &*USART0::ptr() };
        if let Some(byte) = TX_QUEUE.borrow(cs).borrow_mut().dequeue() {
            p.udr0.write(|w| unsafe { w.bits(byte) });
        } else {
            p.ucsr0b.modify(|r, w| unsafe { w.bits(r.bits() & !UDRIE0) });
        }
    });
}
