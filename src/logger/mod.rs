//! Leveled log records formatted with `ufmt`
//!
//! Records go to a single sink installed at boot: the USART console on the
//! board, an in-memory buffer on the host. Interrupt handlers must not log.

use core::cell::RefCell;
use critical_section::Mutex;
use ufmt::uWrite;

use crate::config::LOG_LEVEL;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl Level {
    const fn tag(self) -> &'static str {
        match self {
            Level::Error => "[ERR] ",
            Level::Warn => "[WRN] ",
            Level::Info => "[INF] ",
            Level::Debug => "[DBG] ",
        }
    }
}

#[cfg(target_arch = "avr")]
pub type Sink = crate::hal::uart::Console;
#[cfg(not(target_arch = "avr"))]
pub type Sink = MemorySink;

static SINK: Mutex<RefCell<Option<Sink>>> = Mutex::new(RefCell::new(None));

/// Install the log sink. Records emitted before this are dropped.
pub fn install(sink: Sink) {
    critical_section::with(|cs| {
        SINK.borrow(cs).replace(Some(sink));
    });
}

#[inline]
pub fn enabled(level: Level) -> bool {
    level <= LOG_LEVEL
}

#[doc(hidden)]
pub fn record<F>(level: Level, body: F)
where
    F: FnOnce(&mut Sink),
{
    if !enabled(level) {
        return;
    }

    critical_section::with(|cs| {
        if let Some(sink) = SINK.borrow(cs).borrow_mut().as_mut() {
            let _ = sink.write_str(level.tag());
            body(sink);
            let _ = sink.write_str("\r\n");
        }
    });
}

/// Host-side sink keeping the most recent output in memory
#[cfg(not(target_arch = "avr"))]
pub struct MemorySink {
    buffer: heapless::String<512>,
}

#[cfg(not(target_arch = "avr"))]
impl MemorySink {
    pub const fn new() -> Self {
        Self {
            buffer: heapless::String::new(),
        }
    }
}

#[cfg(not(target_arch = "avr"))]
impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "avr"))]
impl uWrite for MemorySink {
    type Error = core::convert::Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        if self.buffer.push_str(s).is_err() {
            // Oldest output is dropped wholesale
            self.buffer.clear();
            let _ = self.buffer.push_str(s);
        }
        Ok(())
    }
}

/// Take everything logged so far on the host.
#[cfg(not(target_arch = "avr"))]
pub fn drain() -> heapless::String<512> {
    critical_section::with(|cs| {
        SINK.borrow(cs)
            .borrow_mut()
            .as_mut()
            .map(|sink| core::mem::take(&mut sink.buffer))
            .unwrap_or_default()
    })
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:expr, $($arg:tt)+) => {
        $crate::logger::record($level, |w| {
            let _ = ::ufmt::uwrite!(w, $($arg)+);
        })
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::__log!($crate::logger::Level::Error, $($arg)+) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)+) => { $crate::__log!($crate::logger::Level::Warn, $($arg)+) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::__log!($crate::logger::Level::Info, $($arg)+) };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::__log!($crate::logger::Level::Debug, $($arg)+) };
}
