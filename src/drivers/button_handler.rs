use embedded_hal::digital::v2::InputPin;

use crate::error::{Error, Result};

/// Debounce state of one push button
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DebounceState {
    NoPush,
    MaybePush,
    Pushed,
    MaybeNoPush,
}

impl DebounceState {
    /// Advance on one sample. The flag is `true` on a confirmed release.
    pub const fn next(self, pressed: bool) -> (Self, bool) {
        match (self, pressed) {
            (DebounceState::NoPush, true) => (DebounceState::MaybePush, false),
            (DebounceState::NoPush, false) => (DebounceState::NoPush, false),
            (DebounceState::MaybePush, true) => (DebounceState::Pushed, false),
            (DebounceState::MaybePush, false) => (DebounceState::NoPush, false),
            (DebounceState::Pushed, true) => (DebounceState::Pushed, false),
            (DebounceState::Pushed, false) => (DebounceState::MaybeNoPush, false),
            (DebounceState::MaybeNoPush, true) => (DebounceState::Pushed, false),
            (DebounceState::MaybeNoPush, false) => (DebounceState::NoPush, true),
        }
    }
}

/// Press-and-release detector fed one sample per debounce period
#[derive(Copy, Clone, Debug)]
pub struct Debouncer {
    state: DebounceState,
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            state: DebounceState::NoPush,
        }
    }

    /// Returns `true` exactly once per confirmed press and release.
    pub fn sample(&mut self, pressed: bool) -> bool {
        let (state, released) = self.state.next(pressed);
        self.state = state;
        released
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

/// Active-low push button (external pull-up) with its debouncer
pub struct Button<P> {
    pin: P,
    debouncer: Debouncer,
}

impl<P: InputPin> Button<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            debouncer: Debouncer::new(),
        }
    }

    /// Sample the pin once. `Ok(true)` on a confirmed press and release.
    pub fn poll(&mut self) -> Result<bool> {
        let pressed = self.pin.is_low().map_err(|_| Error::Input)?;
        Ok(self.debouncer.sample(pressed))
    }

    pub fn state(&self) -> DebounceState {
        self.debouncer.state()
    }

    pub fn release(self) -> P {
        self.pin
    }
}
