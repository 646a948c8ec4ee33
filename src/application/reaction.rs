//! Reaction-time tester (lab1)
//!
//! The player confirms twice with SW1, waits for the LED and hits SW2 (INT0)
//! as fast as possible. Hitting SW2 before the LED comes on is cheating; not
//! hitting it within the response ceiling is too slow.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use portable_atomic::{AtomicU8, Ordering};

use crate::config::reaction::{
    BEST_SCORE_SLOT, DEBOUNCE_PERIOD_MS, DISPLAY_PERIOD_MS, RESPONSE_CEILING_TICKS,
    STATE_MACHINE_PERIOD_MS, WAIT_DURATION_TICKS,
};
use crate::config::SPLASH_MS;
use crate::drivers::{BestScore, Button, Display, WordStorage};
use crate::error::{Error, Result};
use crate::render::reaction::ReactionRenderer;
use crate::rtos::{FlagBus, FlagSet, ResponseCounter, Scheduler, Task, WaitCountdown};

crate::flags! {
    pub enum ReactionFlag {
        DisplayReady,
        /// Debounced SW1 press and release
        Confirm,
        DisplayInstructions,
        /// Raised by the tick interrupt when the wait countdown completes
        WaitDone,
        /// Raised by INT0 (SW2)
        Trigger,
        /// Response counter armed
        TimeCount,
        /// Raised by the tick interrupt at the response ceiling
        TooSlow,
        DisplayCheat,
        DisplayTooSlow,
        DisplayResults,
        DisplayWaiting,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ReactionState {
    Ready = 0,
    Instructions = 1,
    Wait = 2,
    Cheat = 3,
    Running = 4,
    Results = 5,
}

impl ReactionState {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => ReactionState::Instructions,
            2 => ReactionState::Wait,
            3 => ReactionState::Cheat,
            4 => ReactionState::Running,
            5 => ReactionState::Results,
            _ => ReactionState::Ready,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ReactionState::Ready => "READY",
            ReactionState::Instructions => "INSTRUCTIONS",
            ReactionState::Wait => "WAIT",
            ReactionState::Cheat => "CHEAT",
            ReactionState::Running => "RUNNING",
            ReactionState::Results => "RESULTS",
        }
    }
}

impl ufmt::uDisplay for ReactionState {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactionTask {
    Debounce,
    StateMachine,
    Display,
}

impl Task for ReactionTask {
    const ALL: &'static [Self] = &[
        ReactionTask::Debounce,
        ReactionTask::StateMachine,
        ReactionTask::Display,
    ];

    fn period_ms(self) -> u16 {
        match self {
            ReactionTask::Debounce => DEBOUNCE_PERIOD_MS,
            ReactionTask::StateMachine => STATE_MACHINE_PERIOD_MS,
            ReactionTask::Display => DISPLAY_PERIOD_MS,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

pub const TASKS: usize = 3;

/// State shared between the interrupt handlers and the foreground tasks.
///
/// `state` is written only by the state-machine task. `wait` and `response`
/// are counted by the tick interrupt and reset by the state machine before
/// the interrupt starts counting them.
pub struct ReactionShared {
    pub flags: FlagBus<ReactionFlag>,
    pub scheduler: Scheduler<ReactionTask, TASKS>,
    state: AtomicU8,
    wait: WaitCountdown,
    response: ResponseCounter,
}

impl ReactionShared {
    pub const fn new() -> Self {
        Self {
            flags: FlagBus::new(),
            scheduler: Scheduler::new(),
            state: AtomicU8::new(ReactionState::Ready as u8),
            wait: WaitCountdown::new(WAIT_DURATION_TICKS),
            response: ResponseCounter::new(RESPONSE_CEILING_TICKS),
        }
    }

    /// 1 ms tick interrupt.
    pub fn on_tick(&self) {
        self.scheduler.tick();

        let pending = self.flags.snapshot();
        if self.state() == ReactionState::Wait
            && !pending.contains(ReactionFlag::WaitDone)
            && self.wait.tick()
        {
            self.flags.set(ReactionFlag::WaitDone);
        }

        if pending.contains(ReactionFlag::TimeCount)
            && !pending.contains(ReactionFlag::Trigger)
            && !pending.contains(ReactionFlag::TooSlow)
            && self.response.tick()
        {
            self.flags.set(ReactionFlag::TooSlow);
        }
    }

    /// INT0 falling edge (SW2). Ignored outside WAIT and RUNNING and while a
    /// trigger is still pending.
    pub fn on_trigger(&self) {
        let armed = matches!(self.state(), ReactionState::Wait | ReactionState::Running);
        if armed && !self.flags.is_set(ReactionFlag::Trigger) {
            self.flags.set(ReactionFlag::Trigger);
        }
    }

    pub fn state(&self) -> ReactionState {
        ReactionState::from_raw(self.state.load(Ordering::Acquire))
    }

    fn publish(&self, state: ReactionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Ticks counted since the LED came on, saturated at the ceiling.
    pub fn response_ticks(&self) -> u16 {
        self.response.ticks()
    }
}

impl Default for ReactionShared {
    fn default() -> Self {
        Self::new()
    }
}

/// Side effects of one state-machine step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Effects {
    pub clear: FlagSet<ReactionFlag>,
    pub set: FlagSet<ReactionFlag>,
    /// New LED level, if it changes
    pub indicator: Option<bool>,
    pub arm_wait: bool,
    pub restart_response: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub next: ReactionState,
    pub effects: Effects,
}

/// Transition function of the game. Pure: the caller applies the effects.
pub fn step(state: ReactionState, pending: FlagSet<ReactionFlag>) -> Step {
    use ReactionFlag::*;

    let confirmed = pending.contains(Confirm);
    let mut fx = Effects::default();

    let next = match state {
        ReactionState::Ready => {
            fx.set = fx.set.with(DisplayReady);
            if confirmed {
                fx.clear = fx.clear.with(Confirm).with(DisplayReady);
                fx.set = FlagSet::EMPTY;
                ReactionState::Instructions
            } else {
                state
            }
        }
        ReactionState::Instructions => {
            fx.set = fx.set.with(DisplayInstructions);
            if confirmed {
                fx.clear = fx.clear.with(Confirm).with(DisplayInstructions);
                fx.set = FlagSet::EMPTY.with(DisplayWaiting);
                fx.arm_wait = true;
                ReactionState::Wait
            } else {
                state
            }
        }
        ReactionState::Wait => {
            fx.clear = fx.clear.with(Confirm);
            if pending.contains(Trigger) {
                fx.clear = fx.clear.with(Trigger).with(DisplayWaiting).with(WaitDone);
                ReactionState::Cheat
            } else if pending.contains(WaitDone) {
                fx.clear = fx.clear.with(WaitDone);
                fx.set = fx.set.with(TimeCount);
                fx.indicator = Some(true);
                fx.restart_response = true;
                ReactionState::Running
            } else {
                state
            }
        }
        ReactionState::Cheat => {
            fx.set = fx.set.with(DisplayCheat);
            if confirmed {
                fx.clear = fx.clear.with(Confirm).with(DisplayCheat);
                fx.set = FlagSet::EMPTY;
                ReactionState::Ready
            } else {
                state
            }
        }
        ReactionState::Running => {
            fx.clear = fx.clear.with(Confirm);
            if pending.contains(Trigger) || pending.contains(TooSlow) {
                fx.clear = fx.clear.with(Trigger).with(TimeCount).with(DisplayWaiting);
                fx.indicator = Some(false);
                ReactionState::Results
            } else {
                state
            }
        }
        ReactionState::Results => {
            fx.clear = fx.clear.with(Trigger);
            if confirmed {
                fx.clear = fx
                    .clear
                    .with(Confirm)
                    .with(TooSlow)
                    .with(DisplayResults)
                    .with(DisplayTooSlow);
                ReactionState::Ready
            } else if pending.contains(TooSlow) {
                fx.set = fx.set.with(DisplayTooSlow);
                state
            } else {
                fx.set = fx.set.with(DisplayResults);
                state
            }
        }
    };

    Step { next, effects: fx }
}

/// The lab1 program: confirm button, LED, display and best-score storage
/// driven by the three scheduled tasks.
pub struct ReactionTester<'a, B, L, D, S> {
    shared: &'a ReactionShared,
    confirm: Button<B>,
    led: L,
    display: D,
    storage: S,
    renderer: ReactionRenderer,
}

impl<'a, B, L, D, S> ReactionTester<'a, B, L, D, S>
where
    B: InputPin,
    L: OutputPin,
    D: Display,
    S: WordStorage,
{
    pub fn new(shared: &'a ReactionShared, confirm: B, led: L, display: D, storage: S) -> Self {
        Self {
            shared,
            confirm: Button::new(confirm),
            led,
            display,
            storage,
            renderer: ReactionRenderer::new(BestScore::new(BEST_SCORE_SLOT)),
        }
    }

    /// Bring up the display, show the splash and turn the LED off.
    /// Runs before interrupts are enabled.
    pub fn boot<T: DelayMs<u16>>(&mut self, delay: &mut T) -> Result<()> {
        self.set_indicator(false)?;
        self.display.initialize().map_err(|_| Error::Display)?;
        self.display
            .write_lines(b"Reaction time   tester")
            .map_err(|_| Error::Display)?;
        delay.delay_ms(SPLASH_MS);
        self.display.reset_to_home().map_err(|_| Error::Display)?;
        self.renderer.invalidate();

        crate::log_info!("reaction tester up");
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

    pub fn run(&mut self, task: ReactionTask) -> Result<()> {
        match task {
            ReactionTask::Debounce => self.debounce(),
            ReactionTask::StateMachine => self.advance(),
            ReactionTask::Display => self.render(),
        }
    }

    fn debounce(&mut self) -> Result<()> {
        if self.confirm.poll()? {
            self.shared.flags.set(ReactionFlag::Confirm);
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<()> {
        let shared = self.shared;
        let state = shared.state();
        let Step { next, effects } = step(state, shared.flags.snapshot());

        if let Some(on) = effects.indicator {
            self.set_indicator(on)?;
        }
        if effects.arm_wait {
            shared.wait.arm();
        }
        if effects.restart_response {
            shared.response.restart();
        }
        if next != state {
            shared.publish(next);
            crate::log_debug!("{} -> {}", state, next);
        }
        shared.flags.apply(effects.clear, effects.set);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let shared = self.shared;
        self.renderer.render(
            &mut self.display,
            &mut self.storage,
            shared.flags.snapshot(),
            shared.response_ticks(),
        )?;
        Ok(())
    }

    fn set_indicator(&mut self, on: bool) -> Result<()> {
        if on {
            self.led.set_high().map_err(|_| Error::Output)
        } else {
            self.led.set_low().map_err(|_| Error::Output)
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn release(self) -> (B, L, D, S) {
        (self.confirm.release(), self.led, self.display, self.storage)
    }
}
