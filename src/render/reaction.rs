//! Reaction tester screens

use crate::application::reaction::ReactionFlag;
use crate::drivers::{BestScore, Display, Position, WordStorage};
use crate::error::{Error, Result};
use crate::rtos::FlagSet;

const READY: &[u8] = b"READY !!!";
const INSTRUCTIONS: &[u8] = b"push SW2 when   led comes on";
const CHEAT: &[u8] = b"CHEAT !!!";
const TOO_SLOW: &[u8] = b"Too slow !      Try again !";
const WAITING: &[u8] = b".....";
const RESULT_LABEL: &[u8] = b"R/n time :";
const BEST_LABEL: &[u8] = b"High score :";

const RESULT_AT: Position = Position::new(0, 11);
const BEST_AT: Position = Position::new(1, 13);
const SCORE_DIGITS: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Ready,
    Instructions,
    Results,
    Cheat,
    TooSlow,
    Waiting,
}

impl Screen {
    /// Highest-priority screen requested by the pending display flags.
    pub fn select(pending: FlagSet<ReactionFlag>) -> Option<Self> {
        const ORDER: [(ReactionFlag, Screen); 6] = [
            (ReactionFlag::DisplayReady, Screen::Ready),
            (ReactionFlag::DisplayInstructions, Screen::Instructions),
            (ReactionFlag::DisplayResults, Screen::Results),
            (ReactionFlag::DisplayCheat, Screen::Cheat),
            (ReactionFlag::DisplayTooSlow, Screen::TooSlow),
            (ReactionFlag::DisplayWaiting, Screen::Waiting),
        ];

        ORDER
            .iter()
            .find(|(flag, _)| pending.contains(*flag))
            .map(|&(_, screen)| screen)
    }
}

/// Draws the requested screen once per change of screen.
pub struct ReactionRenderer {
    shown: Option<Screen>,
    best: BestScore,
}

impl ReactionRenderer {
    pub const fn new(best: BestScore) -> Self {
        Self { shown: None, best }
    }

    pub fn shown(&self) -> Option<Screen> {
        self.shown
    }

    /// Forget the current screen so the next request redraws.
    pub fn invalidate(&mut self) {
        self.shown = None;
    }

    /// Returns the screen drawn by this call, if any.
    pub fn render<D, S>(
        &mut self,
        display: &mut D,
        storage: &mut S,
        pending: FlagSet<ReactionFlag>,
        response_ticks: u16,
    ) -> Result<Option<Screen>>
    where
        D: Display,
        S: WordStorage,
    {
        let screen = match Screen::select(pending) {
            Some(screen) if self.shown != Some(screen) => screen,
            _ => return Ok(None),
        };

        display.reset_to_home().map_err(|_| Error::Display)?;
        let drawn = match screen {
            Screen::Ready => display.write_lines(READY),
            Screen::Instructions => display.write_lines(INSTRUCTIONS),
            Screen::Cheat => display.write_lines(CHEAT),
            Screen::TooSlow => display.write_lines(TOO_SLOW),
            Screen::Waiting => display.write_lines(WAITING),
            Screen::Results => {
                let best = self
                    .best
                    .record(storage, response_ticks)
                    .map_err(|_| Error::Storage)?;
                crate::log_info!("reaction {} ticks, best {}", response_ticks, best);
                Self::results(display, response_ticks, best)
            }
        };
        drawn.map_err(|_| Error::Display)?;

        self.shown = Some(screen);
        Ok(Some(screen))
    }

    fn results<D: Display>(display: &mut D, result: u16, best: u16) -> core::result::Result<(), D::Error> {
        display.write_text(RESULT_LABEL, Position::HOME)?;
        display.write_number(result as u32, SCORE_DIGITS, RESULT_AT)?;
        display.write_text(BEST_LABEL, Position::new(1, 0))?;
        display.write_number(best as u32, SCORE_DIGITS, BEST_AT)
    }
}
