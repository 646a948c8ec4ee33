//! The two lab programs
//!
//! Each program owns a `'static` shared context written by its interrupt
//! handlers and a foreground object whose tasks the scheduler dispatches.

pub mod multimeter;
pub mod reaction;

pub use multimeter::{FrontEnd, MeterShared, Multimeter};
pub use reaction::{ReactionShared, ReactionTester};
