//! Cooperative scheduling primitives shared by both programs

pub mod flags;
pub mod scheduler;
pub mod timers;

pub use flags::{Flag, FlagBus, FlagSet};
pub use scheduler::{Scheduler, Task};
pub use timers::{ResponseCounter, WaitCountdown};
