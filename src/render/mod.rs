//! Screen rendering for both programs
//!
//! Renderers read flags and shared state and write through the display
//! collaborator. They track the last screen drawn and only clear the whole
//! panel when it changes.

pub mod multimeter;
pub mod reaction;

pub use multimeter::{MeterRenderer, MeterView};
pub use reaction::{ReactionRenderer, Screen};
