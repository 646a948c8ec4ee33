pub mod button_handler;
pub mod lcd;
pub mod storage;

pub use button_handler::{Button, DebounceState, Debouncer};
pub use lcd::{Display, Hd44780, LcdBus, Position, Ready, Register};
pub use storage::{BestScore, WordStorage};
