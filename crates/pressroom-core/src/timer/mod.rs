mod machine;
mod stage;
mod ticker;

pub use machine::{StageMachine, DEFAULT_STIR_REMINDER_DELAY};
pub use stage::{Stage, StageState};
pub use ticker::{TickToken, Ticker, TICK_PERIOD};
