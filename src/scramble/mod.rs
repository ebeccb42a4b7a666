pub mod controller;
pub mod state;

pub use controller::{DisplaySink, ScrambleController};
pub use state::{mask_text, Phase, ScrambleConfig, ScrambleMode, ScrambleSession, TickOutcome};
