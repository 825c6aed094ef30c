//! Card workflow state machine.

mod controller;
mod state;

pub use controller::CardWorkflow;
pub use state::{CardPhase, CardState};
