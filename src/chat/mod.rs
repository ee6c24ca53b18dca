//! Chat: drives one session turn by turn.
//!
//! The runner applies participant input to the stage machine, calls the
//! completion service when the machine asks for a reply, and writes every
//! new message and the final result to the log store.

pub mod errors;
pub mod runner;

pub use errors::ChatError;
pub use runner::{ChatRunner, TurnOutcome};
