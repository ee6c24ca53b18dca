//! Session: per-participant conversation state and the stage machine.
//!
//! - `types`: the `Session` value, stages, turn inputs and verdicts
//! - `machine`: `TaskRuntime`, which compiles a task definition into
//!   detectors and applies one turn at a time

pub mod machine;
pub mod types;

pub use machine::TaskRuntime;
pub use types::{
    new_session_id, FinalResult, Session, Stage, TerminationReason, TurnInput, Verdict,
};
