//! Step scheduling
//!
//! Program state, lamp tracking, setpoint pacing and the sequencer that
//! drives them.

pub mod dispatch;
pub mod executor;
pub mod program;
pub mod status;

pub use dispatch::{PacedCommand, SetpointPlan};
pub use executor::{
    format_hms, ActiveSetpoint, ProgramSnapshot, Sequencer, SequencerSink, COUNTDOWN_INTERVAL_MS,
    THRESHOLD_INTERVAL_MS,
};
pub use program::{ProgramObserver, ProgramState};
pub use status::{DoneSet, StatusObserver, StatusTracker};
