//! Step sequencer state machine
//!
//! The machine is explicit, finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::SequencerState;
