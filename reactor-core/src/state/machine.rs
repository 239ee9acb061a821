//! Sequencer state machine
//!
//! The sequencer phase is a function of the current phase and an event.
//! Pause is not a phase: a paused sequencer keeps its phase and only its
//! ticks are suppressed.

use super::events::Event;

/// Sequencer phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencerState {
    /// No step active
    #[default]
    Idle,
    /// Step active, waiting for the temperature threshold
    WaitingForThreshold,
    /// Step active, countdown running
    CountingDown,
}

impl SequencerState {
    /// Check if a step is active
    pub fn is_active(&self) -> bool {
        !matches!(self, SequencerState::Idle)
    }

    /// Check if the threshold tick should run
    pub fn polls_threshold(&self) -> bool {
        matches!(self, SequencerState::WaitingForThreshold)
    }

    /// Check if the countdown tick should run
    pub fn counts_down(&self) -> bool {
        matches!(self, SequencerState::CountingDown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SequencerState::Idle => "idle",
            SequencerState::WaitingForThreshold => "waiting",
            SequencerState::CountingDown => "counting",
        }
    }

    /// Process an event and return the next phase
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use SequencerState::*;

        match (self, event) {
            // Activation re-targets from any phase
            (_, CountdownArmed) => CountingDown,
            (_, ThresholdArmed) => WaitingForThreshold,

            (WaitingForThreshold, ThresholdReached) => CountingDown,

            // Completion is reached by countdown or skip
            (_, RunComplete) | (_, RunHalted) | (_, Reset) => Idle,

            // Default: stay in current phase
            _ => self,
        }
    }
}
