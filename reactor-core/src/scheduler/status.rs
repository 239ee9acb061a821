//! Per-step lamp tracking
//!
//! `Run` only for the active step while the program runs unpaused, `Done`
//! for steps completed in this run, `Wait` otherwise.

use super::program::ProgramState;
use crate::config::{CompletionStatus, Recipe, SettingsStore, LAST_STEP};

/// Receives lamp changes
pub trait StatusObserver {
    /// Lamp of `step` changed
    fn status_changed(&mut self, step: u8, status: CompletionStatus);

    /// Setting of `step` could not be persisted (0 for recipe-wide settings)
    fn persist_failed(&mut self, _step: u8) {}
}

/// Steps completed in the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DoneSet(u8);

impl DoneSet {
    /// Empty set
    pub const fn new() -> Self {
        Self(0)
    }

    fn bit(step: u8) -> u8 {
        match step {
            1..=LAST_STEP => 1 << (step - 1),
            _ => 0,
        }
    }

    /// Add a step; returns false if it was already present
    pub fn insert(&mut self, step: u8) -> bool {
        let bit = Self::bit(step);
        let added = self.0 & bit == 0 && bit != 0;
        self.0 |= bit;
        added
    }

    pub fn contains(&self, step: u8) -> bool {
        let bit = Self::bit(step);
        bit != 0 && self.0 & bit != 0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Step numbers in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (1..=LAST_STEP).filter(|&step| self.contains(step))
    }
}

/// Tracks completion and keeps the recipe's lamps in sync
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    done: DoneSet,
}

impl StatusTracker {
    /// Rebuild the done set from persisted lamps
    pub fn restore(recipe: &Recipe) -> Self {
        let mut done = DoneSet::new();
        for (number, step) in recipe.steps() {
            if step.status == CompletionStatus::Done {
                done.insert(number);
            }
        }
        Self { done }
    }

    pub fn done(&self) -> DoneSet {
        self.done
    }

    pub fn is_done(&self, step: u8) -> bool {
        self.done.contains(step)
    }

    /// Record completion; returns false if already done this run
    pub fn mark_done(&mut self, step: u8) -> bool {
        self.done.insert(step)
    }

    pub fn clear(&mut self) {
        self.done.clear();
    }

    /// Lamp a step should show right now
    pub fn classify(&self, step: u8, program: &ProgramState) -> CompletionStatus {
        if self.done.contains(step) {
            CompletionStatus::Done
        } else if program.is_running() && program.current_step() == step {
            CompletionStatus::Run
        } else {
            CompletionStatus::Wait
        }
    }

    /// Bring every lamp in line with the current state
    ///
    /// Only changed lamps are written back and reported.
    pub fn refresh<S: SettingsStore>(
        &self,
        recipe: &mut Recipe,
        program: &ProgramState,
        store: &mut S,
        observer: &mut impl StatusObserver,
    ) {
        for number in 1..=LAST_STEP {
            let wanted = self.classify(number, program);
            let current = recipe.step(number).map(|step| step.status);
            if current == Some(wanted) {
                continue;
            }
            if recipe.set_status(number, wanted, store).is_err() {
                observer.persist_failed(number);
            }
            observer.status_changed(number, wanted);
        }
    }
}
