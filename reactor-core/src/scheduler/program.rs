//! Program state
//!
//! The single record of sequencing progress. Owned by the sequencer; every
//! mutation is reported to a [`ProgramObserver`].

/// Receives program state changes
pub trait ProgramObserver {
    /// Any field of the program state changed
    fn program_changed(&mut self, state: &ProgramState);

    /// The countdown of `step` just reached zero
    fn countdown_finished(&mut self, step: u8);
}

/// Sequencing progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramState {
    current_step: u8,
    remaining_s: u32,
    duration_s: u32,
    is_started: bool,
    is_paused: bool,
    auto_mode: bool,
}

impl Default for ProgramState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ProgramState {
    /// Create an idle program state
    pub const fn new(auto_mode: bool) -> Self {
        Self {
            current_step: 0,
            remaining_s: 0,
            duration_s: 0,
            is_started: false,
            is_paused: false,
            auto_mode,
        }
    }

    /// Active step number (0 when idle)
    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    /// Seconds left on the active step
    pub fn remaining_s(&self) -> u32 {
        self.remaining_s
    }

    /// Seconds already counted down on the active step
    pub fn elapsed_s(&self) -> u32 {
        self.duration_s.saturating_sub(self.remaining_s)
    }

    pub fn is_started(&self) -> bool {
        self.is_started
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn auto_mode(&self) -> bool {
        self.auto_mode
    }

    /// True while the countdown is allowed to move
    pub fn is_running(&self) -> bool {
        self.is_started && !self.is_paused
    }

    /// Begin a step with a full countdown
    pub fn start(&mut self, step: u8, seconds: u32, observer: &mut impl ProgramObserver) {
        self.current_step = step;
        self.remaining_s = seconds;
        self.duration_s = seconds;
        self.is_started = true;
        self.is_paused = false;
        observer.program_changed(self);
    }

    /// Freeze the countdown
    pub fn pause(&mut self, observer: &mut impl ProgramObserver) -> bool {
        if !self.is_running() {
            return false;
        }
        self.is_paused = true;
        observer.program_changed(self);
        true
    }

    /// Unfreeze the countdown
    pub fn resume(&mut self, observer: &mut impl ProgramObserver) -> bool {
        if !(self.is_started && self.is_paused) {
            return false;
        }
        self.is_paused = false;
        observer.program_changed(self);
        true
    }

    /// Decrement by one second
    ///
    /// Returns `true` on the tick that brings the countdown to zero. No-op
    /// while stopped, paused or already at zero.
    pub fn tick(&mut self, observer: &mut impl ProgramObserver) -> bool {
        if !self.is_running() || self.remaining_s == 0 {
            return false;
        }
        self.remaining_s -= 1;
        observer.program_changed(self);
        if self.remaining_s == 0 {
            observer.countdown_finished(self.current_step);
            return true;
        }
        false
    }

    /// Jump the countdown to zero
    pub fn expire(&mut self, observer: &mut impl ProgramObserver) -> bool {
        if !self.is_running() {
            return false;
        }
        self.remaining_s = 0;
        observer.program_changed(self);
        observer.countdown_finished(self.current_step);
        true
    }

    /// Run ended; keep auto mode
    pub fn finish(&mut self, observer: &mut impl ProgramObserver) {
        *self = Self::new(self.auto_mode);
        observer.program_changed(self);
    }

    /// Back to idle
    pub fn reset(&mut self, observer: &mut impl ProgramObserver) {
        self.finish(observer);
    }

    pub fn set_auto_mode(&mut self, enabled: bool, observer: &mut impl ProgramObserver) {
        if self.auto_mode != enabled {
            self.auto_mode = enabled;
            observer.program_changed(self);
        }
    }
}
