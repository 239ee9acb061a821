//! Step sequencer
//!
//! Owns the recipe, settings backend, program state and lamp tracker, and
//! moves through the steps of a run. Time is injected: the runtime calls
//! [`Sequencer::threshold_tick`] every [`THRESHOLD_INTERVAL_MS`] while
//! [`SequencerState::polls_threshold`] holds, and
//! [`Sequencer::countdown_tick`] every [`COUNTDOWN_INTERVAL_MS`] while
//! [`SequencerState::counts_down`] holds.

use core::fmt::Write;

use heapless::String;

use super::dispatch::SetpointPlan;
use super::program::{ProgramObserver, ProgramState};
use super::status::{DoneSet, StatusObserver, StatusTracker};
use crate::config::{
    CompletionStatus, EditError, FieldCheck, Recipe, SettingsStore, Step, StepEdit, TempChannel,
    TimingMode, LAST_STEP, MAX_STEPS,
};
use crate::error::ConfigurationError;
use crate::sensor::{evaluate, DataError, SensorSample};
use crate::state::{Event, SequencerState};

/// Threshold re-evaluation period
pub const THRESHOLD_INTERVAL_MS: u64 = 500;

/// Countdown period
pub const COUNTDOWN_INTERVAL_MS: u64 = 1000;

/// Everything the sequencer reports to the runtime
pub trait SequencerSink: ProgramObserver + StatusObserver {
    /// A step was activated; send its setpoints
    fn dispatch(&mut self, plan: &SetpointPlan);

    /// Phase changed
    fn phase_changed(&mut self, _from: SequencerState, _to: SequencerState) {}
}

/// Setpoints of the active step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveSetpoint {
    pub temperature: f32,
    pub channel: TempChannel,
    pub rpm: u16,
    pub timing_mode: TimingMode,
}

/// Read model for views
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramSnapshot {
    pub current_step: u8,
    pub remaining_s: u32,
    pub elapsed_s: u32,
    pub is_started: bool,
    pub is_paused: bool,
    pub auto_mode: bool,
    pub phase: SequencerState,
    pub statuses: [CompletionStatus; MAX_STEPS],
    pub setpoint: Option<ActiveSetpoint>,
    pub latest: Option<SensorSample>,
}

impl Default for ProgramSnapshot {
    fn default() -> Self {
        Self {
            current_step: 0,
            remaining_s: 0,
            elapsed_s: 0,
            is_started: false,
            is_paused: false,
            auto_mode: true,
            phase: SequencerState::Idle,
            statuses: [CompletionStatus::Wait; MAX_STEPS],
            setpoint: None,
            latest: None,
        }
    }
}

/// Format seconds as `HH:MM:SS`
pub fn format_hms(seconds: u32) -> String<12> {
    let mut text = String::new();
    let _ = write!(
        text,
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    );
    text
}

/// Recipe step sequencer
#[derive(Debug)]
pub struct Sequencer<S> {
    recipe: Recipe,
    store: S,
    program: ProgramState,
    status: StatusTracker,
    phase: SequencerState,
    latest: Option<SensorSample>,
}

impl<S: SettingsStore> Sequencer<S> {
    /// Create a sequencer for a loaded recipe
    ///
    /// Steps persisted as `Done` stay done for this run. A persisted `Run`
    /// lamp belongs to an interrupted session and goes back to `Wait`.
    pub fn new(mut recipe: Recipe, mut store: S) -> Self {
        let status = StatusTracker::restore(&recipe);
        for number in 1..=LAST_STEP {
            if recipe.step(number).map(|step| step.status) == Some(CompletionStatus::Run) {
                let _ = recipe.set_status(number, CompletionStatus::Wait, &mut store);
            }
        }
        let program = ProgramState::new(recipe.auto_mode);

        Self {
            recipe,
            store,
            program,
            status,
            phase: SequencerState::Idle,
            latest: None,
        }
    }

    pub fn phase(&self) -> SequencerState {
        self.phase
    }

    pub fn program(&self) -> &ProgramState {
        &self.program
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn done(&self) -> DoneSet {
        self.status.done()
    }

    pub fn latest_sample(&self) -> Option<&SensorSample> {
        self.latest.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True when the threshold tick should be scheduled
    pub fn wants_threshold_ticks(&self) -> bool {
        self.phase.polls_threshold() && self.program.is_running()
    }

    /// True when the countdown tick should be scheduled
    pub fn wants_countdown_ticks(&self) -> bool {
        self.phase.counts_down() && self.program.is_running()
    }

    /// Start a step, or the first pending one with `None`
    ///
    /// Starting while a step is active re-targets to the requested step; the
    /// abandoned step is not marked done.
    pub fn start(
        &mut self,
        requested: Option<u8>,
        sink: &mut impl SequencerSink,
    ) -> Result<(), ConfigurationError> {
        let number = match requested {
            Some(number) => number,
            None => self.first_pending()?,
        };
        self.check_startable(number)?;
        self.activate(number, sink);
        Ok(())
    }

    /// Re-evaluate the threshold of a waiting step
    ///
    /// Returns `true` if the countdown started.
    pub fn threshold_tick(&mut self, sink: &mut impl SequencerSink) -> bool {
        if !self.wants_threshold_ticks() {
            return false;
        }
        let Some(step) = self.active_step() else {
            return false;
        };
        if evaluate(&step, self.latest.as_ref()) {
            self.apply(Event::ThresholdReached, sink);
            return true;
        }
        false
    }

    /// Count down one second; finishes the step at zero
    pub fn countdown_tick(&mut self, sink: &mut impl SequencerSink) {
        if !self.wants_countdown_ticks() {
            return;
        }
        if self.program.tick(sink) {
            self.finish_active(sink);
        }
    }

    /// Activate the lowest enabled step not yet done
    ///
    /// With none left the run is complete; the done set is kept until reset.
    /// Returns the activated step.
    pub fn next_step(&mut self, sink: &mut impl SequencerSink) -> Option<u8> {
        match self.start(None, sink) {
            Ok(()) => Some(self.program.current_step()),
            Err(_) => {
                self.end_run(Event::RunComplete, sink);
                None
            }
        }
    }

    /// Freeze the active phase
    pub fn pause(&mut self, sink: &mut impl SequencerSink) -> bool {
        if !self.phase.is_active() || !self.program.pause(sink) {
            return false;
        }
        self.refresh_status(sink);
        true
    }

    /// Unfreeze the active phase
    pub fn resume(&mut self, sink: &mut impl SequencerSink) -> bool {
        if !self.phase.is_active() || !self.program.resume(sink) {
            return false;
        }
        self.refresh_status(sink);
        true
    }

    /// Finish the active step now, as if its countdown reached zero
    pub fn skip(&mut self, sink: &mut impl SequencerSink) -> bool {
        if !self.phase.is_active() || !self.program.expire(sink) {
            return false;
        }
        self.finish_active(sink);
        true
    }

    /// Cancel the run and clear all progress
    pub fn reset(&mut self, sink: &mut impl SequencerSink) {
        self.apply(Event::Reset, sink);
        self.status.clear();
        self.program.reset(sink);
        self.refresh_status(sink);
    }

    /// Same as [`Sequencer::reset`]
    pub fn stop(&mut self, sink: &mut impl SequencerSink) {
        self.reset(sink);
    }

    /// Toggle advancing to the next step automatically
    pub fn set_auto_mode(&mut self, enabled: bool, sink: &mut impl SequencerSink) {
        if self.recipe.set_auto_mode(enabled, &mut self.store).is_err() {
            sink.persist_failed(0);
        }
        self.program.set_auto_mode(enabled, sink);
    }

    /// Edit a step field; persisted immediately
    ///
    /// An edit to the active step takes effect on its next activation.
    pub fn edit(
        &mut self,
        number: u8,
        edit: StepEdit<'_>,
    ) -> Result<FieldCheck, EditError<S::Error>> {
        self.recipe.edit(number, edit, &mut self.store)
    }

    /// Change the peer unit's channel; persisted immediately
    pub fn set_peer_channel(&mut self, channel: TempChannel) -> Result<(), S::Error> {
        self.recipe.set_peer_channel(channel, &mut self.store)
    }

    /// Take in a telemetry report
    ///
    /// Short reports are rejected and leave the latest sample untouched.
    pub fn on_sample_received(&mut self, values: &[f32], timestamp_ms: u64) -> Result<(), DataError> {
        self.latest = Some(SensorSample::from_values(values, timestamp_ms)?);
        Ok(())
    }

    /// Write the whole recipe back to the backend
    pub fn flush(&mut self) -> Result<(), S::Error> {
        self.recipe.save_all(&mut self.store)
    }

    /// Current read model
    pub fn snapshot(&self) -> ProgramSnapshot {
        let mut statuses = [CompletionStatus::Wait; MAX_STEPS];
        for (number, step) in self.recipe.steps() {
            statuses[number as usize - 1] = step.status;
        }
        let setpoint = self.active_step().map(|step| ActiveSetpoint {
            temperature: step.target_temperature,
            channel: step.target_channel,
            rpm: step.target_rpm,
            timing_mode: step.timing_mode,
        });

        ProgramSnapshot {
            current_step: self.program.current_step(),
            remaining_s: self.program.remaining_s(),
            elapsed_s: self.program.elapsed_s(),
            is_started: self.program.is_started(),
            is_paused: self.program.is_paused(),
            auto_mode: self.program.auto_mode(),
            phase: self.phase,
            statuses,
            setpoint,
            latest: self.latest,
        }
    }

    fn active_step(&self) -> Option<Step> {
        if !self.phase.is_active() {
            return None;
        }
        self.recipe.step(self.program.current_step()).copied()
    }

    fn first_pending(&self) -> Result<u8, ConfigurationError> {
        if !self.recipe.any_enabled() {
            return Err(ConfigurationError::NoStepEnabled);
        }
        self.recipe
            .steps()
            .find(|(number, step)| step.enabled && !self.status.is_done(*number))
            .map(|(number, _)| number)
            .ok_or(ConfigurationError::NoStepPending)
    }

    fn check_startable(&self, number: u8) -> Result<(), ConfigurationError> {
        let step = self
            .recipe
            .step(number)
            .ok_or(ConfigurationError::InvalidStep(number))?;
        if !step.enabled {
            return Err(ConfigurationError::StepDisabled(number));
        }
        if self.status.is_done(number) {
            return Err(ConfigurationError::StepAlreadyDone(number));
        }
        if step.duration_s() == 0 {
            return Err(ConfigurationError::ZeroDuration(number));
        }
        Ok(())
    }

    fn activate(&mut self, number: u8, sink: &mut impl SequencerSink) {
        let Some(step) = self.recipe.step(number).copied() else {
            return;
        };

        self.program.start(number, step.duration_s(), sink);
        sink.dispatch(&SetpointPlan::for_step(
            number,
            &step,
            self.recipe.unit,
            self.recipe.peer_channel,
        ));

        match step.timing_mode {
            TimingMode::Run => self.apply(Event::CountdownArmed, sink),
            // Threshold already met goes straight to the countdown
            TimingMode::Wait if evaluate(&step, self.latest.as_ref()) => {
                self.apply(Event::CountdownArmed, sink)
            }
            TimingMode::Wait => self.apply(Event::ThresholdArmed, sink),
        }
        self.refresh_status(sink);
    }

    fn finish_active(&mut self, sink: &mut impl SequencerSink) {
        let number = self.program.current_step();
        self.status.mark_done(number);
        self.refresh_status(sink);

        if self.program.auto_mode() {
            self.next_step(sink);
        } else {
            self.end_run(Event::RunHalted, sink);
        }
    }

    fn end_run(&mut self, event: Event, sink: &mut impl SequencerSink) {
        self.apply(event, sink);
        self.program.finish(sink);
        self.refresh_status(sink);
    }

    fn apply(&mut self, event: Event, sink: &mut impl SequencerSink) {
        let next = self.phase.transition(event);
        if next != self.phase {
            sink.phase_changed(self.phase, next);
            self.phase = next;
        }
    }

    fn refresh_status(&mut self, sink: &mut impl SequencerSink) {
        self.status
            .refresh(&mut self.recipe, &self.program, &mut self.store, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::memory::MemoryStore;
    use proptest::prelude::*;
    use reactor_protocol::UnitId;

    #[derive(Default)]
    struct Sink {
        plans: std::vec::Vec<SetpointPlan>,
        phases: std::vec::Vec<SequencerState>,
        finished: std::vec::Vec<u8>,
        lamps: std::vec::Vec<(u8, CompletionStatus)>,
    }

    impl ProgramObserver for Sink {
        fn program_changed(&mut self, _state: &ProgramState) {}

        fn countdown_finished(&mut self, step: u8) {
            self.finished.push(step);
        }
    }

    impl StatusObserver for Sink {
        fn status_changed(&mut self, step: u8, status: CompletionStatus) {
            self.lamps.push((step, status));
        }
    }

    impl SequencerSink for Sink {
        fn dispatch(&mut self, plan: &SetpointPlan) {
            self.plans.push(plan.clone());
        }

        fn phase_changed(&mut self, _from: SequencerState, to: SequencerState) {
            self.phases.push(to);
        }
    }

    fn sequencer(entries: &[(&str, &str)]) -> Sequencer<MemoryStore> {
        let store = MemoryStore::with(entries);
        let recipe = Recipe::load(UnitId::A, &store);
        Sequencer::new(recipe, store)
    }

    /// Steps 1 and 3 enabled: 1 timed for 2 min, 3 gated at 50 °C on TR for 1 min
    fn scenario_a() -> Sequencer<MemoryStore> {
        sequencer(&[
            ("step1.enabled", "true"),
            ("step1.timing_mode", "Run"),
            ("step1.duration_minutes", "2"),
            ("step3.enabled", "true"),
            ("step3.timing_mode", "Wait"),
            ("step3.target_temperature", "50.0"),
            ("step3.target_channel", "TR"),
            ("step3.duration_minutes", "1"),
        ])
    }

    fn run_countdown(seq: &mut Sequencer<MemoryStore>, sink: &mut Sink, ticks: u32) {
        for _ in 0..ticks {
            seq.countdown_tick(sink);
        }
    }

    #[test]
    fn test_scenario_a_full_run() {
        let mut sink = Sink::default();
        let mut seq = scenario_a();

        seq.start(None, &mut sink).unwrap();
        assert_eq!(seq.program().current_step(), 1);
        assert_eq!(seq.phase(), SequencerState::CountingDown);
        assert_eq!(seq.program().remaining_s(), 120);

        run_countdown(&mut seq, &mut sink, 120);
        assert_eq!(seq.recipe().step(1).unwrap().status, CompletionStatus::Done);
        assert_eq!(seq.program().current_step(), 3);
        assert_eq!(seq.phase(), SequencerState::WaitingForThreshold);

        // Countdown ticks do nothing while waiting
        run_countdown(&mut seq, &mut sink, 5);
        assert_eq!(seq.program().remaining_s(), 60);

        seq.on_sample_received(&[51.0, 20.0, 0.0, 0.0], 1000).unwrap();
        assert!(seq.threshold_tick(&mut sink));
        assert_eq!(seq.phase(), SequencerState::CountingDown);
        assert_eq!(seq.program().remaining_s(), 60);

        run_countdown(&mut seq, &mut sink, 60);
        assert_eq!(seq.recipe().step(3).unwrap().status, CompletionStatus::Done);
        assert_eq!(seq.phase(), SequencerState::Idle);
        assert!(!seq.program().is_started());
        assert_eq!(seq.done().iter().collect::<std::vec::Vec<_>>(), [1u8, 3]);
        assert_eq!(sink.finished, [1u8, 3]);
        assert_eq!(sink.plans.len(), 2);
    }

    #[test]
    fn test_scenario_b_nothing_enabled() {
        let mut sink = Sink::default();
        let mut seq = sequencer(&[]);

        assert_eq!(
            seq.start(None, &mut sink),
            Err(ConfigurationError::NoStepEnabled)
        );
        assert!(!seq.program().is_started());
        assert_eq!(seq.phase(), SequencerState::Idle);
        assert!(sink.plans.is_empty());
    }

    #[test]
    fn test_scenario_c_short_sample_dropped() {
        let mut sink = Sink::default();
        let mut seq = scenario_a();
        seq.start(Some(3), &mut sink).unwrap();
        assert_eq!(seq.phase(), SequencerState::WaitingForThreshold);

        seq.on_sample_received(&[30.0, 20.0, 0.0, 0.0], 500).unwrap();
        assert_eq!(
            seq.on_sample_received(&[99.0, 99.0, 0.0], 1000),
            Err(DataError::TooFewValues { got: 3 })
        );

        assert!(!seq.threshold_tick(&mut sink));
        assert_eq!(seq.phase(), SequencerState::WaitingForThreshold);
        assert_eq!(seq.latest_sample().unwrap().tr, 30.0);
    }

    #[test]
    fn test_start_sets_full_duration() {
        let mut sink = Sink::default();
        let mut seq = sequencer(&[
            ("step2.enabled", "true"),
            ("step2.duration_hours", "1"),
            ("step2.duration_minutes", "30"),
        ]);
        seq.start(Some(2), &mut sink).unwrap();

        assert_eq!(seq.program().remaining_s(), 5400);
        assert!(seq.program().is_started());
        assert!(!seq.program().is_paused());
        assert_eq!(sink.plans[0].step(), 2);
        assert_eq!(seq.recipe().step(2).unwrap().status, CompletionStatus::Run);
        assert_eq!(seq.store().read("step2.status").unwrap().as_str(), "Run");
    }

    #[test]
    fn test_threshold_already_met_skips_waiting() {
        let mut sink = Sink::default();
        let mut seq = scenario_a();
        seq.on_sample_received(&[55.0, 20.0, 0.0, 0.0], 0).unwrap();

        seq.start(Some(3), &mut sink).unwrap();
        assert_eq!(seq.phase(), SequencerState::CountingDown);
        assert_eq!(sink.phases, [SequencerState::CountingDown]);
        assert_eq!(seq.program().remaining_s(), 60);
    }

    #[test]
    fn test_start_errors() {
        let mut sink = Sink::default();
        let mut seq = scenario_a();

        assert_eq!(
            seq.start(Some(0), &mut sink),
            Err(ConfigurationError::InvalidStep(0))
        );
        assert_eq!(
            seq.start(Some(9), &mut sink),
            Err(ConfigurationError::InvalidStep(9))
        );
        assert_eq!(
            seq.start(Some(2), &mut sink),
            Err(ConfigurationError::StepDisabled(2))
        );

        seq.start(Some(1), &mut sink).unwrap();
        assert!(seq.skip(&mut sink));
        assert_eq!(
            seq.start(Some(1), &mut sink),
            Err(ConfigurationError::StepAlreadyDone(1))
        );
    }

    #[test]
    fn test_all_done_needs_reset() {
        let mut sink = Sink::default();
        let mut seq = scenario_a();
        seq.on_sample_received(&[80.0, 20.0, 0.0, 0.0], 0).unwrap();

        seq.start(None, &mut sink).unwrap();
        assert!(seq.skip(&mut sink));
        assert!(seq.skip(&mut sink));
        assert_eq!(seq.phase(), SequencerState::Idle);
        assert_eq!(seq.done().len(), 2);

        assert_eq!(
            seq.start(None, &mut sink),
            Err(ConfigurationError::NoStepPending)
        );

        seq.reset(&mut sink);
        assert!(seq.done().is_empty());
        seq.start(None, &mut sink).unwrap();
        assert_eq!(seq.program().current_step(), 1);
    }

    #[test]
    fn test_next_step_picks_lowest_pending() {
        let mut sink = Sink::default();
        let mut seq = sequencer(&[
            ("step2.enabled", "true"),
            ("step5.enabled", "true"),
            ("step7.enabled", "true"),
        ]);

        // Run step 5 first; the next one is still 2
        seq.start(Some(5), &mut sink).unwrap();
        assert!(seq.skip(&mut sink));
        assert_eq!(seq.program().current_step(), 2);

        assert!(seq.skip(&mut sink));
        assert_eq!(seq.program().current_step(), 7);

        assert!(seq.skip(&mut sink));
        assert_eq!(seq.phase(), SequencerState::Idle);
        assert_eq!(seq.next_step(&mut sink), None);
        assert_eq!(seq.done().len(), 3);
    }

    #[test]
    fn test_pause_resume_keeps_countdown() {
        let mut sink = Sink::default();
        let mut seq = scenario_a();
        seq.start(Some(1), &mut sink).unwrap();
        run_countdown(&mut seq, &mut sink, 10);

        assert!(seq.pause(&mut sink));
        assert!(!seq.wants_countdown_ticks());
        assert_eq!(seq.recipe().step(1).unwrap().status, CompletionStatus::Wait);
        run_countdown(&mut seq, &mut sink, 10);
        assert_eq!(seq.program().remaining_s(), 110);

        assert!(seq.resume(&mut sink));
        assert_eq!(seq.phase(), SequencerState::CountingDown);
        assert_eq!(seq.program().remaining_s(), 110);
        assert_eq!(seq.recipe().step(1).unwrap().status, CompletionStatus::Run);
    }

    #[test]
    fn test_pause_resume_keeps_waiting() {
        let mut sink = Sink::default();
        let mut seq = scenario_a();
        seq.start(Some(3), &mut sink).unwrap();

        assert!(seq.pause(&mut sink));
        seq.on_sample_received(&[60.0, 20.0, 0.0, 0.0], 0).unwrap();
        assert!(!seq.threshold_tick(&mut sink));
        assert!(!seq.skip(&mut sink));

        assert!(seq.resume(&mut sink));
        assert_eq!(seq.phase(), SequencerState::WaitingForThreshold);
        assert!(seq.threshold_tick(&mut sink));
    }

    #[test]
    fn test_pause_when_idle() {
        let mut sink = Sink::default();
        let mut seq = scenario_a();
        assert!(!seq.pause(&mut sink));
        assert!(!seq.resume(&mut sink));
        assert!(!seq.skip(&mut sink));
    }

    #[test]
    fn test_retarget_while_active() {
        let mut sink = Sink::default();
        let mut seq = scenario_a();
        seq.start(Some(1), &mut sink).unwrap();
        run_countdown(&mut seq, &mut sink, 30);

        seq.start(Some(3), &mut sink).unwrap();
        assert_eq!(seq.program().current_step(), 3);
        assert_eq!(seq.phase(), SequencerState::WaitingForThreshold);
        assert!(!seq.done().contains(1));
        assert_eq!(seq.recipe().step(1).unwrap().status, CompletionStatus::Wait);
    }

    #[test]
    fn test_manual_mode_stops_after_step() {
        let mut sink = Sink::default();
        let mut seq = scenario_a();
        seq.set_auto_mode(false, &mut sink);
        assert_eq!(seq.store().read("recipe.auto_mode").unwrap().as_str(), "false");

        seq.start(None, &mut sink).unwrap();
        run_countdown(&mut seq, &mut sink, 120);

        assert_eq!(seq.phase(), SequencerState::Idle);
        assert!(seq.done().contains(1));
        assert!(!seq.program().is_started());

        seq.start(None, &mut sink).unwrap();
        assert_eq!(seq.program().current_step(), 3);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut sink = Sink::default();
        let mut seq = scenario_a();
        seq.start(None, &mut sink).unwrap();
        assert!(seq.skip(&mut sink));

        seq.reset(&mut sink);
        let once = seq.snapshot();
        let writes = seq.store().writes;

        seq.stop(&mut sink);
        assert_eq!(seq.snapshot(), once);
        assert_eq!(seq.store().writes, writes);
        assert_eq!(once.phase, SequencerState::Idle);
        assert_eq!(once.remaining_s, 0);
        assert_eq!(once.statuses, [CompletionStatus::Wait; MAX_STEPS]);
    }

    #[test]
    fn test_recovery_restores_done_and_clears_run() {
        let mut sink = Sink::default();
        let mut seq = sequencer(&[
            ("step1.enabled", "true"),
            ("step1.status", "Done"),
            ("step2.enabled", "true"),
            ("step2.status", "Run"),
        ]);

        assert!(seq.done().contains(1));
        assert_eq!(seq.recipe().step(2).unwrap().status, CompletionStatus::Wait);

        seq.start(None, &mut sink).unwrap();
        assert_eq!(seq.program().current_step(), 2);
    }

    #[test]
    fn test_snapshot_fields() {
        let mut sink = Sink::default();
        let mut seq = scenario_a();
        seq.start(Some(1), &mut sink).unwrap();
        run_countdown(&mut seq, &mut sink, 5);

        let snapshot = seq.snapshot();
        assert_eq!(snapshot.current_step, 1);
        assert_eq!(snapshot.remaining_s, 115);
        assert_eq!(snapshot.elapsed_s, 5);
        assert_eq!(snapshot.statuses[0], CompletionStatus::Run);
        assert_eq!(snapshot.setpoint.unwrap().timing_mode, TimingMode::Run);
        assert!(snapshot.latest.is_none());
    }

    #[test]
    fn test_edit_goes_through_store() {
        let mut seq = scenario_a();
        let check = seq.edit(2, StepEdit::TargetRpm("150")).unwrap();
        assert_eq!(check, FieldCheck::Accepted);
        assert_eq!(seq.store().read("step2.target_rpm").unwrap().as_str(), "150");
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0).as_str(), "00:00:00");
        assert_eq!(format_hms(3725).as_str(), "01:02:05");
        assert_eq!(format_hms(99 * 3600 + 59 * 60).as_str(), "99:59:00");
    }

    proptest! {
        #[test]
        fn start_remaining_matches_duration(hours in 0i64..=99, minutes in 1i64..=59, number in 1u8..=8) {
            let mut sink = Sink::default();
            let mut seq = sequencer(&[]);
            let h = std::format!("{}", hours);
            let m = std::format!("{}", minutes);
            seq.edit(number, StepEdit::Enabled(true)).unwrap();
            seq.edit(number, StepEdit::DurationHours(&h)).unwrap();
            seq.edit(number, StepEdit::DurationMinutes(&m)).unwrap();

            seq.start(Some(number), &mut sink).unwrap();
            prop_assert_eq!(seq.program().remaining_s() as i64, hours * 3600 + minutes * 60);
        }

        #[test]
        fn next_step_is_always_lowest_pending(enabled in proptest::collection::vec(any::<bool>(), 8)) {
            let mut sink = Sink::default();
            let mut seq = sequencer(&[]);
            for (index, on) in enabled.iter().enumerate() {
                seq.edit(index as u8 + 1, StepEdit::Enabled(*on)).unwrap();
            }

            let expected: std::vec::Vec<u8> = (1..=8u8).filter(|n| enabled[*n as usize - 1]).collect();
            let mut visited = std::vec::Vec::new();
            if seq.start(None, &mut sink).is_ok() {
                visited.push(seq.program().current_step());
                while seq.skip(&mut sink) {
                    if seq.phase().is_active() {
                        visited.push(seq.program().current_step());
                    }
                }
            }
            prop_assert_eq!(visited, expected);
            prop_assert_eq!(seq.phase(), SequencerState::Idle);
        }

        #[test]
        fn reset_twice_equals_once(ticks in 0u32..300, skip in any::<bool>()) {
            let mut sink = Sink::default();
            let mut seq = scenario_a();
            seq.start(None, &mut sink).unwrap();
            run_countdown(&mut seq, &mut sink, ticks);
            if skip {
                seq.skip(&mut sink);
            }

            seq.reset(&mut sink);
            let once = seq.snapshot();
            seq.reset(&mut sink);
            prop_assert_eq!(seq.snapshot(), once);
            prop_assert!(seq.done().is_empty());
        }
    }
}
