//! Sequencer controller
//!
//! The controller owns the sequencer and its settings file. It turns
//! operator commands into sequencer calls, feeds it telemetry and ticks, and
//! collects the setpoint plans it emits for the transmit task.

use reactor_core::config::settings::parse_bool;
use reactor_core::config::{
    CompletionStatus, EditError, StepEdit, StepField, TempChannel, TimingMode,
};
use reactor_core::scheduler::{
    format_hms, ProgramObserver, ProgramSnapshot, ProgramState, Sequencer, SequencerSink,
    SetpointPlan, StatusObserver,
};
use reactor_core::state::SequencerState;
use tracing::{debug, info, trace, warn};

use crate::channels::{Command, Reply, SampleBatch};
use crate::config::{SettingsError, TomlSettings};

/// Which tick sources the sequencer currently needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickGates {
    pub threshold: bool,
    pub countdown: bool,
}

/// Sequencer effects on the host side
#[derive(Debug, Default)]
struct HostEffects {
    /// Plans waiting for the transmit task
    plans: Vec<SetpointPlan>,
}

impl ProgramObserver for HostEffects {
    fn program_changed(&mut self, state: &ProgramState) {
        trace!(
            step = state.current_step(),
            remaining = %format_hms(state.remaining_s()),
            paused = state.is_paused(),
            "Program changed"
        );
    }

    fn countdown_finished(&mut self, step: u8) {
        info!(step, "Countdown finished");
    }
}

impl StatusObserver for HostEffects {
    fn status_changed(&mut self, step: u8, status: CompletionStatus) {
        debug!(step, status = status.as_str(), "Lamp changed");
    }

    fn persist_failed(&mut self, step: u8) {
        if step == 0 {
            warn!("Failed to save recipe setting");
        } else {
            warn!(step, "Failed to save step status");
        }
    }
}

impl SequencerSink for HostEffects {
    fn dispatch(&mut self, plan: &SetpointPlan) {
        debug!(
            step = plan.step(),
            commands = plan.commands().len(),
            settle_ms = plan.total_delay_ms(),
            "Setpoint plan queued"
        );
        self.plans.push(plan.clone());
    }

    fn phase_changed(&mut self, from: SequencerState, to: SequencerState) {
        info!(from = from.as_str(), to = to.as_str(), "Phase changed");
    }
}

/// Host-side owner of the sequencer
pub struct Controller {
    sequencer: Sequencer<TomlSettings>,
    effects: HostEffects,
}

impl Controller {
    pub fn new(sequencer: Sequencer<TomlSettings>) -> Self {
        Self {
            sequencer,
            effects: HostEffects::default(),
        }
    }

    /// Process one operator command
    pub fn handle(&mut self, command: Command) -> Reply {
        debug!(?command, "Command");
        let fx = &mut self.effects;
        match command {
            Command::Start(step) => match self.sequencer.start(step, fx) {
                Ok(()) => Reply::Started(self.sequencer.program().current_step()),
                Err(e) => {
                    info!(error = %e, "Start rejected");
                    Reply::Rejected(e)
                }
            },
            Command::Pause => {
                if self.sequencer.pause(fx) {
                    Reply::Ok
                } else {
                    Reply::NotApplicable("nothing to pause")
                }
            }
            Command::Resume => {
                if self.sequencer.resume(fx) {
                    Reply::Ok
                } else {
                    Reply::NotApplicable("not paused")
                }
            }
            Command::Skip => {
                if self.sequencer.skip(fx) {
                    Reply::Ok
                } else {
                    Reply::NotApplicable("no step is running")
                }
            }
            Command::Stop => {
                self.sequencer.stop(fx);
                Reply::Ok
            }
            Command::Reset => {
                self.sequencer.reset(fx);
                Reply::Ok
            }
            Command::SetAutoMode(enabled) => {
                self.sequencer.set_auto_mode(enabled, fx);
                Reply::Ok
            }
            Command::SetPeerChannel(channel) => match self.sequencer.set_peer_channel(channel) {
                Ok(()) => Reply::Ok,
                Err(e) => Reply::EditFailed(e.to_string()),
            },
            Command::Edit { step, field, value } => self.edit(step, field, &value),
            Command::Status => Reply::Status(self.sequencer.snapshot()),
            Command::Shutdown => match self.shutdown() {
                Ok(()) => Reply::ShuttingDown,
                Err(e) => {
                    warn!(error = %e, "Failed to save settings on shutdown");
                    Reply::EditFailed(e.to_string())
                }
            },
        }
    }

    fn edit(&mut self, step: u8, field: StepField, value: &str) -> Reply {
        let edit = match step_edit(field, value) {
            Ok(edit) => edit,
            Err(why) => return Reply::EditFailed(why.to_string()),
        };
        match self.sequencer.edit(step, edit) {
            Ok(check) => {
                info!(step, field = field.name(), value, ?check, "Step edited");
                Reply::Edited(check)
            }
            Err(EditError::InvalidStep(n)) => Reply::EditFailed(format!("step {} does not exist", n)),
            Err(EditError::Store(e)) => {
                warn!(step, field = field.name(), error = %e, "Failed to save edit");
                Reply::EditFailed(e.to_string())
            }
        }
    }

    /// Take in a telemetry report; short reports are dropped
    pub fn on_sample(&mut self, batch: &SampleBatch) {
        if let Err(e) = self
            .sequencer
            .on_sample_received(batch.report.values(), batch.timestamp_ms)
        {
            trace!(error = %e, "Telemetry dropped");
        }
    }

    pub fn threshold_tick(&mut self) {
        if self.sequencer.threshold_tick(&mut self.effects) {
            info!(step = self.sequencer.program().current_step(), "Threshold reached");
        }
    }

    pub fn countdown_tick(&mut self) {
        self.sequencer.countdown_tick(&mut self.effects);
    }

    pub fn gates(&self) -> TickGates {
        TickGates {
            threshold: self.sequencer.wants_threshold_ticks(),
            countdown: self.sequencer.wants_countdown_ticks(),
        }
    }

    pub fn snapshot(&self) -> ProgramSnapshot {
        self.sequencer.snapshot()
    }

    /// Plans emitted since the last call, oldest first
    pub fn take_plans(&mut self) -> Vec<SetpointPlan> {
        core::mem::take(&mut self.effects.plans)
    }

    /// Write every recipe value back to the settings file
    pub fn shutdown(&mut self) -> Result<(), SettingsError> {
        self.sequencer.flush()?;
        self.sequencer.store().flush()?;
        info!(path = %self.sequencer.store().path().display(), "Settings saved");
        Ok(())
    }
}

/// Interpret operator text for a step field
fn step_edit(field: StepField, value: &str) -> Result<StepEdit<'_>, &'static str> {
    let edit = match field {
        StepField::Enabled => StepEdit::Enabled(parse_bool(value).ok_or("expected on or off")?),
        StepField::TargetTemperature => StepEdit::TargetTemperature(value),
        StepField::TargetChannel => {
            StepEdit::TargetChannel(TempChannel::parse(value.trim()).ok_or("expected TR or TJ")?)
        }
        StepField::TargetRpm => StepEdit::TargetRpm(value),
        StepField::DosingVolume => StepEdit::DosingVolume(value),
        StepField::DurationHours => StepEdit::DurationHours(value),
        StepField::DurationMinutes => StepEdit::DurationMinutes(value),
        StepField::TimingMode => {
            StepEdit::TimingMode(TimingMode::parse(value.trim()).ok_or("expected run or wait")?)
        }
        StepField::Status => return Err("status is set by the sequencer"),
    };
    Ok(edit)
}
