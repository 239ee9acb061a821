//! Inter-task communication channels
//!
//! Static embassy-sync primitives shared between the executor tasks and the
//! blocking threads (link receive, console).

use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use heapless::String;

use reactor_core::config::settings::MAX_VALUE_LEN;
use reactor_core::config::{FieldCheck, StepField, TempChannel};
use reactor_core::scheduler::{format_hms, ProgramSnapshot, SetpointPlan};
use reactor_core::ConfigurationError;
use reactor_protocol::TelemetryReport;

/// Channel capacity for operator commands
const COMMAND_CHANNEL_SIZE: usize = 8;

/// Channel capacity for setpoint plans awaiting transmission
const PLAN_CHANNEL_SIZE: usize = 4;

/// Operator commands, processed in order by the sequencer task
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start a step, or the first pending one
    Start(Option<u8>),
    Pause,
    Resume,
    Stop,
    Reset,
    Skip,
    SetAutoMode(bool),
    SetPeerChannel(TempChannel),
    /// Edit one step field from operator text
    Edit {
        step: u8,
        field: StepField,
        value: String<MAX_VALUE_LEN>,
    },
    Status,
    /// Flush settings and exit
    Shutdown,
}

/// Answer to exactly one [`Command`]
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok,
    Started(u8),
    /// Command has no effect in the current phase
    NotApplicable(&'static str),
    Rejected(ConfigurationError),
    Edited(FieldCheck),
    EditFailed(std::string::String),
    Status(ProgramSnapshot),
    ShuttingDown,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("ok"),
            Reply::Started(step) => write!(f, "step {} started", step),
            Reply::NotApplicable(why) => write!(f, "ignored: {}", why),
            Reply::Rejected(e) => write!(f, "cannot start: {}", e),
            Reply::Edited(FieldCheck::Accepted) => f.write_str("saved"),
            Reply::Edited(FieldCheck::Flagged(e)) => write!(f, "saved, but {}", e),
            Reply::EditFailed(why) => write!(f, "not saved: {}", why),
            Reply::Status(s) => {
                write!(
                    f,
                    "step {} {} remaining {} elapsed {}{}{}",
                    s.current_step,
                    s.phase.as_str(),
                    format_hms(s.remaining_s),
                    format_hms(s.elapsed_s),
                    if s.is_paused { " (paused)" } else { "" },
                    if s.auto_mode { "" } else { " [manual]" },
                )?;
                f.write_str("\nlamps:")?;
                for (index, status) in s.statuses.iter().enumerate() {
                    write!(f, " {}={}", index + 1, status.as_str())?;
                }
                if let Some(sample) = s.latest {
                    write!(
                        f,
                        "\nTR {:.1} TJ {:.1} RPM {:.0} probe {:.1}",
                        sample.tr, sample.tj, sample.rpm, sample.probe
                    )?;
                }
                Ok(())
            }
            Reply::ShuttingDown => f.write_str("settings saved, bye"),
        }
    }
}

/// Telemetry values with their arrival time
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBatch {
    pub report: TelemetryReport,
    pub timestamp_ms: u64,
}

/// Operator commands (console thread -> sequencer task)
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Replies (sequencer task -> console thread)
pub static REPLY_CHANNEL: Channel<CriticalSectionRawMutex, Reply, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Latest telemetry (link receive thread -> sequencer task), latest wins
pub static SAMPLE_SIGNAL: Signal<CriticalSectionRawMutex, SampleBatch> = Signal::new();

/// Setpoint plans (sequencer task -> transmit task)
pub static PLAN_CHANNEL: Channel<CriticalSectionRawMutex, SetpointPlan, PLAN_CHANNEL_SIZE> =
    Channel::new();

/// Latest program snapshot, `None` until the sequencer task starts
pub static PROGRAM_SNAPSHOT: Mutex<CriticalSectionRawMutex, Option<ProgramSnapshot>> =
    Mutex::new(None);

/// Set whenever [`PROGRAM_SNAPSHOT`] changes
pub static SNAPSHOT_UPDATE: Signal<CriticalSectionRawMutex, ()> = Signal::new();
