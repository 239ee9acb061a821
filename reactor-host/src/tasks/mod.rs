//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod refresh;
pub mod sequencer;
pub mod transmit;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

use crate::link::Link;

pub use refresh::refresh_task;
pub use sequencer::sequencer_task;
pub use transmit::transmit_task;

/// Link shared by the transmit and refresh tasks
pub type SharedLink = Mutex<CriticalSectionRawMutex, Link>;
