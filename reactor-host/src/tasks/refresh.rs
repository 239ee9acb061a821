//! Telemetry poll and status log
//!
//! Asks the thermostat for a report every [`REFRESH_INTERVAL_MS`] and logs
//! the program snapshot whenever it changed.

use embassy_time::{Duration, Ticker};
use tracing::{debug, info};

use reactor_core::scheduler::format_hms;
use reactor_protocol::ThermostatCommand;

use crate::channels::{PROGRAM_SNAPSHOT, SNAPSHOT_UPDATE};
use crate::tasks::SharedLink;

/// Telemetry poll period
pub const REFRESH_INTERVAL_MS: u64 = 500;

/// Refresh task - polls telemetry
#[embassy_executor::task]
pub async fn refresh_task(link: &'static SharedLink) {
    info!("Refresh task started");

    let mut ticker = Ticker::every(Duration::from_millis(REFRESH_INTERVAL_MS));

    loop {
        ticker.next().await;

        link.lock().await.send_command(&ThermostatCommand::ReadRequest);

        if SNAPSHOT_UPDATE.signaled() {
            SNAPSHOT_UPDATE.reset();
            if let Some(s) = *PROGRAM_SNAPSHOT.lock().await {
                debug!(
                    step = s.current_step,
                    phase = s.phase.as_str(),
                    remaining = %format_hms(s.remaining_s),
                    elapsed = %format_hms(s.elapsed_s),
                    paused = s.is_paused,
                    tr = ?s.latest.map(|sample| sample.tr),
                    tj = ?s.latest.map(|sample| sample.tj),
                    "Program"
                );
            }
        }
    }
}
