//! Sequencer task
//!
//! Single owner of the [`Controller`]. Commands, telemetry and both tick
//! sources are serialised through one select loop, so every sequencer
//! operation runs to completion before the next starts.

use embassy_futures::select::{select4, Either4};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_time::{Duration, Ticker};
use tracing::{info, trace, warn};

use reactor_core::scheduler::{SetpointPlan, COUNTDOWN_INTERVAL_MS, THRESHOLD_INTERVAL_MS};

use crate::channels::{
    COMMAND_CHANNEL, PLAN_CHANNEL, PROGRAM_SNAPSHOT, REPLY_CHANNEL, SAMPLE_SIGNAL, SNAPSHOT_UPDATE,
};
use crate::controller::Controller;

/// Sequencer task - processes commands, telemetry and ticks
#[embassy_executor::task]
pub async fn sequencer_task(mut controller: Controller) {
    info!("Sequencer task started");

    let mut threshold = Ticker::every(Duration::from_millis(THRESHOLD_INTERVAL_MS));
    let mut countdown = Ticker::every(Duration::from_millis(COUNTDOWN_INTERVAL_MS));
    let mut gates = controller.gates();

    publish(&controller).await;

    loop {
        match select4(
            COMMAND_CHANNEL.receive(),
            SAMPLE_SIGNAL.wait(),
            gated(&mut threshold, gates.threshold),
            gated(&mut countdown, gates.countdown),
        )
        .await
        {
            Either4::First(command) => {
                let reply = controller.handle(command);
                REPLY_CHANNEL.send(reply).await;
            }
            Either4::Second(batch) => {
                trace!(values = batch.report.values().len(), "Telemetry");
                controller.on_sample(&batch);
            }
            Either4::Third(()) => controller.threshold_tick(),
            Either4::Fourth(()) => controller.countdown_tick(),
        }

        for plan in controller.take_plans() {
            enqueue_plan(&PLAN_CHANNEL, plan);
        }

        // Count from the moment a tick source opens, not from boot
        let next = controller.gates();
        if next.threshold && !gates.threshold {
            threshold.reset();
        }
        if next.countdown && !gates.countdown {
            countdown.reset();
        }
        gates = next;

        publish(&controller).await;
    }
}

/// Wait for the next tick while `open`, forever otherwise
async fn gated(ticker: &mut Ticker, open: bool) {
    if open {
        ticker.next().await;
    } else {
        core::future::pending::<()>().await;
    }
}

/// Queue a plan for the transmit task without waiting
///
/// A full queue drops its oldest plan; the newest activation decides the
/// thermostat setpoints anyway.
fn enqueue_plan<M: RawMutex, const N: usize>(queue: &Channel<M, SetpointPlan, N>, plan: SetpointPlan) {
    let plan = match queue.try_send(plan) {
        Ok(()) => return,
        Err(TrySendError::Full(plan)) => plan,
    };
    if let Ok(stale) = queue.try_receive() {
        warn!(dropped = stale.step(), step = plan.step(), "Setpoint queue full, dropping oldest plan");
    }
    if let Err(TrySendError::Full(plan)) = queue.try_send(plan) {
        warn!(step = plan.step(), "Setpoint queue full, plan dropped");
    }
}

async fn publish(controller: &Controller) {
    let snapshot = controller.snapshot();
    let mut current = PROGRAM_SNAPSHOT.lock().await;
    if current.as_ref() != Some(&snapshot) {
        *current = Some(snapshot);
        SNAPSHOT_UPDATE.signal(());
    }
}
