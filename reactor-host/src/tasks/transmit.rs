//! Setpoint transmit task
//!
//! Sends each activation's commands in order, waiting the settle time after
//! every frame. The link lock is held for the whole plan so telemetry polls
//! cannot interleave with a setpoint sequence.

use core::future::Future;

use embassy_time::Timer;
use tracing::{debug, info};

use reactor_core::scheduler::SetpointPlan;
use reactor_protocol::ThermostatCommand;

use crate::channels::PLAN_CHANNEL;
use crate::tasks::SharedLink;

/// Transmit task - drains setpoint plans onto the link
#[embassy_executor::task]
pub async fn transmit_task(link: &'static SharedLink) {
    info!("Transmit task started");

    loop {
        let plan = PLAN_CHANNEL.receive().await;
        debug!(step = plan.step(), "Sending setpoints");

        let mut link = link.lock().await;
        let sent = send_plan(
            &plan,
            |command| link.send_command(command),
            |ms| Timer::after_millis(u64::from(ms)),
        )
        .await;
        info!(
            step = plan.step(),
            sent,
            total = plan.commands().len(),
            "Setpoints sent"
        );
    }
}

/// Send every command of `plan`, settling after each one whether or not it
/// went out. Returns how many sends succeeded.
async fn send_plan<S, D, F>(plan: &SetpointPlan, mut send: S, mut settle: D) -> usize
where
    S: FnMut(&ThermostatCommand) -> bool,
    D: FnMut(u32) -> F,
    F: Future<Output = ()>,
{
    let mut sent = 0;
    for paced in plan.commands() {
        if send(&paced.command) {
            sent += 1;
        }
        settle(paced.delay_after_ms).await;
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use embassy_futures::block_on;
    use reactor_core::config::{Step, TempChannel};
    use reactor_protocol::UnitId;

    #[derive(Debug, PartialEq)]
    enum Action {
        Send(&'static str),
        Settle(u32),
    }

    fn plan() -> SetpointPlan {
        SetpointPlan::for_step(2, &Step::default(), UnitId::A, TempChannel::Tr)
    }

    #[test]
    fn test_commands_are_paced_in_order() {
        let log = RefCell::new(Vec::new());
        let sent = block_on(send_plan(
            &plan(),
            |command| {
                log.borrow_mut().push(Action::Send(command.name()));
                true
            },
            |ms| {
                log.borrow_mut().push(Action::Settle(ms));
                core::future::ready(())
            },
        ));

        assert_eq!(sent, 4);
        assert_eq!(
            log.into_inner(),
            vec![
                Action::Send("thermostat-select"),
                Action::Settle(150),
                Action::Send("set-temperature"),
                Action::Settle(50),
                Action::Send("select-stirrer"),
                Action::Settle(100),
                Action::Send("set-rpm"),
                Action::Settle(50),
            ]
        );
    }

    #[test]
    fn test_failed_send_still_settles() {
        let settled = RefCell::new(0u32);
        let sent = block_on(send_plan(
            &plan(),
            |command| !matches!(command, ThermostatCommand::SetTemperature { .. }),
            |ms| {
                *settled.borrow_mut() += ms;
                core::future::ready(())
            },
        ));

        assert_eq!(sent, 3);
        assert_eq!(settled.into_inner(), plan().total_delay_ms());
    }
}
