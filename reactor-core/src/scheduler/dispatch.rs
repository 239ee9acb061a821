//! Setpoint dispatch plan
//!
//! Activating a step sends four commands to the thermostat. The device needs
//! settling time between them, so each command carries the delay to wait
//! after it goes out. The transmit side does the waiting.

use heapless::Vec;
use reactor_protocol::{rpm_bytes, temperature_bytes, StirrerCode, ThermostatCommand, UnitId};

use crate::config::{Step, TempChannel};

/// Settle time after switching the control channel
pub const CHANNEL_SELECT_SETTLE_MS: u32 = 150;
/// Settle time after writing the temperature setpoint
pub const TEMPERATURE_SETTLE_MS: u32 = 50;
/// Settle time after routing the stirrer
pub const STIRRER_SELECT_SETTLE_MS: u32 = 100;
/// Settle time after writing the RPM setpoint
pub const RPM_SETTLE_MS: u32 = 50;

/// Commands per activation
pub const PLAN_LEN: usize = 4;

/// A command and the pause that must follow it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacedCommand {
    pub command: ThermostatCommand,
    pub delay_after_ms: u32,
}

/// Ordered commands for one step activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetpointPlan {
    step: u8,
    commands: Vec<PacedCommand, PLAN_LEN>,
}

impl SetpointPlan {
    /// Build the plan for activating `number`
    ///
    /// The channel selection frame covers both units, so the peer unit's
    /// current channel is repeated unchanged.
    pub fn for_step(number: u8, step: &Step, unit: UnitId, peer_channel: TempChannel) -> Self {
        let own = step.target_channel.is_jacket();
        let peer = peer_channel.is_jacket();
        let (a_is_tj, b_is_tj) = match unit {
            UnitId::A => (own, peer),
            UnitId::B => (peer, own),
        };
        let (temp_high, temp_low) = temperature_bytes(step.target_temperature);
        let (rpm_high, rpm_low) = rpm_bytes(step.target_rpm);

        let mut commands = Vec::new();
        for paced in [
            PacedCommand {
                command: ThermostatCommand::ThermostatSelect { a_is_tj, b_is_tj },
                delay_after_ms: CHANNEL_SELECT_SETTLE_MS,
            },
            PacedCommand {
                command: ThermostatCommand::SetTemperature {
                    step: number,
                    high: temp_high,
                    low: temp_low,
                },
                delay_after_ms: TEMPERATURE_SETTLE_MS,
            },
            PacedCommand {
                command: ThermostatCommand::SelectStirrer {
                    unit,
                    code: StirrerCode::for_rpm(step.target_rpm),
                },
                delay_after_ms: STIRRER_SELECT_SETTLE_MS,
            },
            PacedCommand {
                command: ThermostatCommand::SetRpm {
                    step: number,
                    high: rpm_high,
                    low: rpm_low,
                },
                delay_after_ms: RPM_SETTLE_MS,
            },
        ] {
            // Capacity matches the list above
            let _ = commands.push(paced);
        }

        Self {
            step: number,
            commands,
        }
    }

    /// Step this plan activates
    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn commands(&self) -> &[PacedCommand] {
        &self.commands
    }

    /// Time the whole plan takes to send
    pub fn total_delay_ms(&self) -> u32 {
        self.commands.iter().map(|c| c.delay_after_ms).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jacket_step() -> Step {
        Step {
            enabled: true,
            target_temperature: 65.5,
            target_channel: TempChannel::Tj,
            target_rpm: 300,
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_order_and_pacing() {
        let plan = SetpointPlan::for_step(3, &jacket_step(), UnitId::A, TempChannel::Tr);
        let commands = plan.commands();

        assert_eq!(plan.step(), 3);
        assert_eq!(commands.len(), 4);
        assert_eq!(
            commands[0].command,
            ThermostatCommand::ThermostatSelect {
                a_is_tj: true,
                b_is_tj: false
            }
        );
        assert_eq!(
            commands[1].command,
            ThermostatCommand::SetTemperature {
                step: 3,
                high: 0x02,
                low: 0x8F
            }
        );
        assert_eq!(
            commands[2].command,
            ThermostatCommand::SelectStirrer {
                unit: UnitId::A,
                code: StirrerCode::On
            }
        );
        assert_eq!(
            commands[3].command,
            ThermostatCommand::SetRpm {
                step: 3,
                high: 0x01,
                low: 0x2C
            }
        );

        let delays: [u32; 4] = core::array::from_fn(|i| commands[i].delay_after_ms);
        assert_eq!(delays, [150, 50, 100, 50]);
        assert_eq!(plan.total_delay_ms(), 350);
    }

    #[test]
    fn test_unit_b_keeps_peer_channel() {
        let plan = SetpointPlan::for_step(1, &jacket_step(), UnitId::B, TempChannel::Tj);
        assert_eq!(
            plan.commands()[0].command,
            ThermostatCommand::ThermostatSelect {
                a_is_tj: true,
                b_is_tj: true
            }
        );

        let step = Step {
            target_channel: TempChannel::Tr,
            ..jacket_step()
        };
        let plan = SetpointPlan::for_step(1, &step, UnitId::B, TempChannel::Tj);
        assert_eq!(
            plan.commands()[0].command,
            ThermostatCommand::ThermostatSelect {
                a_is_tj: true,
                b_is_tj: false
            }
        );
    }

    #[test]
    fn test_zero_rpm_releases_stirrer() {
        let step = Step {
            target_rpm: 0,
            ..jacket_step()
        };
        let plan = SetpointPlan::for_step(2, &step, UnitId::A, TempChannel::Tr);
        assert_eq!(
            plan.commands()[2].command,
            ThermostatCommand::SelectStirrer {
                unit: UnitId::A,
                code: StirrerCode::Off
            }
        );
    }
}
