//! Threshold detection for threshold-gated steps

use super::sample::{is_plausible, SensorSample};
use crate::config::{Step, TempChannel};

/// Reading on the channel a step regulates on
pub fn channel_reading(channel: TempChannel, sample: &SensorSample) -> f32 {
    match channel {
        TempChannel::Tj => sample.tj,
        TempChannel::Tr => sample.tr,
    }
}

/// True once the step's channel has reached its target temperature
///
/// Noise readings never satisfy the threshold.
pub fn threshold_reached(step: &Step, sample: &SensorSample) -> bool {
    let reading = channel_reading(step.target_channel, sample);
    is_plausible(reading) && reading >= step.target_temperature
}

/// Evaluate against the latest sample, if any arrived yet
pub fn evaluate(step: &Step, latest: Option<&SensorSample>) -> bool {
    latest.is_some_and(|sample| threshold_reached(step, sample))
}
