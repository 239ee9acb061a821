//! Sensor intake
//!
//! Raw telemetry values become a [`SensorSample`]; the threshold detector
//! decides whether a threshold-gated step may start counting down.

pub mod sample;
pub mod threshold;

pub use sample::{is_plausible, DataError, SensorSample, MIN_SAMPLE_VALUES, SENSOR_SANITY_LIMIT};
pub use threshold::{channel_reading, evaluate, threshold_reached};
