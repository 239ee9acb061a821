//! Sensor samples

use core::fmt;

/// Readings beyond this magnitude (°C) are treated as sensor noise
pub const SENSOR_SANITY_LIMIT: f32 = 500.0;

/// Minimum number of values in a telemetry report (TR, TJ, RPM, probe)
pub const MIN_SAMPLE_VALUES: usize = 4;

/// Telemetry report could not be turned into a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataError {
    /// Report carried fewer values than a sample needs
    TooFewValues { got: usize },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::TooFewValues { got } => write!(
                f,
                "telemetry has {} values, need at least {}",
                got, MIN_SAMPLE_VALUES
            ),
        }
    }
}

/// Latest reading from the thermostat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    /// Reactor temperature (°C)
    pub tr: f32,
    /// Jacket temperature (°C)
    pub tj: f32,
    /// Stirrer speed
    pub rpm: f32,
    /// External probe
    pub probe: f32,
    /// Host time the report arrived
    pub timestamp_ms: u64,
}

impl SensorSample {
    /// Build a sample from telemetry values in device index order
    ///
    /// Extra values beyond the fourth are ignored.
    pub fn from_values(values: &[f32], timestamp_ms: u64) -> Result<Self, DataError> {
        match values {
            [tr, tj, rpm, probe, ..] => Ok(Self {
                tr: *tr,
                tj: *tj,
                rpm: *rpm,
                probe: *probe,
                timestamp_ms,
            }),
            _ => Err(DataError::TooFewValues { got: values.len() }),
        }
    }
}

/// True if a temperature reading is finite and within the sanity limit
pub fn is_plausible(celsius: f32) -> bool {
    celsius.is_finite() && (-SENSOR_SANITY_LIMIT..=SENSOR_SANITY_LIMIT).contains(&celsius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values_maps_indices() {
        let sample = SensorSample::from_values(&[51.0, 24.5, 300.0, 21.3, 9.9], 1200).unwrap();
        assert_eq!(sample.tr, 51.0);
        assert_eq!(sample.tj, 24.5);
        assert_eq!(sample.rpm, 300.0);
        assert_eq!(sample.probe, 21.3);
        assert_eq!(sample.timestamp_ms, 1200);
    }

    #[test]
    fn test_from_values_needs_four() {
        assert_eq!(
            SensorSample::from_values(&[1.0, 2.0, 3.0], 0),
            Err(DataError::TooFewValues { got: 3 })
        );
        assert_eq!(
            SensorSample::from_values(&[], 0),
            Err(DataError::TooFewValues { got: 0 })
        );
    }

    #[test]
    fn test_plausibility() {
        assert!(is_plausible(0.0));
        assert!(is_plausible(-500.0));
        assert!(is_plausible(500.0));
        assert!(!is_plausible(500.1));
        assert!(!is_plausible(-3276.8));
        assert!(!is_plausible(f32::NAN));
        assert!(!is_plausible(f32::INFINITY));
    }
}
