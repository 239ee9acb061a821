//! Telemetry reports from the thermostat
//!
//! A report is a flat list of big-endian i16 words in 0.1 units. The device
//! owns the index mapping (reactor temperature, jacket temperature, stirrer
//! speed, external probe, ...); this module only converts words to floats.

use heapless::Vec;

use crate::frame::{FrameError, MAX_PAYLOAD_SIZE};

/// Maximum number of values in one report
pub const MAX_TELEMETRY_VALUES: usize = MAX_PAYLOAD_SIZE / 2;

/// Decoded telemetry values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryReport {
    values: Vec<f32, MAX_TELEMETRY_VALUES>,
}

impl TelemetryReport {
    /// Decode a report payload
    ///
    /// An odd payload length means a truncated word and is rejected.
    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() % 2 != 0 {
            return Err(FrameError::InvalidFrame);
        }

        let mut values = Vec::new();
        for word in payload.chunks_exact(2) {
            let raw = i16::from_be_bytes([word[0], word[1]]);
            values
                .push(raw as f32 / 10.0)
                .map_err(|_| FrameError::PayloadTooLarge)?;
        }
        Ok(Self { values })
    }

    /// Encode values back into a payload (used by device simulators)
    pub fn encode(values: &[f32]) -> Result<Vec<u8, MAX_PAYLOAD_SIZE>, FrameError> {
        let mut payload = Vec::new();
        for &value in values {
            let scaled = value * 10.0;
            let rounded = if scaled >= 0.0 { scaled + 0.5 } else { scaled - 0.5 };
            payload
                .extend_from_slice(&(rounded as i16).to_be_bytes())
                .map_err(|_| FrameError::PayloadTooLarge)?;
        }
        Ok(payload)
    }

    /// Values in device index order
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}
