//! Thermostat Serial Protocol
//!
//! This crate defines the frames exchanged between the reactor host and the
//! thermostat/stirrer controller over a serial link. The host sends setpoint
//! commands; the device answers read requests with telemetry reports.
//!
//! # Frame Layout
//!
//! ```text
//! ┌───────┬────────┬──────┬─────────────┬──────────┐
//! │ START │ LENGTH │ TYPE │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 1B     │ 1B   │ 0–32B       │ 1B       │
//! └───────┴────────┴──────┴─────────────┴──────────┘
//! ```
//!
//! Command builders mirror the device's command set one-to-one; the host
//! decides ordering and pacing between frames.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod frame;
pub mod link;
pub mod messages;
pub mod telemetry;

pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use link::FrameSink;
pub use messages::{
    build_read_request, build_select_stirrer, build_set_rpm, build_set_temperature,
    build_thermostat_select, rpm_bytes, temperature_bytes, DeviceMessage, StirrerCode,
    ThermostatCommand, UnitId,
};
pub use telemetry::{TelemetryReport, MAX_TELEMETRY_VALUES};
