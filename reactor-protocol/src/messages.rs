//! Message types for the thermostat link
//!
//! Host → device frames carry setpoints; device → host frames carry
//! telemetry. Multi-byte values are big-endian.

use crate::frame::{Frame, FrameError};
use crate::telemetry::TelemetryReport;

// Message type IDs: host → device
pub const MSG_THERMOSTAT_SELECT: u8 = 0x10;
pub const MSG_SET_TEMPERATURE: u8 = 0x11;
pub const MSG_SET_RPM: u8 = 0x12;
pub const MSG_SELECT_STIRRER: u8 = 0x13;
pub const MSG_READ_REQUEST: u8 = 0x14;

// Message type IDs: device → host
pub const MSG_TELEMETRY: u8 = 0x40;

/// Thermostat/stirrer unit on the shared link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitId {
    A,
    B,
}

impl UnitId {
    /// Wire value of the unit
    pub fn to_byte(self) -> u8 {
        match self {
            UnitId::A => 0x01,
            UnitId::B => 0x02,
        }
    }

    /// Parse a unit from its wire value
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(UnitId::A),
            0x02 => Some(UnitId::B),
            _ => None,
        }
    }
}

/// Stirrer mode sent with a stirrer selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StirrerCode {
    /// Stirrer motor released
    Off,
    /// Stirrer follows the RPM setpoint
    On,
}

impl StirrerCode {
    /// Stirrer mode for a given RPM setpoint
    pub fn for_rpm(rpm: u16) -> Self {
        if rpm > 0 {
            StirrerCode::On
        } else {
            StirrerCode::Off
        }
    }

    /// Wire value of the code
    pub fn to_byte(self) -> u8 {
        match self {
            StirrerCode::Off => 0x00,
            StirrerCode::On => 0x01,
        }
    }
}

/// Commands the host sends to the thermostat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermostatCommand {
    /// Choose the control channel of each unit (true = jacket, false = reactor)
    ThermostatSelect { a_is_tj: bool, b_is_tj: bool },
    /// Write a temperature setpoint slot (value ×10, two's complement)
    SetTemperature { step: u8, high: u8, low: u8 },
    /// Write an RPM setpoint slot
    SetRpm { step: u8, high: u8, low: u8 },
    /// Route stirrer control to a unit
    SelectStirrer { unit: UnitId, code: StirrerCode },
    /// Ask the device for a telemetry report
    ReadRequest,
}

impl ThermostatCommand {
    /// Encode this command into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match *self {
            ThermostatCommand::ThermostatSelect { a_is_tj, b_is_tj } => {
                build_thermostat_select(a_is_tj, b_is_tj)
            }
            ThermostatCommand::SetTemperature { step, high, low } => {
                build_set_temperature(step, high, low)
            }
            ThermostatCommand::SetRpm { step, high, low } => build_set_rpm(step, high, low),
            ThermostatCommand::SelectStirrer { unit, code } => build_select_stirrer(unit, code),
            ThermostatCommand::ReadRequest => Ok(build_read_request()),
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ThermostatCommand::ThermostatSelect { .. } => "thermostat-select",
            ThermostatCommand::SetTemperature { .. } => "set-temperature",
            ThermostatCommand::SetRpm { .. } => "set-rpm",
            ThermostatCommand::SelectStirrer { .. } => "select-stirrer",
            ThermostatCommand::ReadRequest => "read-request",
        }
    }
}

/// Build a thermostat channel selection frame for both units
pub fn build_thermostat_select(a_is_tj: bool, b_is_tj: bool) -> Result<Frame, FrameError> {
    Frame::new(MSG_THERMOSTAT_SELECT, &[a_is_tj as u8, b_is_tj as u8])
}

/// Build a temperature setpoint frame
pub fn build_set_temperature(step: u8, high: u8, low: u8) -> Result<Frame, FrameError> {
    Frame::new(MSG_SET_TEMPERATURE, &[step, high, low])
}

/// Build an RPM setpoint frame
pub fn build_set_rpm(step: u8, high: u8, low: u8) -> Result<Frame, FrameError> {
    Frame::new(MSG_SET_RPM, &[step, high, low])
}

/// Build a stirrer selection frame
pub fn build_select_stirrer(unit: UnitId, code: StirrerCode) -> Result<Frame, FrameError> {
    Frame::new(MSG_SELECT_STIRRER, &[unit.to_byte(), code.to_byte()])
}

/// Build a telemetry poll frame
pub fn build_read_request() -> Frame {
    Frame::empty(MSG_READ_REQUEST)
}

/// Split a temperature in °C into the high/low bytes of its ×10 value
///
/// Values outside the i16 range saturate; NaN encodes as 0.
pub fn temperature_bytes(celsius: f32) -> (u8, u8) {
    let scaled = celsius * 10.0;
    let rounded = if scaled >= 0.0 { scaled + 0.5 } else { scaled - 0.5 };
    // `as` saturates at the integer bounds and maps NaN to 0
    let [high, low] = (rounded as i16).to_be_bytes();
    (high, low)
}

/// Split an RPM setpoint into high/low bytes
pub fn rpm_bytes(rpm: u16) -> (u8, u8) {
    let [high, low] = rpm.to_be_bytes();
    (high, low)
}

/// Messages parsed from device-originated frames
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceMessage {
    /// Telemetry values in device index order
    Telemetry(TelemetryReport),
}

impl DeviceMessage {
    /// Parse a message from a received frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_TELEMETRY => TelemetryReport::decode(&frame.payload).map(DeviceMessage::Telemetry),
            _ => Err(FrameError::InvalidFrame),
        }
    }
}
