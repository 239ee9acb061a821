//! Simulated thermostat
//!
//! Stands in for the device when `serial.port = "sim"`. It applies setpoint
//! frames, advances a first-order thermal model on every read request and
//! answers with a telemetry frame.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, Sender};

use reactor_protocol::messages::{
    MSG_READ_REQUEST, MSG_SELECT_STIRRER, MSG_SET_RPM, MSG_SET_TEMPERATURE, MSG_THERMOSTAT_SELECT,
    MSG_TELEMETRY,
};
use reactor_protocol::{Frame, FrameError, FrameSink, TelemetryReport, UnitId};
use tracing::{debug, trace};

use super::LinkError;

/// Starting temperature of both channels
const AMBIENT_C: f32 = 20.0;
/// Largest jacket temperature change per poll
const JACKET_STEP_C: f32 = 1.0;
/// Fraction of the jacket/reactor gap closed per poll
const REACTOR_COUPLING: f32 = 0.2;
/// Largest stirrer speed change per poll
const RPM_STEP: f32 = 50.0;

/// Thermal and stirrer model of one unit
#[derive(Debug, Clone, PartialEq)]
pub struct SimThermostat {
    unit: UnitId,
    jacket_control: bool,
    target_c: f32,
    stirrer_on: bool,
    rpm_target: f32,
    tr: f32,
    tj: f32,
    rpm: f32,
}

impl SimThermostat {
    pub fn new(unit: UnitId) -> Self {
        Self {
            unit,
            jacket_control: false,
            target_c: AMBIENT_C,
            stirrer_on: false,
            rpm_target: 0.0,
            tr: AMBIENT_C,
            tj: AMBIENT_C,
            rpm: 0.0,
        }
    }

    /// Reactor and jacket temperatures
    pub fn temperatures(&self) -> (f32, f32) {
        (self.tr, self.tj)
    }

    pub fn rpm(&self) -> f32 {
        self.rpm
    }

    /// Apply one host frame; read requests produce a reply
    pub fn handle(&mut self, frame: &Frame) -> Result<Option<Frame>, FrameError> {
        let payload = &frame.payload[..];
        match (frame.msg_type, payload) {
            (MSG_THERMOSTAT_SELECT, [a_is_tj, b_is_tj]) => {
                self.jacket_control = match self.unit {
                    UnitId::A => *a_is_tj != 0,
                    UnitId::B => *b_is_tj != 0,
                };
                debug!(jacket = self.jacket_control, "Sim: channel selected");
            }
            (MSG_SET_TEMPERATURE, [_, high, low]) => {
                self.target_c = f32::from(i16::from_be_bytes([*high, *low])) / 10.0;
                debug!(target = self.target_c, "Sim: temperature setpoint");
            }
            (MSG_SELECT_STIRRER, [unit, code]) => {
                if UnitId::from_byte(*unit) == Some(self.unit) {
                    self.stirrer_on = *code != 0;
                }
            }
            (MSG_SET_RPM, [_, high, low]) => {
                self.rpm_target = f32::from(u16::from_be_bytes([*high, *low]));
            }
            (MSG_READ_REQUEST, []) => {
                self.advance();
                return self.report().map(Some);
            }
            _ => return Err(FrameError::InvalidFrame),
        }
        Ok(None)
    }

    fn advance(&mut self) {
        let jacket_goal = if self.jacket_control {
            self.target_c
        } else {
            // Overdrive the jacket to pull the reactor in
            self.target_c + (self.target_c - self.tr)
        };
        self.tj = approach(self.tj, jacket_goal, JACKET_STEP_C);
        self.tr += (self.tj - self.tr) * REACTOR_COUPLING;

        let rpm_goal = if self.stirrer_on { self.rpm_target } else { 0.0 };
        self.rpm = approach(self.rpm, rpm_goal, RPM_STEP);
        trace!(tr = self.tr, tj = self.tj, rpm = self.rpm, "Sim: advanced");
    }

    fn report(&self) -> Result<Frame, FrameError> {
        let payload = TelemetryReport::encode(&[self.tr, self.tj, self.rpm, self.tr])?;
        Frame::new(MSG_TELEMETRY, &payload)
    }
}

fn approach(current: f32, goal: f32, max_step: f32) -> f32 {
    current + (goal - current).clamp(-max_step, max_step)
}

/// Transmit side of the simulated link
pub struct SimLink {
    model: SimThermostat,
    replies: Sender<Vec<u8>>,
}

impl FrameSink for SimLink {
    type Error = LinkError;

    fn send(&mut self, frame: &Frame) -> Result<(), LinkError> {
        if let Some(reply) = self.model.handle(frame)? {
            self.replies
                .send(reply.to_bytes().to_vec())
                .map_err(|_| LinkError::Disconnected)?;
        }
        Ok(())
    }
}

/// Receive side of the simulated link, a byte stream of reply frames
///
/// Reads block until a reply arrives; end of stream once the link is gone.
pub struct SimReader {
    replies: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
}

impl Read for SimReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.replies.recv() {
                Ok(bytes) => self.pending.extend(bytes),
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

/// Connect a model to a link/reader pair
pub fn connect(model: SimThermostat) -> (SimLink, SimReader) {
    let (replies, rx) = mpsc::channel();
    (
        SimLink { model, replies },
        SimReader {
            replies: rx,
            pending: VecDeque::new(),
        },
    )
}
