//! Thermostat link
//!
//! Either a real serial port or an in-process simulated thermostat. Both
//! split into a [`Link`] for the transmit side and a blocking reader for the
//! receive thread.

pub mod receive;
pub mod serial;
pub mod sim;

use std::io::{self, Read};

use reactor_protocol::{Frame, FrameError, FrameSink, ThermostatCommand, UnitId};
use thiserror::Error;
use tracing::{info, trace, warn};

use crate::config::SerialConfig;

pub use receive::receive_loop;
pub use serial::SerialLink;
pub use sim::{SimLink, SimThermostat};

/// Link errors
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),
    #[error("link I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("cannot encode frame: {0}")]
    Frame(FrameError),
    #[error("simulated thermostat stopped")]
    Disconnected,
}

impl From<FrameError> for LinkError {
    fn from(e: FrameError) -> Self {
        LinkError::Frame(e)
    }
}

/// Transmit side of the thermostat link
pub enum Link {
    Serial(SerialLink),
    Sim(SimLink),
}

impl Link {
    /// Encode and send one command
    ///
    /// Failures are logged and not retried; the next activation or poll
    /// sends fresh values.
    pub fn send_command(&mut self, command: &ThermostatCommand) -> bool {
        let result = command
            .to_frame()
            .map_err(LinkError::from)
            .and_then(|frame| self.send(&frame));
        match result {
            Ok(()) => {
                trace!(command = command.name(), "Sent");
                true
            }
            Err(e) => {
                warn!(command = command.name(), error = %e, "Send failed");
                false
            }
        }
    }
}

impl FrameSink for Link {
    type Error = LinkError;

    fn send(&mut self, frame: &Frame) -> Result<(), LinkError> {
        match self {
            Link::Serial(link) => link.send(frame),
            Link::Sim(link) => link.send(frame),
        }
    }
}

/// Open the configured link
pub fn open(config: &SerialConfig, unit: UnitId) -> Result<(Link, Box<dyn Read + Send>), LinkError> {
    if config.is_simulated() {
        info!(?unit, "Using simulated thermostat");
        let (link, reader) = sim::connect(SimThermostat::new(unit));
        return Ok((Link::Sim(link), Box::new(reader)));
    }

    let (link, reader) = SerialLink::open(&config.port, config.baudrate)?;
    info!(port = %config.port, baudrate = config.baudrate, "Serial port open");
    Ok((Link::Serial(link), Box::new(reader)))
}
