//! Serial port link

use std::io::Write;
use std::time::Duration;

use reactor_protocol::{Frame, FrameSink};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use super::LinkError;

/// Read timeout; the receive loop treats a timeout as "no data yet"
const READ_TIMEOUT_MS: u64 = 100;

/// Write half of an open serial port
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Open `name` at 8N1 without flow control
    ///
    /// Returns the link and a cloned handle for the receive thread.
    pub fn open(name: &str, baudrate: u32) -> Result<(Self, Box<dyn SerialPort>), LinkError> {
        let port = serialport::new(name, baudrate)
            .data_bits(DataBits::Eight)
            .flow_control(FlowControl::None)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()?;
        port.clear(serialport::ClearBuffer::All)?;
        let reader = port.try_clone()?;
        Ok((Self { port }, reader))
    }
}

impl FrameSink for SerialLink {
    type Error = LinkError;

    fn send(&mut self, frame: &Frame) -> Result<(), LinkError> {
        self.port.write_all(&frame.to_bytes())?;
        self.port.flush()?;
        Ok(())
    }
}
