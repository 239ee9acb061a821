//! Receive side of the link
//!
//! Runs on a dedicated thread: blocking reads, frame parsing, and delivery
//! of each telemetry report to a callback.

use std::io::{self, Read};

use reactor_protocol::{DeviceMessage, FrameParser, TelemetryReport};
use tracing::{info, trace, warn};

/// Buffer size for link reads
const RX_BUF_SIZE: usize = 64;

/// Read until end of stream, delivering telemetry reports
///
/// Read timeouts mean no data yet. Malformed frames are logged and skipped.
pub fn receive_loop(mut reader: impl Read, mut deliver: impl FnMut(TelemetryReport)) {
    info!("Link receive loop started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => {
                info!("Link closed");
                return;
            }
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                continue;
            }
            Err(e) => {
                warn!(error = %e, "Link read failed");
                return;
            }
        };
        trace!("RX: {} bytes", n);

        for &byte in &buf[..n] {
            match parser.feed(byte) {
                Ok(Some(frame)) => match DeviceMessage::from_frame(&frame) {
                    Ok(DeviceMessage::Telemetry(report)) => deliver(report),
                    Err(e) => warn!(msg_type = frame.msg_type, error = %e, "Unexpected frame"),
                },
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Frame parse error"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactor_protocol::messages::MSG_TELEMETRY;
    use reactor_protocol::Frame;
    use std::io::Cursor;

    fn telemetry_bytes(values: &[f32]) -> Vec<u8> {
        let payload = TelemetryReport::encode(values).unwrap();
        Frame::new(MSG_TELEMETRY, &payload)
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    #[test]
    fn test_delivers_each_report() {
        let mut stream = telemetry_bytes(&[21.5, 30.0, 120.0, 21.4]);
        stream.extend(telemetry_bytes(&[22.0, 31.0, 150.0, 21.9]));

        let mut reports = Vec::new();
        receive_loop(Cursor::new(stream), |report| reports.push(report));

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].values(), &[22.0, 31.0, 150.0, 21.9]);
    }

    #[test]
    fn test_skips_noise_and_bad_frames() {
        let mut stream = vec![0x00, 0x13, 0x37];
        let mut corrupt = telemetry_bytes(&[1.0, 2.0, 3.0, 4.0]);
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0xFF;
        stream.extend(corrupt);
        stream.extend(telemetry_bytes(&[5.0, 6.0, 7.0, 8.0]));

        let mut reports = Vec::new();
        receive_loop(Cursor::new(stream), |report| reports.push(report));

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].values(), &[5.0, 6.0, 7.0, 8.0]);
    }
}
