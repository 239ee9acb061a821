//! Outbound side of the serial link

use crate::frame::Frame;

/// Something that can put a frame on the wire
///
/// Implementations send the whole frame or fail; callers decide whether a
/// failure matters. The sequencing core never retries.
pub trait FrameSink {
    /// Error type for send operations
    type Error: core::fmt::Debug;

    /// Encode and write one frame
    fn send(&mut self, frame: &Frame) -> Result<(), Self::Error>;
}
