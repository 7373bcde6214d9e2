//! Hardware seams consumed by the core.

use crate::config::CHANNEL_COUNT;
use crate::frame::Frame;

/// Produces one raw converter reading per active channel for the current tick.
pub trait SampleSource {
    type Error;

    /// Fills `out[ch]` for every bit `ch` set in `mask`. Other slots are left
    /// as they were.
    fn sample(&mut self, mask: u16, out: &mut [u16; CHANNEL_COUNT]) -> Result<(), Self::Error>;
}

/// One non-blocking transmission attempt of a telemetry frame.
///
/// A failed attempt is not retried; the scheduler reports it and moves on.
pub trait FrameSink {
    type Error;

    fn try_send(&mut self, id: u16, frame: &Frame) -> Result<(), Self::Error>;
}
