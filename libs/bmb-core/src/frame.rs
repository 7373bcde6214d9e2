//! Telemetry frame encoding.
//!
//! ```text
//! byte0: bits[7:4] battery, bits[3:0] cell
//! byte1: average bits[15:8]
//! byte2: average bits[7:0]
//! ```

use core::fmt;

use crate::cell::CellId;

pub const FRAME_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame([u8; FRAME_LEN]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    Length(usize),
    Identity(u8),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Length(len) => write!(f, "expected {FRAME_LEN} bytes, got {len}"),
            FrameError::Identity(byte) => write!(f, "no cell with identity byte {byte:#04x}"),
        }
    }
}

pub fn encode(cell: CellId, average: u16) -> Frame {
    let [hi, lo] = average.to_be_bytes();
    Frame([cell.nibbles(), hi, lo])
}

/// Narrows the 32-bit accumulator to the 16-bit wire code.
///
/// Averages of 12-bit samples never exceed 4095; anything wider saturates.
pub fn wire_code(average: u32) -> u16 {
    u16::try_from(average).unwrap_or(u16::MAX)
}

impl Frame {
    pub const fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    pub fn decode(bytes: &[u8]) -> Result<(CellId, u16), FrameError> {
        let &[id, hi, lo] = bytes else {
            return Err(FrameError::Length(bytes.len()));
        };
        let cell = CellId::from_nibbles(id).ok_or(FrameError::Identity(id))?;
        Ok((cell, u16::from_be_bytes([hi, lo])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_cell_of_second_battery() {
        let frame = encode(CellId::new(1, 5).unwrap(), 0xABCD);
        assert_eq!(frame.as_bytes(), &[0x15, 0xAB, 0xCD]);
    }

    #[test]
    fn first_cell_zero_voltage() {
        let frame = encode(CellId::new(0, 0).unwrap(), 0x0000);
        assert_eq!(frame.as_bytes(), &[0x00, 0x00, 0x00]);
    }

    #[test]
    fn decode_reads_back_identity_and_code() {
        let cell = CellId::new(0, 4).unwrap();
        let frame = encode(cell, 3071);
        assert_eq!(Frame::decode(frame.as_bytes()), Ok((cell, 3071)));
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert_eq!(Frame::decode(&[0x01, 0x02]), Err(FrameError::Length(2)));
        assert_eq!(
            Frame::decode(&[0x26, 0x00, 0x00]),
            Err(FrameError::Identity(0x26))
        );
    }

    #[test]
    fn wire_code_saturates() {
        assert_eq!(wire_code(4095), 4095);
        assert_eq!(wire_code(0x1_0000), u16::MAX);
    }
}
