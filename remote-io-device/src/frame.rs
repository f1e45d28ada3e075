//! Two-byte transaction frames
//!
//! Every request and every reply on the wire is exactly two bytes, low byte
//! first. There is no checksum and no length prefix.

use byteorder::{ByteOrder, LittleEndian};

/// Size of a transaction frame in bytes
pub const FRAME_LEN: usize = 2;

/// A frame as it travels on the wire
pub type Frame = [u8; FRAME_LEN];

/// Split a 16-bit value into a wire frame (low byte first)
pub fn encode(value: u16) -> Frame {
    let mut frame = [0u8; FRAME_LEN];
    LittleEndian::write_u16(&mut frame, value);
    frame
}

/// Join a wire frame back into a 16-bit value
///
/// Returns `None` unless exactly [`FRAME_LEN`] bytes are given.
pub fn decode(bytes: &[u8]) -> Option<u16> {
    if bytes.len() != FRAME_LEN {
        return None;
    }
    Some(LittleEndian::read_u16(bytes))
}
