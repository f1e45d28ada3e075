//! Transaction byte assembler
//!
//! The bus delivers request bytes one callback at a time and asks for reply
//! bytes on a separate callback. The assembler sits between the two:
//!
//! ```text
//!  byte ──▶ Collecting(0) ──byte──▶ Collecting(1) ──byte──▶ dispatch ──▶ Complete
//!                ▲                                                        │
//!                └────────────────────── outbound read ◀──────────────────┘
//! ```
//!
//! - Two buffered bytes form a little-endian opcode; the input buffer is
//!   cleared and the dispatcher runs *synchronously*, before the receive
//!   callback returns. A reply is therefore always ready before the host's
//!   matching read.
//! - A new reply replaces any unread one.
//! - An outbound read drains the whole output buffer. With nothing queued the
//!   host gets the `EmptyQueue` sentinel.

use crate::device::Device;
use crate::dispatcher::Dispatcher;
use crate::frame::{self, Frame, FRAME_LEN};
use crate::hal::PinDriver;
use crate::types::ErrorCode;

/// Observable state of the assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// Waiting for request bytes; holds how many are buffered (0 or 1)
    Collecting(usize),
    /// A reply is queued and no new request has started
    Complete,
}

/// Builds request frames from single bytes and queues the replies
pub struct TransactionAssembler<D> {
    device: Device<D>,
    dispatcher: Dispatcher<D>,
    input: Vec<u8>,
    output: Vec<u8>,
}

impl<D: PinDriver> TransactionAssembler<D> {
    pub fn new(device: Device<D>) -> Self {
        let dispatcher = Dispatcher::new(device.clone());
        Self {
            device,
            dispatcher,
            input: Vec::with_capacity(FRAME_LEN),
            output: Vec::with_capacity(FRAME_LEN),
        }
    }

    /// Receive callback: buffer each byte, dispatching on every second one
    ///
    /// Bursts longer than a frame are not an error: they are consumed two bytes
    /// at a time and only the last reply survives.
    pub fn receive(&mut self, bytes: &[u8]) {
        log::trace!("Received {} byte(s): {:02X?}", bytes.len(), bytes);
        for &byte in bytes {
            self.input.push(byte);
            if self.input.len() >= FRAME_LEN {
                self.complete_frame();
            }
        }
    }

    fn complete_frame(&mut self) {
        let Some(opcode) = frame::decode(&self.input[..FRAME_LEN]) else {
            return;
        };
        self.input.clear();
        self.device
            .with_state(|state| state.request_count = state.request_count.wrapping_add(1));

        let reply = self.dispatcher.handle(opcode);
        if reply.clear_buffers {
            log::debug!("Clearing transaction buffers");
            self.input.clear();
            self.output.clear();
        }
        if !self.output.is_empty() {
            log::debug!("Discarding unread reply {:02X?}", self.output);
        }

        self.output.clear();
        self.output.extend_from_slice(&frame::encode(reply.value));
    }

    /// Request callback: drain the queued reply, low byte first
    pub fn request(&mut self) -> Frame {
        if self.output.is_empty() {
            log::debug!("Outbound read with empty queue");
            return frame::encode(ErrorCode::EmptyQueue.value());
        }

        let mut reply = [0u8; FRAME_LEN];
        for (slot, byte) in reply.iter_mut().zip(self.output.drain(..)) {
            *slot = byte;
        }
        log::trace!("Sending {:02X?}", reply);
        reply
    }

    /// Current state of the transaction
    pub fn state(&self) -> AssemblerState {
        if self.input.is_empty() && !self.output.is_empty() {
            AssemblerState::Complete
        } else {
            AssemblerState::Collecting(self.input.len())
        }
    }

    /// Bytes of a partially received request
    pub fn pending_input(&self) -> &[u8] {
        &self.input
    }

    /// Bytes queued for the next outbound read
    pub fn pending_output(&self) -> &[u8] {
        &self.output
    }

    /// Handle to the device this assembler serves
    pub fn device(&self) -> &Device<D> {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use crate::hal::SimulatedPins;

    fn assembler() -> TransactionAssembler<SimulatedPins> {
        let device = Device::new(SimulatedPins::new(), DeviceConfig::new()).unwrap();
        TransactionAssembler::new(device)
    }

    #[test]
    fn test_frame_needs_two_bytes() {
        let mut asm = assembler();
        assert_eq!(asm.state(), AssemblerState::Collecting(0));

        asm.receive(&[224]);
        assert_eq!(asm.state(), AssemblerState::Collecting(1));
        assert!(asm.pending_output().is_empty());

        asm.receive(&[0]);
        assert_eq!(asm.state(), AssemblerState::Complete);
        assert_eq!(asm.request(), [224, 0]);
        assert_eq!(asm.state(), AssemblerState::Collecting(0));
    }

    #[test]
    fn test_low_byte_first() {
        let mut asm = assembler();
        // 0x00E2 = 226 (request count) arrives as E2 00
        asm.receive(&[0xE2, 0x00]);
        assert_eq!(asm.request(), [1, 0]);
    }

    #[test]
    fn test_empty_read_yields_sentinel() {
        let mut asm = assembler();
        assert_eq!(asm.request(), [ErrorCode::EmptyQueue.value() as u8, 0]);

        asm.receive(&[224, 0]);
        asm.request();
        // Each read fully drains; the next one is empty again.
        assert_eq!(asm.request(), [253, 0]);
    }

    #[test]
    fn test_new_reply_replaces_unread_one() {
        let mut asm = assembler();
        asm.receive(&[224, 0]);
        asm.receive(&[236, 0]);
        assert_eq!(asm.request(), [ErrorCode::UnrecognisedCommand.value() as u8, 0]);
        assert_eq!(asm.request(), [253, 0]);
    }

    #[test]
    fn test_long_burst_is_split_into_frames() {
        let mut asm = assembler();
        asm.receive(&[131, 0, 195, 0, 7]);
        assert_eq!(asm.pending_input(), &[7]);
        assert_eq!(asm.request(), [1, 0]);
        assert_eq!(asm.device().request_count(), 2);
    }

    #[test]
    fn test_request_counter_counts_frames() {
        let mut asm = assembler();
        asm.receive(&[225, 0]);
        asm.request();
        for _ in 0..3 {
            asm.receive(&[224, 0]);
            asm.request();
        }
        asm.receive(&[226, 0]);
        // The reset frame itself counted before the reset ran.
        assert_eq!(asm.request(), [4, 0]);
    }

    #[test]
    fn test_clear_buffers() {
        let mut asm = assembler();
        asm.receive(&[229, 0]);
        assert_eq!(asm.request(), [0, 0]);
        assert_eq!(asm.state(), AssemblerState::Collecting(0));
    }

    #[test]
    fn test_clear_buffers_drops_unread_reply() {
        let mut asm = assembler();
        asm.receive(&[224, 0]);
        assert_eq!(asm.pending_output(), &[224, 0]);

        asm.receive(&[229, 0]);
        assert_eq!(asm.pending_output(), &[0, 0]);
        assert_eq!(asm.request(), [0, 0]);
        assert_eq!(asm.request(), [ErrorCode::EmptyQueue.value() as u8, 0]);

        // A byte arriving after the clear starts the next frame.
        asm.receive(&[224, 0, 229, 0, 7]);
        assert_eq!(asm.pending_input(), &[7]);
        assert_eq!(asm.state(), AssemblerState::Collecting(1));
        assert_eq!(asm.request(), [0, 0]);
    }

    #[test]
    fn test_high_byte_is_part_of_opcode() {
        let mut asm = assembler();
        asm.receive(&[0, 1]); // 256
        assert_eq!(asm.request(), [ErrorCode::UnrecognisedCommand.value() as u8, 0]);
    }
}
