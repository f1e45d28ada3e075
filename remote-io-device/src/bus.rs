//! Bus plumbing
//!
//! The device never initiates a transfer. The transport calls
//! [`BusHandler::on_receive`] for inbound bytes and
//! [`BusHandler::on_request`] once per host read. On the host side,
//! [`Transport`] is the two-call view of the same exchange.
//!
//! [`LoopbackBus`] wires a host straight into a device's assembler in-process,
//! delivering each request byte with its own receive callback, the way a
//! host that writes one byte per bus transaction does.

use crate::assembler::TransactionAssembler;
use crate::frame::{self, Frame};
use crate::hal::PinDriver;
use crate::types::Result;
use std::sync::{Arc, Mutex, MutexGuard};

/// Device side of the bus: the two callbacks a transport invokes
pub trait BusHandler {
    /// Inbound bytes from the host (normally one or two per call).
    fn on_receive(&mut self, bytes: &[u8]);

    /// Host read; must return without blocking.
    fn on_request(&mut self) -> Frame;
}

impl<D: PinDriver> BusHandler for TransactionAssembler<D> {
    fn on_receive(&mut self, bytes: &[u8]) {
        self.receive(bytes);
    }

    fn on_request(&mut self) -> Frame {
        self.request()
    }
}

/// Host side of the bus
pub trait Transport {
    /// Send one request frame.
    fn write_frame(&mut self, value: u16) -> Result<()>;

    /// Read one reply frame.
    fn read_frame(&mut self) -> Result<u16>;
}

/// In-process bus between a host and a device handler
pub struct LoopbackBus<H> {
    handler: Arc<Mutex<H>>,
}

impl<H> Clone for LoopbackBus<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H: BusHandler> LoopbackBus<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(Mutex::new(handler)),
        }
    }

    fn handler(&self) -> MutexGuard<'_, H> {
        match self.handler.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Access the device-side handler directly
    pub fn with_handler<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.handler())
    }
}

impl<H: BusHandler> Transport for LoopbackBus<H> {
    fn write_frame(&mut self, value: u16) -> Result<()> {
        let mut handler = self.handler();
        for byte in frame::encode(value) {
            handler.on_receive(&[byte]);
        }
        Ok(())
    }

    fn read_frame(&mut self) -> Result<u16> {
        let reply = self.handler().on_request();
        Ok(u16::from_le_bytes(reply))
    }
}
