//! Command dispatcher
//!
//! Turns one completed request frame into one 16-bit reply. Each command runs
//! inside a single critical section on the shared device state, so a reply
//! never mixes state from before and after a polling step on the same pin.

use crate::command::{Command, OP_ECHO};
use crate::config::DispatchMode;
use crate::device::{Device, DeviceState};
use crate::hal::PinDriver;
use crate::types::{ErrorCode, PinRole};

/// Result of dispatching one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    /// Value to place in the output buffer
    pub value: u16,
    /// The assembler must drop its buffers before queuing `value`
    pub clear_buffers: bool,
}

impl Reply {
    fn value(value: u16) -> Self {
        Self {
            value,
            clear_buffers: false,
        }
    }

    /// Stored values are `i32`; the wire carries `u16`, clamped at both ends
    fn saturating(value: i32) -> Self {
        Self::value(u16::try_from(value.max(0)).unwrap_or(u16::MAX))
    }

    fn error(code: ErrorCode) -> Self {
        Self::value(code.value())
    }
}

/// Executes decoded commands against the shared device state
pub struct Dispatcher<D> {
    device: Device<D>,
    mode: DispatchMode,
    constrain_analog: bool,
}

impl<D: PinDriver> Dispatcher<D> {
    /// Create a dispatcher; mode and analog rendering come from the device config
    pub fn new(device: Device<D>) -> Self {
        let config = device.config();
        let (mode, constrain_analog) = (config.mode, config.constrain_analog);
        Self {
            device,
            mode,
            constrain_analog,
        }
    }

    /// Map an opcode to its reply value
    pub fn dispatch(&self, opcode: u16) -> u16 {
        self.handle(opcode).value
    }

    /// Map an opcode to its full reply, including side effects on the bus
    pub fn handle(&self, opcode: u16) -> Reply {
        if self.mode == DispatchMode::Echo {
            log::debug!("Echo mode: {} -> {}", opcode, opcode);
            return Reply::value(opcode);
        }

        let command = Command::decode(opcode);
        let reply = self.execute(command);
        log::debug!("{} (opcode {}) -> {}", command, opcode, reply.value);
        reply
    }

    /// Execute an already-decoded command
    pub fn execute(&self, command: Command) -> Reply {
        self.device
            .with_state(|state| Self::apply(state, command, self.constrain_analog))
    }

    fn apply(state: &mut DeviceState<D>, command: Command, constrain_analog: bool) -> Reply {
        match command {
            Command::QueryPin(pin) => Self::query(state, pin, constrain_analog),
            Command::Assign(pin, role) => {
                state.assign(pin, role);
                Reply::value(pin as u16)
            }
            Command::WritePin(pin, high) => {
                // Bypasses both the role table and the value store.
                state.driver.digital_write(pin, high);
                Reply::value(high as u16)
            }
            Command::Echo => Reply::value(OP_ECHO),
            Command::ResetRequestCount => {
                state.request_count = 0;
                Reply::value(0)
            }
            Command::RequestCount => Reply::value(state.request_count as u16),
            Command::ResetLoopCount => {
                state.loop_count = 0;
                Reply::value(0)
            }
            Command::LoopCount => Reply::value(state.loop_count as u16),
            Command::ClearBuffers => Reply {
                value: 0,
                clear_buffers: true,
            },
            Command::RangeMin => Reply::saturating(state.tracker.min()),
            Command::RangeMax => Reply::saturating(state.tracker.max()),
            Command::SetAutoRange(enabled) => {
                state.tracker.set_enabled(enabled);
                Reply::value(enabled as u16)
            }
            Command::ErrorBand(code) => Reply::value(code),
            Command::Unrecognised(opcode) => {
                log::warn!("Unrecognised command: {}", opcode);
                Reply::error(ErrorCode::UnrecognisedCommand)
            }
        }
    }

    fn query(state: &DeviceState<D>, pin: u8, constrain_analog: bool) -> Reply {
        let value = state.values.get(pin);
        match state.roles.role(pin) {
            PinRole::Unused => Reply::error(ErrorCode::PinUnassigned),
            PinRole::Output => Reply::error(ErrorCode::PinAssignedAsOutput),
            // Pullup inputs were already inverted when sampled.
            PinRole::DigitalInput | PinRole::DigitalInputPullup => Reply::saturating(value),
            PinRole::AnalogInput if constrain_analog => {
                Reply::value(state.tracker.constrain(value) as u16)
            }
            PinRole::AnalogInput => Reply::saturating(value),
        }
    }
}
