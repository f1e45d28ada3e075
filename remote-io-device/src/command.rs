//! Command model
//!
//! The 16-bit opcode space is split into fixed bands, each [`BANK_SIZE`] wide
//! for the per-pin families, followed by individually enumerated control
//! opcodes and the reserved error band. An opcode is decoded once into a
//! [`Command`]; the dispatcher only ever matches on the enum.
//!
//! | Range    | Command                                |
//! |----------|----------------------------------------|
//! | 0–31     | query pin value                        |
//! | 32–63    | assign digital input                   |
//! | 64–95    | assign digital input with pullup       |
//! | 96–127   | assign analog input                    |
//! | 128–159  | assign output                          |
//! | 160–191  | drive pin LOW                          |
//! | 192–223  | drive pin HIGH                         |
//! | 224–233  | control opcodes (see [`Command`])      |
//! | 240–255  | error band, answered unchanged         |
//! | other    | unrecognised                           |

use crate::types::{ErrorCode, Pin, PinRole, BANK_SIZE};
use std::fmt;

const BAND: u16 = BANK_SIZE as u16;

pub const QUERY_BASE: u16 = 0;
pub const ASSIGN_INPUT_BASE: u16 = QUERY_BASE + BAND;
pub const ASSIGN_PULLUP_BASE: u16 = ASSIGN_INPUT_BASE + BAND;
pub const ASSIGN_ANALOG_BASE: u16 = ASSIGN_PULLUP_BASE + BAND;
pub const ASSIGN_OUTPUT_BASE: u16 = ASSIGN_ANALOG_BASE + BAND;
pub const WRITE_LOW_BASE: u16 = ASSIGN_OUTPUT_BASE + BAND;
pub const WRITE_HIGH_BASE: u16 = WRITE_LOW_BASE + BAND;

pub const OP_ECHO: u16 = 224;
pub const OP_RESET_REQUEST_COUNT: u16 = 225;
pub const OP_REQUEST_COUNT: u16 = 226;
pub const OP_RESET_LOOP_COUNT: u16 = 227;
pub const OP_LOOP_COUNT: u16 = 228;
pub const OP_CLEAR_BUFFERS: u16 = 229;
pub const OP_RANGE_MIN: u16 = 230;
pub const OP_RANGE_MAX: u16 = 231;
pub const OP_AUTO_RANGE_OFF: u16 = 232;
pub const OP_AUTO_RANGE_ON: u16 = 233;

/// A decoded request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Report the stored value of a pin
    QueryPin(Pin),
    /// Give a pin a role
    Assign(Pin, PinRole),
    /// Drive a pin directly, ignoring its role and the value store
    WritePin(Pin, bool),
    /// Answer with the opcode itself
    Echo,
    ResetRequestCount,
    RequestCount,
    ResetLoopCount,
    LoopCount,
    /// Drop both assembler buffers
    ClearBuffers,
    RangeMin,
    RangeMax,
    /// Switch auto-ranging; always re-primes the window
    SetAutoRange(bool),
    /// Opcode in the reserved error band, answered unchanged
    ErrorBand(u16),
    /// Anything else
    Unrecognised(u16),
}

impl Command {
    /// Decode an opcode using the band table
    pub fn decode(opcode: u16) -> Self {
        // Offset inside a band always fits in a pin index.
        let pin = |base: u16| (opcode - base) as Pin;

        match opcode {
            0..=31 => Command::QueryPin(pin(QUERY_BASE)),
            32..=63 => Command::Assign(pin(ASSIGN_INPUT_BASE), PinRole::DigitalInput),
            64..=95 => Command::Assign(pin(ASSIGN_PULLUP_BASE), PinRole::DigitalInputPullup),
            96..=127 => Command::Assign(pin(ASSIGN_ANALOG_BASE), PinRole::AnalogInput),
            128..=159 => Command::Assign(pin(ASSIGN_OUTPUT_BASE), PinRole::Output),
            160..=191 => Command::WritePin(pin(WRITE_LOW_BASE), false),
            192..=223 => Command::WritePin(pin(WRITE_HIGH_BASE), true),
            OP_ECHO => Command::Echo,
            OP_RESET_REQUEST_COUNT => Command::ResetRequestCount,
            OP_REQUEST_COUNT => Command::RequestCount,
            OP_RESET_LOOP_COUNT => Command::ResetLoopCount,
            OP_LOOP_COUNT => Command::LoopCount,
            OP_CLEAR_BUFFERS => Command::ClearBuffers,
            OP_RANGE_MIN => Command::RangeMin,
            OP_RANGE_MAX => Command::RangeMax,
            OP_AUTO_RANGE_OFF => Command::SetAutoRange(false),
            OP_AUTO_RANGE_ON => Command::SetAutoRange(true),
            code if ErrorCode::is_reserved(code) => Command::ErrorBand(code),
            _ => Command::Unrecognised(opcode),
        }
    }

    /// Encode back into the opcode the host sends
    ///
    /// `None` for `Assign(_, Unused)`: no opcode un-assigns a single pin.
    pub fn opcode(&self) -> Option<u16> {
        let opcode = match *self {
            Command::QueryPin(pin) => QUERY_BASE + pin as u16,
            Command::Assign(pin, role) => {
                let base = match role {
                    PinRole::DigitalInput => ASSIGN_INPUT_BASE,
                    PinRole::DigitalInputPullup => ASSIGN_PULLUP_BASE,
                    PinRole::AnalogInput => ASSIGN_ANALOG_BASE,
                    PinRole::Output => ASSIGN_OUTPUT_BASE,
                    PinRole::Unused => return None,
                };
                base + pin as u16
            }
            Command::WritePin(pin, false) => WRITE_LOW_BASE + pin as u16,
            Command::WritePin(pin, true) => WRITE_HIGH_BASE + pin as u16,
            Command::Echo => OP_ECHO,
            Command::ResetRequestCount => OP_RESET_REQUEST_COUNT,
            Command::RequestCount => OP_REQUEST_COUNT,
            Command::ResetLoopCount => OP_RESET_LOOP_COUNT,
            Command::LoopCount => OP_LOOP_COUNT,
            Command::ClearBuffers => OP_CLEAR_BUFFERS,
            Command::RangeMin => OP_RANGE_MIN,
            Command::RangeMax => OP_RANGE_MAX,
            Command::SetAutoRange(false) => OP_AUTO_RANGE_OFF,
            Command::SetAutoRange(true) => OP_AUTO_RANGE_ON,
            Command::ErrorBand(code) | Command::Unrecognised(code) => code,
        };
        Some(opcode)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::QueryPin(pin) => write!(f, "QUERY pin {}", pin),
            Command::Assign(pin, role) => write!(f, "ASSIGN pin {} as {}", pin, role),
            Command::WritePin(pin, high) => {
                write!(f, "WRITE pin {} {}", pin, if *high { "HIGH" } else { "LOW" })
            }
            Command::Echo => write!(f, "ECHO"),
            Command::ResetRequestCount => write!(f, "RESET REQUEST COUNT"),
            Command::RequestCount => write!(f, "REQUEST COUNT"),
            Command::ResetLoopCount => write!(f, "RESET LOOP COUNT"),
            Command::LoopCount => write!(f, "LOOP COUNT"),
            Command::ClearBuffers => write!(f, "CLEAR BUFFERS"),
            Command::RangeMin => write!(f, "ANALOG MIN"),
            Command::RangeMax => write!(f, "ANALOG MAX"),
            Command::SetAutoRange(on) => {
                write!(f, "AUTO-RANGE {}", if *on { "ON" } else { "OFF" })
            }
            Command::ErrorBand(code) => write!(f, "ERROR PROBE {}", code),
            Command::Unrecognised(code) => write!(f, "UNRECOGNISED {}", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        assert_eq!(Command::decode(0), Command::QueryPin(0));
        assert_eq!(Command::decode(31), Command::QueryPin(31));
        assert_eq!(Command::decode(32), Command::Assign(0, PinRole::DigitalInput));
        assert_eq!(Command::decode(95), Command::Assign(31, PinRole::DigitalInputPullup));
        assert_eq!(Command::decode(96), Command::Assign(0, PinRole::AnalogInput));
        assert_eq!(Command::decode(131), Command::Assign(3, PinRole::Output));
        assert_eq!(Command::decode(160), Command::WritePin(0, false));
        assert_eq!(Command::decode(191), Command::WritePin(31, false));
        assert_eq!(Command::decode(195), Command::WritePin(3, true));
        assert_eq!(Command::decode(223), Command::WritePin(31, true));
    }

    #[test]
    fn test_control_opcodes() {
        assert_eq!(Command::decode(224), Command::Echo);
        assert_eq!(Command::decode(229), Command::ClearBuffers);
        assert_eq!(Command::decode(232), Command::SetAutoRange(false));
        assert_eq!(Command::decode(233), Command::SetAutoRange(true));
    }

    #[test]
    fn test_gap_and_error_band() {
        for opcode in 234..=239 {
            assert_eq!(Command::decode(opcode), Command::Unrecognised(opcode));
        }
        for opcode in 240..=255 {
            assert_eq!(Command::decode(opcode), Command::ErrorBand(opcode));
        }
        assert_eq!(Command::decode(256), Command::Unrecognised(256));
        assert_eq!(Command::decode(0xFFFF), Command::Unrecognised(0xFFFF));
    }

    #[test]
    fn test_opcode_for_host_helpers() {
        assert_eq!(Command::Assign(5, PinRole::Output).opcode(), Some(133));
        assert_eq!(Command::Assign(8, PinRole::AnalogInput).opcode(), Some(104));
        assert_eq!(Command::WritePin(5, false).opcode(), Some(165));
        assert_eq!(Command::RangeMax.opcode(), Some(231));
    }

    #[test]
    fn test_unassign_has_no_opcode() {
        assert_eq!(Command::Assign(3, PinRole::Unused).opcode(), None);
        // And no opcode decodes to it.
        for opcode in 0..=u16::from(u8::MAX) {
            assert!(!matches!(Command::decode(opcode), Command::Assign(_, PinRole::Unused)));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::decode(131).to_string(), "ASSIGN pin 3 as OUTPUT");
        assert_eq!(Command::decode(195).to_string(), "WRITE pin 3 HIGH");
    }
}
