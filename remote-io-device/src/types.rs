//! Core types for the remote I/O device
//!
//! This module defines the fundamental types shared by every layer of the
//! device: pin roles, physical pin modes, the in-band error sentinels and the
//! library error type. Protocol paths never fail with `Err`; every bad input
//! degrades to an [`ErrorCode`] reply instead. [`DeviceError`] only covers the
//! non-protocol surfaces (configuration, host helpers, I/O).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of addressable pin slots in the bank.
///
/// Pin indices are protocol-visible: every opcode band is exactly this wide.
pub const BANK_SIZE: usize = 32;

/// Pin index type used throughout the device
pub type Pin = u8;

/// Result type for device operations
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Errors that can occur outside the wire protocol
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Pin {0} is outside the bank (0..{BANK_SIZE})")]
    PinOutOfRange(u16),
}

/// Role assigned to a pin by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinRole {
    /// Not configured; queries answer [`ErrorCode::PinUnassigned`]
    #[default]
    Unused,
    /// Plain digital input, sampled as 0/1
    DigitalInput,
    /// Digital input with internal pullup, sampled inverted (low = active = 1)
    DigitalInputPullup,
    /// Analog input, sampled raw and range-constrained on query
    AnalogInput,
    /// Output driven from the value store by the polling loop
    Output,
}

impl PinRole {
    /// Electrical mode the physical pin must be put in for this role
    pub fn pin_mode(&self) -> PinMode {
        match self {
            PinRole::Unused | PinRole::DigitalInput | PinRole::AnalogInput => PinMode::Input,
            PinRole::DigitalInputPullup => PinMode::InputPullup,
            PinRole::Output => PinMode::Output,
        }
    }
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinRole::Unused => write!(f, "UNUSED"),
            PinRole::DigitalInput => write!(f, "INPUT"),
            PinRole::DigitalInputPullup => write!(f, "INPUT_PULLUP"),
            PinRole::AnalogInput => write!(f, "INPUT_ANALOG"),
            PinRole::Output => write!(f, "OUTPUT"),
        }
    }
}

/// Electrical configuration of a physical pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PinMode {
    #[default]
    Input,
    InputPullup,
    Output,
}

/// In-band error sentinels, all in the reserved 240..=255 band
///
/// A reply carrying one of these values is the only error signal the host
/// ever sees. The host tells "value that happens to equal a sentinel" apart
/// from "error" only by knowing which opcode band it queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ErrorCode {
    /// Queried pin has no role
    PinUnassigned = 250,
    /// Queried pin is an output
    PinAssignedAsOutput = 251,
    /// Reserved; the 2-byte threshold makes it unreachable
    TooMuchData = 252,
    /// Outbound read with nothing queued
    EmptyQueue = 253,
    /// Opcode outside every band
    UnrecognisedCommand = 254,
    /// Reserved catch-all
    Undefined = 255,
}

impl ErrorCode {
    /// Lowest value of the reserved error band
    pub const BAND_START: u16 = 240;

    /// Wire value of this sentinel
    pub fn value(self) -> u16 {
        self as u16
    }

    /// Map a reply value back to a known sentinel, if any
    pub fn from_value(value: u16) -> Option<Self> {
        match value {
            250 => Some(ErrorCode::PinUnassigned),
            251 => Some(ErrorCode::PinAssignedAsOutput),
            252 => Some(ErrorCode::TooMuchData),
            253 => Some(ErrorCode::EmptyQueue),
            254 => Some(ErrorCode::UnrecognisedCommand),
            255 => Some(ErrorCode::Undefined),
            _ => None,
        }
    }

    /// True if `value` lies in the reserved error band
    pub fn is_reserved(value: u16) -> bool {
        (Self::BAND_START..=255).contains(&value)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::PinUnassigned => "PIN_UNASSIGNED",
            ErrorCode::PinAssignedAsOutput => "PIN_ASSIGNED_AS_OUTPUT",
            ErrorCode::TooMuchData => "TOO_MUCH_DATA",
            ErrorCode::EmptyQueue => "EMPTY_QUEUE",
            ErrorCode::UnrecognisedCommand => "UNRECOGNISED_COMMAND",
            ErrorCode::Undefined => "UNDEFINED_ERROR",
        };
        write!(f, "{}({})", name, self.value())
    }
}

/// Check a host-supplied pin index against the bank
pub fn checked_pin(pin: u16) -> Result<Pin> {
    if (pin as usize) < BANK_SIZE {
        Ok(pin as Pin)
    } else {
        Err(DeviceError::PinOutOfRange(pin))
    }
}
