//! Device configuration types
//!
//! One explicit configuration struct, handed to the dispatcher and the polling
//! loop at construction, replaces the scattered global flags a firmware image
//! would otherwise carry (verbosity, echo test, auto-ranging).

use crate::types::{DeviceError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default lower bound of the analog window
pub const DEFAULT_RANGE_MIN: i32 = 70;

/// Default upper bound of the analog window
pub const DEFAULT_RANGE_MAX: i32 = 600;

/// Top-level dispatch mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Decode and execute every opcode
    #[default]
    Normal,
    /// Answer every frame with its own value; nothing executes
    Echo,
}

/// Configuration for a device instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Bus address the device answers on (deployment constant, logged only)
    #[serde(default = "default_bus_address")]
    pub bus_address: u8,

    /// Polling loop period in milliseconds
    #[serde(default = "default_poll_period")]
    pub poll_period_ms: u64,

    /// Dispatch mode (normal or echo test)
    #[serde(default)]
    pub mode: DispatchMode,

    /// Whether auto-ranging starts enabled
    #[serde(default = "default_true")]
    pub auto_range: bool,

    /// Whether analog queries are rendered into 0..=255
    #[serde(default = "default_true")]
    pub constrain_analog: bool,

    /// Default analog window minimum
    #[serde(default = "default_range_min")]
    pub range_min: i32,

    /// Default analog window maximum
    #[serde(default = "default_range_max")]
    pub range_max: i32,

    /// Log every polling pass at debug level instead of trace
    #[serde(default)]
    pub verbose: bool,
}

fn default_true() -> bool {
    true
}

fn default_bus_address() -> u8 {
    0x08
}

fn default_poll_period() -> u64 {
    50
}

fn default_range_min() -> i32 {
    DEFAULT_RANGE_MIN
}

fn default_range_max() -> i32 {
    DEFAULT_RANGE_MAX
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            bus_address: default_bus_address(),
            poll_period_ms: default_poll_period(),
            mode: DispatchMode::Normal,
            auto_range: true,
            constrain_analog: true,
            range_min: DEFAULT_RANGE_MIN,
            range_max: DEFAULT_RANGE_MAX,
            verbose: false,
        }
    }
}

impl DeviceConfig {
    /// Create a new device configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the bus address
    pub fn with_bus_address(mut self, address: u8) -> Self {
        self.bus_address = address;
        self
    }

    /// Builder method: set the polling period in milliseconds
    pub fn with_poll_period_ms(mut self, period_ms: u64) -> Self {
        self.poll_period_ms = period_ms;
        self
    }

    /// Builder method: select the dispatch mode
    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder method: enable or disable auto-ranging at startup
    pub fn with_auto_range(mut self, enabled: bool) -> Self {
        self.auto_range = enabled;
        self
    }

    /// Builder method: enable or disable analog constraining on query
    pub fn with_constrain_analog(mut self, enabled: bool) -> Self {
        self.constrain_analog = enabled;
        self
    }

    /// Builder method: set the default analog window
    pub fn with_range(mut self, min: i32, max: i32) -> Self {
        self.range_min = min;
        self.range_max = max;
        self
    }

    /// Builder method: verbose per-pass logging
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Polling period as a `Duration`
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    /// Reject configurations the device cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.poll_period_ms == 0 {
            return Err(DeviceError::InvalidConfig(
                "poll_period_ms must be greater than zero".to_string(),
            ));
        }
        if self.range_min < 0 {
            return Err(DeviceError::InvalidConfig(format!(
                "range_min must not be negative, got {}",
                self.range_min
            )));
        }
        if self.range_max <= 0 || self.range_max > i32::from(u16::MAX) {
            return Err(DeviceError::InvalidConfig(format!(
                "range_max must be within 1..={}, got {}",
                u16::MAX,
                self.range_max
            )));
        }
        if self.range_min > self.range_max {
            return Err(DeviceError::InvalidConfig(format!(
                "range_min ({}) is above range_max ({})",
                self.range_min, self.range_max
            )));
        }
        Ok(())
    }
}
