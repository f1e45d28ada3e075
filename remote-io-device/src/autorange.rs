//! Analog auto-range tracker
//!
//! Maintains the calibration window used to scale raw analog samples into an
//! 8-bit reply. One window is shared by every analog pin.
//!
//! ## Scaling
//!
//! `constrain` divides by the raw `max` bound, not by the `max - min` span:
//!
//! ```text
//! clamp(((value - min) / max) * 255, 0, 255)
//! ```
//!
//! Hosts in the field are calibrated against this curve, so it is kept as-is.
//! The result is truncated toward zero.

use serde::{Deserialize, Serialize};

/// Snapshot of the analog window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogRange {
    pub min: i32,
    pub max: i32,
    pub auto_range: bool,
}

/// Tracks and applies the analog window
#[derive(Debug, Clone)]
pub struct AutoRangeTracker {
    range: AnalogRange,
    default_min: i32,
    default_max: i32,
}

impl AutoRangeTracker {
    /// Create a tracker primed with the default window
    pub fn new(default_min: i32, default_max: i32, auto_range: bool) -> Self {
        Self {
            range: AnalogRange {
                min: default_min,
                max: default_max,
                auto_range,
            },
            default_min,
            default_max,
        }
    }

    /// Widen the window to include `sample`, if auto-ranging is on
    pub fn observe(&mut self, sample: i32) {
        if !self.range.auto_range {
            return;
        }
        if sample < self.range.min {
            log::trace!("Analog min widened {} -> {}", self.range.min, sample);
            self.range.min = sample;
        }
        if sample > self.range.max {
            log::trace!("Analog max widened {} -> {}", self.range.max, sample);
            self.range.max = sample;
        }
    }

    /// Scale a raw sample into 0..=255 using the current window
    pub fn constrain(&self, value: i32) -> u8 {
        let scaled = ((value as f32 - self.range.min as f32) / self.range.max as f32) * 255.0;
        // NaN (0/0) casts to 0 and +/-inf saturate, so a zero max never panics.
        if scaled.is_nan() {
            return 0;
        }
        scaled.clamp(0.0, 255.0) as u8
    }

    /// Restore the default window; the auto-range flag is untouched
    pub fn reset(&mut self) {
        self.range.min = self.default_min;
        self.range.max = self.default_max;
    }

    /// Turn tracking on or off. Always re-primes the default window.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.range.auto_range = enabled;
        self.reset();
        log::debug!(
            "Auto-ranging {} (window {}..{})",
            if enabled { "enabled" } else { "disabled" },
            self.range.min,
            self.range.max
        );
    }

    pub fn min(&self) -> i32 {
        self.range.min
    }

    pub fn max(&self) -> i32 {
        self.range.max
    }

    /// Copy of the current window
    pub fn range(&self) -> AnalogRange {
        self.range
    }
}
