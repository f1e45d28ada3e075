//! Physical pin access
//!
//! The device core never touches hardware directly. Everything goes through
//! [`PinDriver`], which a board support layer implements for its GPIO/ADC
//! peripherals. [`SimulatedPins`] is an in-memory implementation used by the
//! tests and by the host harness.

use crate::types::{Pin, PinMode, BANK_SIZE};

/// Hardware abstraction for the pin bank
///
/// Implementations must tolerate out-of-range pin indices (ignore writes,
/// read as low / zero); the core keeps indices in range by construction.
pub trait PinDriver: Send {
    /// Reconfigure the electrical mode of a pin.
    fn set_mode(&mut self, pin: Pin, mode: PinMode);

    /// Read the logic level of a pin. `true` is HIGH.
    fn digital_read(&mut self, pin: Pin) -> bool;

    /// Drive a pin HIGH (`true`) or LOW (`false`).
    fn digital_write(&mut self, pin: Pin, high: bool);

    /// Read a raw ADC sample from a pin (10-bit on the reference board).
    fn analog_read(&mut self, pin: Pin) -> u16;
}

/// Largest raw sample a 10-bit converter produces
pub const ADC_MAX_RAW: u16 = (1 << 10) - 1;

#[derive(Debug, Clone, Copy, Default)]
struct SimPin {
    mode: PinMode,
    /// Level forced onto the pin from outside (button, sensor)
    external: Option<bool>,
    /// Level the device last drove
    driven: bool,
    analog: u16,
    writes: u32,
}

/// In-memory pin bank
///
/// Stimulus is applied with [`set_level`](Self::set_level) and
/// [`set_analog`](Self::set_analog); what the device did to its pins is
/// observed with [`mode`](Self::mode), [`output_level`](Self::output_level)
/// and [`write_count`](Self::write_count).
#[derive(Debug, Clone)]
pub struct SimulatedPins {
    pins: [SimPin; BANK_SIZE],
}

impl SimulatedPins {
    /// Create a bank with every pin floating in input mode
    pub fn new() -> Self {
        Self {
            pins: [SimPin::default(); BANK_SIZE],
        }
    }

    fn slot(&self, pin: Pin) -> Option<&SimPin> {
        self.pins.get(pin as usize)
    }

    fn slot_mut(&mut self, pin: Pin) -> Option<&mut SimPin> {
        self.pins.get_mut(pin as usize)
    }

    /// Force an external logic level onto a pin
    pub fn set_level(&mut self, pin: Pin, high: bool) {
        if let Some(slot) = self.slot_mut(pin) {
            slot.external = Some(high);
        }
    }

    /// Set the voltage seen by the converter on a pin, as a raw sample
    pub fn set_analog(&mut self, pin: Pin, raw: u16) {
        if let Some(slot) = self.slot_mut(pin) {
            slot.analog = raw.min(ADC_MAX_RAW);
        }
    }

    /// Current electrical mode of a pin
    pub fn mode(&self, pin: Pin) -> PinMode {
        self.slot(pin).map(|s| s.mode).unwrap_or_default()
    }

    /// Level the device is driving on a pin (false unless in output mode)
    pub fn output_level(&self, pin: Pin) -> bool {
        self.slot(pin)
            .map(|s| s.mode == PinMode::Output && s.driven)
            .unwrap_or(false)
    }

    /// Number of digital writes issued to a pin
    pub fn write_count(&self, pin: Pin) -> u32 {
        self.slot(pin).map(|s| s.writes).unwrap_or(0)
    }
}

impl Default for SimulatedPins {
    fn default() -> Self {
        Self::new()
    }
}

impl PinDriver for SimulatedPins {
    fn set_mode(&mut self, pin: Pin, mode: PinMode) {
        if let Some(slot) = self.slot_mut(pin) {
            slot.mode = mode;
        }
    }

    fn digital_read(&mut self, pin: Pin) -> bool {
        match self.slot(pin) {
            Some(slot) => match (slot.external, slot.mode) {
                (Some(level), _) => level,
                (None, PinMode::InputPullup) => true,
                (None, PinMode::Output) => slot.driven,
                (None, PinMode::Input) => false,
            },
            None => false,
        }
    }

    fn digital_write(&mut self, pin: Pin, high: bool) {
        if let Some(slot) = self.slot_mut(pin) {
            slot.driven = high;
            slot.writes = slot.writes.wrapping_add(1);
        }
    }

    fn analog_read(&mut self, pin: Pin) -> u16 {
        self.slot(pin).map(|s| s.analog).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pullup_idles_high() {
        let mut pins = SimulatedPins::new();
        pins.set_mode(6, PinMode::InputPullup);
        assert!(pins.digital_read(6));

        pins.set_level(6, false); // button pressed
        assert!(!pins.digital_read(6));
    }

    #[test]
    fn test_output_level_requires_output_mode() {
        let mut pins = SimulatedPins::new();
        pins.digital_write(5, true);
        assert!(!pins.output_level(5));

        pins.set_mode(5, PinMode::Output);
        assert!(pins.output_level(5));
        assert_eq!(pins.write_count(5), 1);
    }

    #[test]
    fn test_analog_is_clamped_to_converter_range() {
        let mut pins = SimulatedPins::new();
        pins.set_analog(8, 5000);
        assert_eq!(pins.analog_read(8), ADC_MAX_RAW);
    }

    #[test]
    fn test_out_of_range_pins_are_ignored() {
        let mut pins = SimulatedPins::new();
        pins.digital_write(40, true);
        pins.set_mode(40, PinMode::Output);
        assert!(!pins.digital_read(40));
        assert_eq!(pins.analog_read(40), 0);
        assert_eq!(pins.mode(40), PinMode::Input);
    }
}
