//! Per-pin value store
//!
//! A passive array. What a stored value means depends on the role the pin
//! has *at the time it is read*; reassigning a role leaves the old value in
//! place until something overwrites it.

use crate::types::{Pin, BANK_SIZE};

/// Last observed (inputs) or last staged (outputs) value of every pin
#[derive(Debug, Clone)]
pub struct ValueStore {
    values: [i32; BANK_SIZE],
}

impl ValueStore {
    pub fn new() -> Self {
        Self {
            values: [0; BANK_SIZE],
        }
    }

    /// Stored value of a pin, 0 outside the bank
    pub fn get(&self, pin: Pin) -> i32 {
        self.values.get(pin as usize).copied().unwrap_or(0)
    }

    /// Overwrite the stored value of a pin; ignored outside the bank
    pub fn set(&mut self, pin: Pin, value: i32) {
        if let Some(slot) = self.values.get_mut(pin as usize) {
            *slot = value;
        }
    }

    /// Zero every slot
    pub fn clear(&mut self) {
        self.values = [0; BANK_SIZE];
    }
}

impl Default for ValueStore {
    fn default() -> Self {
        Self::new()
    }
}
