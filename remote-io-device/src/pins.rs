//! Pin assignment table
//!
//! Per-pin role storage. Assigning a role also reconfigures the physical pin
//! so the two never disagree for longer than one call.

use crate::hal::PinDriver;
use crate::types::{Pin, PinRole, BANK_SIZE};

/// Fixed-capacity table of pin roles
#[derive(Debug, Clone)]
pub struct PinAssignmentTable {
    roles: [PinRole; BANK_SIZE],
}

impl PinAssignmentTable {
    /// Create a table with every pin `Unused`
    pub fn new() -> Self {
        Self {
            roles: [PinRole::Unused; BANK_SIZE],
        }
    }

    /// Set the role of a pin and apply the matching electrical mode.
    ///
    /// Indices outside the bank are ignored.
    pub fn assign<D: PinDriver + ?Sized>(&mut self, pin: Pin, role: PinRole, driver: &mut D) {
        let Some(slot) = self.roles.get_mut(pin as usize) else {
            log::warn!("Ignoring assignment of out-of-range pin {}", pin);
            return;
        };
        *slot = role;
        driver.set_mode(pin, role.pin_mode());
        log::debug!("Pin {} assigned as {}", pin, role);
    }

    /// Return every pin to `Unused` and input mode
    pub fn reset_all<D: PinDriver + ?Sized>(&mut self, driver: &mut D) {
        for pin in 0..BANK_SIZE {
            self.roles[pin] = PinRole::Unused;
            driver.set_mode(pin as Pin, PinRole::Unused.pin_mode());
        }
    }

    /// Role of a pin (`Unused` for indices outside the bank)
    pub fn role(&self, pin: Pin) -> PinRole {
        self.roles.get(pin as usize).copied().unwrap_or_default()
    }

    /// Iterate `(pin, role)` over the whole bank
    pub fn iter(&self) -> impl Iterator<Item = (Pin, PinRole)> + '_ {
        self.roles
            .iter()
            .enumerate()
            .map(|(pin, role)| (pin as Pin, *role))
    }

    /// Number of pins with a role other than `Unused`
    pub fn assigned_count(&self) -> usize {
        self.roles.iter().filter(|r| **r != PinRole::Unused).count()
    }
}

impl Default for PinAssignmentTable {
    fn default() -> Self {
        Self::new()
    }
}
