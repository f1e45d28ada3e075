//! Shared device state
//!
//! The role table, value store, analog window, both counters and the pin
//! driver are touched by three actors: the bus receive handler, the bus
//! request handler and the polling loop. They all live in one
//! [`DeviceState`] behind a single mutex, and [`Device`] is the cloneable
//! handle each actor holds.
//!
//! Critical sections are short:
//! - the dispatcher holds the lock for one command,
//! - the polling loop holds it for one pin at a time.
//!
//! A command can therefore land between two pins of a polling pass. That
//! interleaving is part of the contract; a torn *pin* is not.

use crate::autorange::{AnalogRange, AutoRangeTracker};
use crate::config::DeviceConfig;
use crate::hal::PinDriver;
use crate::pins::PinAssignmentTable;
use crate::types::{checked_pin, PinRole, Result, BANK_SIZE};
use crate::values::ValueStore;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Everything the actors share
#[derive(Debug)]
pub struct DeviceState<D> {
    pub roles: PinAssignmentTable,
    pub values: ValueStore,
    pub tracker: AutoRangeTracker,
    pub loop_count: u32,
    pub request_count: u32,
    pub driver: D,
}

impl<D: PinDriver> DeviceState<D> {
    fn new(driver: D, config: &DeviceConfig) -> Self {
        Self {
            roles: PinAssignmentTable::new(),
            values: ValueStore::new(),
            tracker: AutoRangeTracker::new(config.range_min, config.range_max, config.auto_range),
            loop_count: 0,
            request_count: 0,
            driver,
        }
    }

    /// Assign a role, reconfiguring the physical pin
    pub fn assign(&mut self, pin: u8, role: PinRole) {
        self.roles.assign(pin, role, &mut self.driver);
    }
}

/// Point-in-time copy of the device state, for reports
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    pub roles: Vec<PinRole>,
    pub values: Vec<i32>,
    pub range: AnalogRange,
    pub loop_count: u32,
    pub request_count: u32,
}

/// Cloneable handle to the shared device state
pub struct Device<D> {
    shared: Arc<Mutex<DeviceState<D>>>,
    config: Arc<DeviceConfig>,
}

impl<D> Clone for Device<D> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            config: Arc::clone(&self.config),
        }
    }
}

impl<D: PinDriver> Device<D> {
    /// Build a device around a pin driver
    ///
    /// All pins start `Unused` in input mode, values at zero, the analog window
    /// at the configured defaults.
    pub fn new(driver: D, config: DeviceConfig) -> Result<Self> {
        config.validate()?;
        let mut state = DeviceState::new(driver, &config);
        state.roles.reset_all(&mut state.driver);

        log::info!(
            "Device ready on bus address 0x{:02X} ({:?} mode, {} pins, poll every {} ms)",
            config.bus_address,
            config.mode,
            BANK_SIZE,
            config.poll_period_ms
        );

        Ok(Self {
            shared: Arc::new(Mutex::new(state)),
            config: Arc::new(config),
        })
    }

    /// Configuration this device was built with
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Enter the critical section
    ///
    /// A poisoned lock is recovered: a panic in one actor must not stop the
    /// device from answering the bus.
    pub fn lock(&self) -> MutexGuard<'_, DeviceState<D>> {
        match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Device state lock was poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Run `f` inside the critical section
    pub fn with_state<R>(&self, f: impl FnOnce(&mut DeviceState<D>) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// Run `f` against the pin driver inside the critical section
    pub fn with_driver<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        self.with_state(|state| f(&mut state.driver))
    }

    /// Return every pin to `Unused` and zero the value store
    pub fn reset_pins(&self) {
        let released = self.with_state(|state| {
            let assigned = state.roles.assigned_count();
            state.roles.reset_all(&mut state.driver);
            state.values.clear();
            assigned
        });
        log::info!("{} assigned pin(s) reset to UNUSED", released);
    }

    /// Stage the value the polling loop will drive onto an output pin
    ///
    /// This is the only path into the value store for outputs; direct bus
    /// writes (opcodes 160..=223) bypass it.
    pub fn stage_output(&self, pin: u16, value: i32) -> Result<()> {
        let pin = checked_pin(pin)?;
        self.with_state(|state| state.values.set(pin, value));
        Ok(())
    }

    /// Current role of a pin
    pub fn role(&self, pin: u16) -> Result<PinRole> {
        let pin = checked_pin(pin)?;
        Ok(self.with_state(|state| state.roles.role(pin)))
    }

    /// Stored value of a pin
    pub fn value(&self, pin: u16) -> Result<i32> {
        let pin = checked_pin(pin)?;
        Ok(self.with_state(|state| state.values.get(pin)))
    }

    pub fn loop_count(&self) -> u32 {
        self.with_state(|state| state.loop_count)
    }

    pub fn request_count(&self) -> u32 {
        self.with_state(|state| state.request_count)
    }

    /// Copy the whole state in one critical section
    pub fn snapshot(&self) -> DeviceSnapshot {
        self.with_state(|state| DeviceSnapshot {
            roles: state.roles.iter().map(|(_, role)| role).collect(),
            values: (0..BANK_SIZE).map(|pin| state.values.get(pin as u8)).collect(),
            range: state.tracker.range(),
            loop_count: state.loop_count,
            request_count: state.request_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::SimulatedPins;
    use crate::types::{DeviceError, PinMode};

    fn device() -> Device<SimulatedPins> {
        Device::new(SimulatedPins::new(), DeviceConfig::new()).unwrap()
    }

    #[test]
    fn test_new_device_defaults() {
        let device = device();
        let snapshot = device.snapshot();
        assert_eq!(snapshot.roles.len(), BANK_SIZE);
        assert!(snapshot.roles.iter().all(|r| *r == PinRole::Unused));
        assert_eq!(snapshot.range.min, 70);
        assert_eq!(snapshot.range.max, 600);
        assert!(snapshot.range.auto_range);
        assert_eq!(snapshot.loop_count, 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = Device::new(SimulatedPins::new(), DeviceConfig::new().with_poll_period_ms(0));
        assert!(matches!(result, Err(DeviceError::InvalidConfig(_))));
    }

    #[test]
    fn test_clones_share_state() {
        let device = device();
        let other = device.clone();
        other.with_state(|state| state.assign(4, PinRole::Output));
        assert_eq!(device.role(4).unwrap(), PinRole::Output);
        assert_eq!(device.with_driver(|d| d.mode(4)), PinMode::Output);
    }

    #[test]
    fn test_stage_output_checks_range() {
        let device = device();
        device.stage_output(3, 1).unwrap();
        assert_eq!(device.value(3).unwrap(), 1);
        assert!(device.stage_output(32, 1).is_err());
    }

    #[test]
    fn test_reset_pins() {
        let device = device();
        device.with_state(|state| state.assign(9, PinRole::DigitalInputPullup));
        device.stage_output(9, 1).unwrap();
        device.reset_pins();
        assert_eq!(device.role(9).unwrap(), PinRole::Unused);
        assert_eq!(device.value(9).unwrap(), 0);
        assert_eq!(device.with_driver(|d| d.mode(9)), PinMode::Input);
    }
}
