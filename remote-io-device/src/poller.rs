//! Polling loop
//!
//! Runs once per fixed period and keeps the value store in step with the
//! physical pins:
//!
//! | Role               | Action                                            |
//! |--------------------|---------------------------------------------------|
//! | DigitalInput       | sample, store 0/1                                 |
//! | DigitalInputPullup | sample, store the inverse (low = active = 1)      |
//! | AnalogInput        | sample, feed the auto-range tracker, store raw    |
//! | Output             | drive the stored value (nonzero = HIGH)           |
//! | Unused             | nothing                                           |
//!
//! The device lock is taken once per pin, never across the whole scan, so bus
//! commands are only ever delayed by a single pin's worth of work.

use crate::device::{Device, DeviceState};
use crate::hal::PinDriver;
use crate::types::{Pin, PinRole, BANK_SIZE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Drives polling passes over a device
pub struct Poller<D> {
    device: Device<D>,
    period: Duration,
    verbose: bool,
}

impl<D: PinDriver> Poller<D> {
    pub fn new(device: Device<D>) -> Self {
        let config = device.config();
        let (period, verbose) = (config.poll_period(), config.verbose);
        Self {
            device,
            period,
            verbose,
        }
    }

    /// Run one full pass over the bank and bump the loop counter
    pub fn poll_once(&self) {
        for pin in 0..BANK_SIZE as Pin {
            self.device.with_state(|state| Self::poll_pin(state, pin));
        }

        let count = self.device.with_state(|state| {
            state.loop_count = state.loop_count.wrapping_add(1);
            state.loop_count
        });

        if self.verbose {
            log::debug!("Polling pass {} complete", count);
        } else {
            log::trace!("Polling pass {} complete", count);
        }
    }

    fn poll_pin(state: &mut DeviceState<D>, pin: Pin) {
        match state.roles.role(pin) {
            PinRole::Unused => {}
            PinRole::DigitalInput => {
                let level = state.driver.digital_read(pin);
                state.values.set(pin, level as i32);
            }
            PinRole::DigitalInputPullup => {
                let level = state.driver.digital_read(pin);
                state.values.set(pin, (!level) as i32);
            }
            PinRole::AnalogInput => {
                let sample = state.driver.analog_read(pin) as i32;
                state.tracker.observe(sample);
                state.values.set(pin, sample);
            }
            PinRole::Output => {
                let high = state.values.get(pin) != 0;
                state.driver.digital_write(pin, high);
            }
        }
    }
}

impl<D: PinDriver + 'static> Poller<D> {
    /// Run the loop on its own thread until the handle is stopped
    pub fn spawn(self) -> PollerHandle {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        log::info!("Polling loop started ({} ms period)", self.period.as_millis());
        let thread = thread::spawn(move || {
            while flag.load(Ordering::Acquire) {
                self.poll_once();
                thread::sleep(self.period);
            }
            log::info!("Polling loop stopped");
        });

        PollerHandle {
            running,
            thread: Some(thread),
        }
    }
}

/// Owner of a running polling thread; stops it on drop
pub struct PollerHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Ask the loop to finish its current pass and wait for it
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("Polling thread panicked");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use crate::hal::SimulatedPins;

    fn poller() -> (Device<SimulatedPins>, Poller<SimulatedPins>) {
        let device = Device::new(SimulatedPins::new(), DeviceConfig::new()).unwrap();
        (device.clone(), Poller::new(device))
    }

    #[test]
    fn test_digital_inputs() {
        let (device, poller) = poller();
        device.with_state(|s| {
            s.assign(7, PinRole::DigitalInput);
            s.assign(6, PinRole::DigitalInputPullup);
            s.driver.set_level(7, true);
        });

        poller.poll_once();
        assert_eq!(device.value(7).unwrap(), 1);
        // Released pullup reads HIGH, i.e. inactive.
        assert_eq!(device.value(6).unwrap(), 0);

        device.with_driver(|d| d.set_level(6, false));
        poller.poll_once();
        assert_eq!(device.value(6).unwrap(), 1);
    }

    #[test]
    fn test_analog_stores_raw_and_feeds_tracker() {
        let (device, poller) = poller();
        device.with_state(|s| {
            s.assign(8, PinRole::AnalogInput);
            s.driver.set_analog(8, 900);
        });

        poller.poll_once();
        assert_eq!(device.value(8).unwrap(), 900);
        assert_eq!(device.snapshot().range.max, 900);
    }

    #[test]
    fn test_outputs_follow_value_store() {
        let (device, poller) = poller();
        device.with_state(|s| s.assign(3, PinRole::Output));
        device.stage_output(3, 42).unwrap();

        poller.poll_once();
        assert!(device.with_driver(|d| d.output_level(3)));

        device.stage_output(3, 0).unwrap();
        poller.poll_once();
        assert!(!device.with_driver(|d| d.output_level(3)));
    }

    #[test]
    fn test_unused_pins_untouched() {
        let (device, poller) = poller();
        device.with_driver(|d| d.set_level(1, true));
        poller.poll_once();
        assert_eq!(device.value(1).unwrap(), 0);
        assert_eq!(device.with_driver(|d| d.write_count(1)), 0);
    }

    #[test]
    fn test_loop_counter_once_per_pass() {
        let (device, poller) = poller();
        for _ in 0..5 {
            poller.poll_once();
        }
        assert_eq!(device.loop_count(), 5);
    }

    #[test]
    fn test_spawned_loop_runs_and_stops() {
        let device =
            Device::new(SimulatedPins::new(), DeviceConfig::new().with_poll_period_ms(1)).unwrap();
        let handle = Poller::new(device.clone()).spawn();
        assert!(handle.is_running());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while device.loop_count() < 3 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        handle.stop();

        let stopped_at = device.loop_count();
        assert!(stopped_at >= 3);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(device.loop_count(), stopped_at);
    }
}
