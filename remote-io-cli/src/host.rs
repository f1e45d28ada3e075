//! Host-side client
//!
//! Speaks the two-byte protocol over any [`Transport`] and records every
//! exchange for the session report. The three routines mirror the bench
//! checks run against real boards:
//! - echo: the device (in echo mode) must return every opcode unchanged
//! - blink: toggle an output and check the request counter afterwards
//! - configuration: assign a mixed set of roles, then sweep queries

use crate::report::{Expectation, ExchangeRecord};
use anyhow::{Context, Result};
use chrono::Local;
use remote_io_device::command::{self, Command};
use remote_io_device::types::checked_pin;
use remote_io_device::{ErrorCode, PinRole, Transport};
use std::thread;
use std::time::Duration;

/// Opcodes sent by the echo routine
pub const ECHO_SEQUENCE: [u16; 12] = [0, 1, 2, 4, 32, 63, 64, 127, 128, 228, 254, 255];

/// Opcodes queried on every configuration sweep iteration
pub const SWEEP_SEQUENCE: [u16; 11] = [0, 5, 6, 7, 8, 9, 224, 226, 228, 230, 231];

pub struct HostClient<T> {
    transport: T,
    records: Vec<ExchangeRecord>,
    iteration: Option<usize>,
}

impl<T: Transport> HostClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            records: Vec::new(),
            iteration: None,
        }
    }

    /// Send one request frame
    pub fn write_data(&mut self, data: u16) -> Result<()> {
        self.transport.write_frame(data)?;
        log::trace!("sent: hi {:08b} lo {:08b} ({})", data >> 8, data & 0xFF, data);
        Ok(())
    }

    /// Read one reply frame
    pub fn read_data(&mut self) -> Result<u16> {
        let data = self.transport.read_frame()?;
        log::trace!("read: hi {:08b} lo {:08b} ({})", data >> 8, data & 0xFF, data);
        Ok(data)
    }

    /// Write a request and read its reply
    pub fn exchange(&mut self, opcode: u16) -> Result<u16> {
        self.write_data(opcode)?;
        let reply = self.read_data()?;
        log::debug!("sent {} received {}", opcode, reply);
        Ok(reply)
    }

    /// Exchange and record the result against an expectation
    fn checked(&mut self, opcode: u16, label: &str, expected: Expectation) -> Result<u16> {
        let reply = self.exchange(opcode)?;
        let ok = expected.accepts(reply);
        if !ok {
            log::error!("{}: sent {}, received {}, expected {}", label, opcode, reply, expected);
        }
        self.records.push(ExchangeRecord {
            timestamp: Local::now(),
            iteration: self.iteration,
            opcode,
            reply,
            label: label.to_string(),
            expected,
            ok,
        });
        Ok(reply)
    }

    fn configure(&mut self, pin: u16, role: PinRole) -> Result<bool> {
        let pin = checked_pin(pin)?;
        let opcode = Command::Assign(pin, role)
            .opcode()
            .with_context(|| format!("No opcode assigns {}", role))?;
        log::debug!("configuring pin {} for {}...", pin, role);

        let label = format!("CONFIGURE {} ({})", role, pin);
        let reply = self.checked(opcode, &label, Expectation::Exact(pin as u16))?;
        let ok = reply == pin as u16;
        if ok {
            log::info!("configured pin {} for {}; returned: {}", pin, role, reply);
        } else {
            log::error!("failed to configure pin {} for {}; returned: {}", pin, role, reply);
        }
        Ok(ok)
    }

    /// Assign `pin` as a plain digital input; true if the device acknowledged
    pub fn configure_pin_as_digital_input(&mut self, pin: u16) -> Result<bool> {
        self.configure(pin, PinRole::DigitalInput)
    }

    /// Assign `pin` as a pulled-up digital input (0 = inactive, 1 = active)
    pub fn configure_pin_as_digital_input_pullup(&mut self, pin: u16) -> Result<bool> {
        self.configure(pin, PinRole::DigitalInputPullup)
    }

    /// Assign `pin` as an analog input
    pub fn configure_pin_as_analog_input(&mut self, pin: u16) -> Result<bool> {
        self.configure(pin, PinRole::AnalogInput)
    }

    /// Assign `pin` as an output
    pub fn configure_pin_as_output(&mut self, pin: u16) -> Result<bool> {
        self.configure(pin, PinRole::Output)
    }

    /// Drive `pin` directly; returns the device's reply (1 for HIGH, 0 for LOW)
    pub fn set_output_on_pin(&mut self, pin: u16, high: bool) -> Result<u16> {
        let pin = checked_pin(pin)?;
        let opcode = Command::WritePin(pin, high)
            .opcode()
            .context("Write opcode out of band")?;
        let label = format!("WRITE {} ({})", if high { "HIGH" } else { "LOW" }, pin);
        let reply = self.checked(opcode, &label, Expectation::Exact(high as u16))?;
        log::debug!("set pin {} {}; returned: {}", pin, if high { "HIGH" } else { "LOW" }, reply);
        Ok(reply)
    }

    /// Send a raw opcode (pin index plus band offset) and return the reply
    pub fn get_input_from_pin(&mut self, pin_plus_offset: u16) -> Result<u16> {
        let reply = self.exchange(pin_plus_offset)?;
        log::debug!("received response from {} of {}", pin_plus_offset, reply);
        Ok(reply)
    }

    /// Send the echo sequence; returns the number of mismatches
    pub fn echo_test(&mut self) -> Result<usize> {
        log::info!("starting echo test...");
        let mut failures = 0;
        for opcode in ECHO_SEQUENCE {
            let reply = self.checked(opcode, "ECHO", Expectation::Exact(opcode))?;
            if reply == opcode {
                log::info!("echo succeeded: {} == {}", opcode, reply);
            } else {
                failures += 1;
            }
        }
        log::info!("echo test complete ({} failures)", failures);
        Ok(failures)
    }

    /// Toggle `pin` `blink_count` times, then check the request counter.
    /// Returns true when the counter matched `2 * blink_count + 1`.
    pub fn blink_test(&mut self, pin: u16, blink_count: u16, pause: Duration) -> Result<bool> {
        log::info!("blink pin {} {} times...", pin, blink_count);
        self.configure_pin_as_output(pin)?;

        let reset = self.get_input_from_pin(command::OP_RESET_REQUEST_COUNT)?;
        log::info!("set request count to zero: {}", reset);

        for _ in 0..blink_count {
            self.set_output_on_pin(pin, true)?;
            thread::sleep(pause);
            self.set_output_on_pin(pin, false)?;
            thread::sleep(pause);
        }

        // Every toggle counts, plus the counter query itself.
        let expected = blink_count.wrapping_mul(2).wrapping_add(1);
        let actual = self.checked(
            command::OP_REQUEST_COUNT,
            "REQUEST COUNT (226)",
            Expectation::Exact(expected),
        )?;
        log::info!("request count expected: {}; actual: {}", expected, actual);
        Ok(actual == expected)
    }

    /// Assign the bench layout, then query it `loops` times with `pause`
    /// between iterations so the polling loop can run.
    pub fn configuration_test(&mut self, loops: usize, pause: Duration) -> Result<()> {
        log::info!("configuring the device and then reading the results...");
        self.configure_pin_as_output(5)?;
        self.configure_pin_as_digital_input_pullup(6)?;
        self.configure_pin_as_digital_input(7)?;
        self.configure_pin_as_analog_input(8)?;
        self.configure_pin_as_digital_input_pullup(9)?;

        log::info!("configured. starting loop to repeat {} times...", loops);
        for iteration in 0..loops {
            self.iteration = Some(iteration);
            // Give the polling loop a chance to sample the new roles.
            thread::sleep(pause);
            for opcode in SWEEP_SEQUENCE {
                let (label, expected) = describe_sweep(opcode);
                let reply = self.checked(opcode, label, expected)?;
                log::info!("[{:04}] {:<26} {}", iteration, label, annotate(opcode, reply));
            }
        }
        self.iteration = None;
        log::info!("configuration test complete.");
        Ok(())
    }

    /// Everything exchanged so far
    pub fn records(&self) -> &[ExchangeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ExchangeRecord> {
        self.records
    }
}

/// Label and check for a sweep opcode
fn describe_sweep(opcode: u16) -> (&'static str, Expectation) {
    match opcode {
        0 => ("UNCONFIGURED (0)", Expectation::Exact(ErrorCode::PinUnassigned.value())),
        5 => ("LED (5)", Expectation::Exact(ErrorCode::PinAssignedAsOutput.value())),
        6 => ("BUTTON (6)", Expectation::Digital),
        7 => ("DIGITAL IR (7)", Expectation::Digital),
        8 => ("ANALOG IR (8)", Expectation::Byte),
        9 => ("DIGITAL IR (9)", Expectation::Digital),
        command::OP_ECHO => ("ECHO (224)", Expectation::Exact(command::OP_ECHO)),
        command::OP_REQUEST_COUNT => ("REQUEST COUNT (226)", Expectation::Any),
        command::OP_LOOP_COUNT => ("LOOP COUNT (228)", Expectation::Any),
        command::OP_RANGE_MIN => ("ANALOG MIN RANGE (230)", Expectation::Any),
        command::OP_RANGE_MAX => ("ANALOG MAX RANGE (231)", Expectation::Any),
        _ => ("OTHER", Expectation::Any),
    }
}

fn annotate(opcode: u16, reply: u16) -> String {
    match ErrorCode::from_value(reply) {
        // Only pin queries can produce a sentinel.
        Some(code) if opcode < command::ASSIGN_INPUT_BASE => format!("{} ({})", reply, code),
        _ => reply.to_string(),
    }
}
