//! Standalone analog monitor
//!
//! Runs a simulated device with its polling thread, sweeps a raw analog
//! signal on one pin and shows how the auto-ranged reply follows it.
//!
//! Usage:
//!   analog_monitor [--pin <index>] [--steps <count>] [--fixed]
//!
//! Example:
//!   analog_monitor --pin 8 --steps 40

use remote_io_device::{
    Device, DeviceConfig, LoopbackBus, Poller, SimulatedPins, TransactionAssembler,
    Transport,
};
use std::env;
use std::thread;
use std::time::Duration;

struct MonitorStats {
    samples: usize,
    lowest_reply: u16,
    highest_reply: u16,
    out_of_range: usize,
}

impl MonitorStats {
    fn new() -> Self {
        Self {
            samples: 0,
            lowest_reply: u16::MAX,
            highest_reply: 0,
            out_of_range: 0,
        }
    }

    fn record(&mut self, reply: u16) {
        self.samples += 1;
        if reply > 0xFF {
            self.out_of_range += 1;
            return;
        }
        self.lowest_reply = self.lowest_reply.min(reply);
        self.highest_reply = self.highest_reply.max(reply);
    }

    fn print_summary(&self, range: (u16, u16)) {
        println!("\n=== MONITOR SUMMARY ===");
        println!("Samples queried: {}", self.samples);
        println!("Reply range: {}..{}", self.lowest_reply, self.highest_reply);
        println!("Final window: {}..{}", range.0, range.1);
        println!("Replies above 255: {}", self.out_of_range);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut pin: u16 = 8;
    let mut steps: u32 = 32;
    let mut auto_range = true;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--pin" if i + 1 < args.len() => {
                pin = args[i + 1].parse()?;
                i += 2;
            }
            "--steps" if i + 1 < args.len() => {
                steps = args[i + 1].parse()?;
                i += 2;
            }
            "--fixed" => {
                auto_range = false;
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Usage: analog_monitor [--pin <index>] [--steps <count>] [--fixed]");
                std::process::exit(1);
            }
        }
    }
    let pin_index = remote_io_device::types::checked_pin(pin)?;

    let config = DeviceConfig::new()
        .with_poll_period_ms(5)
        .with_auto_range(auto_range);
    let device = Device::new(SimulatedPins::new(), config)?;
    let poller = Poller::new(device.clone()).spawn();
    let mut bus = LoopbackBus::new(TransactionAssembler::new(device.clone()));

    bus.write_frame(96 + pin)?;
    println!("Assigned pin {} as analog input: {}", pin, bus.read_frame()?);

    let mut stats = MonitorStats::new();
    for step in 0..steps {
        // Triangle wave over the full converter span.
        let phase = step % 16;
        let raw = if phase < 8 { phase * 128 } else { (16 - phase) * 128 };
        let raw = raw.min(1023) as u16;
        device.with_driver(|pins| pins.set_analog(pin_index, raw));
        thread::sleep(Duration::from_millis(15));

        bus.write_frame(pin)?;
        let reply = bus.read_frame()?;
        stats.record(reply);
        println!("step {:>3}  raw {:>4}  reply {:>3}", step, raw, reply);
    }

    bus.write_frame(230)?;
    let min = bus.read_frame()?;
    bus.write_frame(231)?;
    let max = bus.read_frame()?;

    poller.stop();
    stats.print_summary((min, max));
    Ok(())
}
