//! Remote I/O Device Library
//!
//! The device side of a bus-attached remote I/O peripheral: a host assigns a
//! role to each pin of a fixed bank and then reads or drives it through
//! two-byte commands.
//!
//! # Architecture
//!
//! Three actors share one piece of state:
//! - the bus **receive** handler, which assembles request frames and runs the
//!   dispatcher synchronously ([`TransactionAssembler`], [`Dispatcher`])
//! - the bus **request** handler, which drains the queued reply
//! - the **polling loop**, which samples inputs, drives outputs and feeds the
//!   analog auto-range tracker ([`Poller`])
//!
//! The shared state ([`Device`]) sits behind a single mutex with short,
//! per-command and per-pin critical sections.
//!
//! The library does NOT:
//! - talk to real hardware (implement [`PinDriver`] for a board)
//! - implement a physical bus transport (implement the [`BusHandler`] callbacks)
//! - run host-side test routines (see the `remote-io-cli` crate)
//!
//! # Example Usage
//!
//! ```
//! use remote_io_device::{
//!     Device, DeviceConfig, LoopbackBus, Poller, SimulatedPins, TransactionAssembler, Transport,
//! };
//!
//! let device = Device::new(SimulatedPins::new(), DeviceConfig::new()).unwrap();
//! let poller = Poller::new(device.clone());
//! let mut bus = LoopbackBus::new(TransactionAssembler::new(device.clone()));
//!
//! // Assign pin 7 as a digital input (opcode 32 + 7)
//! bus.write_frame(39).unwrap();
//! assert_eq!(bus.read_frame().unwrap(), 7);
//!
//! device.with_driver(|pins| pins.set_level(7, true));
//! poller.poll_once();
//!
//! // Query pin 7
//! bus.write_frame(7).unwrap();
//! assert_eq!(bus.read_frame().unwrap(), 1);
//! ```

// Public modules
pub mod assembler;
pub mod autorange;
pub mod bus;
pub mod command;
pub mod config;
pub mod device;
pub mod dispatcher;
pub mod frame;
pub mod hal;
pub mod poller;
pub mod types;

// Internal modules (not exposed in public API)
mod pins;
mod values;

// Re-export main types for convenience
pub use assembler::{AssemblerState, TransactionAssembler};
pub use autorange::{AnalogRange, AutoRangeTracker};
pub use bus::{BusHandler, LoopbackBus, Transport};
pub use command::Command;
pub use config::{DeviceConfig, DispatchMode};
pub use device::{Device, DeviceSnapshot, DeviceState};
pub use dispatcher::{Dispatcher, Reply};
pub use frame::Frame;
pub use hal::{PinDriver, SimulatedPins};
pub use pins::PinAssignmentTable;
pub use poller::{Poller, PollerHandle};
pub use types::{DeviceError, ErrorCode, Pin, PinMode, PinRole, Result, BANK_SIZE};
pub use values::ValueStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
