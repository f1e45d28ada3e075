// End-to-end exchanges over the loopback bus, with the polling loop driven by hand.
use remote_io_device::{
    Device, DeviceConfig, DispatchMode, ErrorCode, LoopbackBus, PinRole, Poller, SimulatedPins,
    TransactionAssembler, Transport,
};

struct Rig {
    device: Device<SimulatedPins>,
    poller: Poller<SimulatedPins>,
    bus: LoopbackBus<TransactionAssembler<SimulatedPins>>,
}

impl Rig {
    fn new(config: DeviceConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let device = Device::new(SimulatedPins::new(), config).unwrap();
        Self {
            poller: Poller::new(device.clone()),
            bus: LoopbackBus::new(TransactionAssembler::new(device.clone())),
            device,
        }
    }

    fn exchange(&mut self, opcode: u16) -> u16 {
        self.bus.write_frame(opcode).unwrap();
        self.bus.read_frame().unwrap()
    }
}

#[test]
fn assign_output_then_write_high() {
    let mut rig = Rig::new(DeviceConfig::new());

    assert_eq!(rig.exchange(131), 3);
    assert_eq!(rig.exchange(195), 1);
    assert!(rig.device.with_driver(|d| d.output_level(3)));

    // The direct write never reached the value store, so the next polling
    // pass drives the stored (zero) value back out.
    rig.poller.poll_once();
    assert!(!rig.device.with_driver(|d| d.output_level(3)));

    // Staging the value store is what makes an output stick.
    rig.device.stage_output(3, 1).unwrap();
    rig.poller.poll_once();
    assert!(rig.device.with_driver(|d| d.output_level(3)));
    assert_eq!(rig.exchange(3), ErrorCode::PinAssignedAsOutput.value());
}

#[test]
fn configuration_sweep_matches_host_expectations() {
    let mut rig = Rig::new(DeviceConfig::new());
    rig.device.with_driver(|d| {
        d.set_level(6, false); // button pressed
        d.set_level(7, true);
        d.set_analog(8, 335);
        d.set_level(9, true); // pullup sensor inactive
    });

    assert_eq!(rig.exchange(128 + 5), 5);
    assert_eq!(rig.exchange(64 + 6), 6);
    assert_eq!(rig.exchange(32 + 7), 7);
    assert_eq!(rig.exchange(96 + 8), 8);
    assert_eq!(rig.exchange(64 + 9), 9);

    rig.exchange(233); // auto-range on, window re-primed
    rig.poller.poll_once();

    assert_eq!(rig.exchange(0), ErrorCode::PinUnassigned.value());
    assert_eq!(rig.exchange(5), ErrorCode::PinAssignedAsOutput.value());
    assert_eq!(rig.exchange(6), 1);
    assert_eq!(rig.exchange(7), 1);
    assert_eq!(rig.exchange(8), 112);
    assert_eq!(rig.exchange(9), 0);
    assert_eq!(rig.exchange(224), 224);
    assert_eq!(rig.exchange(228), 1);
    assert_eq!(rig.exchange(230), 70);
    assert_eq!(rig.exchange(231), 600);
}

#[test]
fn loop_counter_is_stable_between_passes() {
    let mut rig = Rig::new(DeviceConfig::new());
    for _ in 0..4 {
        rig.poller.poll_once();
    }
    let first = rig.exchange(228);
    assert_eq!(first, 4);
    assert_eq!(rig.exchange(228), first);

    assert_eq!(rig.exchange(227), 0);
    assert_eq!(rig.exchange(228), 0);
}

#[test]
fn auto_range_widens_and_resets() {
    let mut rig = Rig::new(DeviceConfig::new());
    rig.exchange(96 + 8);

    let mut last = (rig.exchange(230), rig.exchange(231));
    for raw in [300u16, 40, 700, 10, 1023, 500] {
        rig.device.with_driver(|d| d.set_analog(8, raw));
        rig.poller.poll_once();
        let now = (rig.exchange(230), rig.exchange(231));
        assert!(now.0 <= last.0, "min grew: {:?} -> {:?}", last, now);
        assert!(now.1 >= last.1, "max shrank: {:?} -> {:?}", last, now);
        last = now;
    }
    assert_eq!(last, (10, 1023));

    assert_eq!(rig.exchange(232), 0);
    assert_eq!((rig.exchange(230), rig.exchange(231)), (70, 600));

    // Disabled: samples no longer move the window.
    rig.device.with_driver(|d| d.set_analog(8, 1000));
    rig.poller.poll_once();
    assert_eq!(rig.exchange(231), 600);

    assert_eq!(rig.exchange(233), 1);
    assert_eq!((rig.exchange(230), rig.exchange(231)), (70, 600));
}

#[test]
fn analog_value_rendering() {
    let mut rig = Rig::new(DeviceConfig::new().with_auto_range(false));
    rig.exchange(96 + 2);
    rig.device.with_driver(|d| d.set_analog(2, 335));
    rig.poller.poll_once();

    assert_eq!(rig.device.value(2).unwrap(), 335);
    assert_eq!(rig.exchange(2), 112);
}

#[test]
fn sentinels_and_error_band() {
    let mut rig = Rig::new(DeviceConfig::new());
    assert_eq!(rig.bus.read_frame().unwrap(), ErrorCode::EmptyQueue.value());
    assert_eq!(rig.exchange(236), ErrorCode::UnrecognisedCommand.value());
    for opcode in 240..=255 {
        assert_eq!(rig.exchange(opcode), opcode);
    }
}

#[test]
fn request_count_after_blink_sequence() {
    let mut rig = Rig::new(DeviceConfig::new());
    let blink_count = 5;
    rig.exchange(128 + 5);
    rig.exchange(225);
    for _ in 0..blink_count {
        assert_eq!(rig.exchange(192 + 5), 1);
        assert_eq!(rig.exchange(160 + 5), 0);
    }
    assert_eq!(rig.exchange(226), blink_count * 2 + 1);
}

#[test]
fn echo_mode_answers_everything_with_itself() {
    let mut rig = Rig::new(DeviceConfig::new().with_mode(DispatchMode::Echo));
    for opcode in [0u16, 1, 2, 4, 32, 63, 64, 127, 128, 228, 254, 255] {
        assert_eq!(rig.exchange(opcode), opcode);
    }
    assert_eq!(rig.device.role(0).unwrap(), PinRole::Unused);
}
