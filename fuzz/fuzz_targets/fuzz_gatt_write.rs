//! Fuzz target: `RoasterLink::on_write`
//!
//! The first byte picks the characteristic, the rest is the write payload.
//! Asserts the router never panics and the tuning model stays valid no
//! matter what a central writes.
//!
//! cargo fuzz run fuzz_gatt_write

#![no_main]

use libfuzzer_sys::fuzz_target;
use skiroast::adapters::ble::SimRadio;
use skiroast::app::ports::ControlLoopPort;
use skiroast::app::service::RoasterLink;
use skiroast::config::FirmwareConfig;
use skiroast::control::pid_config::{PidConfig, ProportionalMode};
use skiroast::gatt::{CHARACTERISTICS, Characteristic};

struct NullLoop;

impl ControlLoopPort for NullLoop {
    fn set_tunings(&mut self, _: f64, _: f64, _: f64, _: ProportionalMode) {}
    fn set_sample_time(&mut self, _: u32) {}
    fn set_output_limits(&mut self, _: f64, _: f64) {}
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let kind = CHARACTERISTICS[usize::from(selector) % CHARACTERISTICS.len()].kind;

    let link = RoasterLink::new(
        FirmwareConfig::default(),
        PidConfig::default(),
        NullLoop,
        SimRadio::new(),
    );
    let before = link.pid_config();
    let accepted = link.on_write(kind, payload).is_ok();

    let cfg = link.pid_config();
    assert!(cfg.sample_time_ms() > 0);
    assert!(cfg.max_power() <= 100);
    let (p, i, d) = cfg.gains();
    assert!(p.is_finite() && i.is_finite() && d.is_finite());
    if !accepted {
        assert_eq!(cfg, before, "rejected write must leave the model untouched");
    }

    // Commands come back out exactly as queued, minus one line ending.
    if accepted && kind == Characteristic::CommandRx {
        if let Some(cmd) = link.next_command() {
            assert!(!cmd.is_empty());
            assert!(cmd.len() <= payload.len());
        }
    }
});
