//! Mock control loop and link fixture for integration tests.
//!
//! Records every call the tuning surface makes into the control loop so
//! tests can assert on the full apply history without a real controller.

use std::sync::{Arc, Mutex};

use skiroast::adapters::ble::SimRadio;
use skiroast::app::ports::ControlLoopPort;
use skiroast::app::service::RoasterLink;
use skiroast::config::FirmwareConfig;
use skiroast::control::pid_config::{PidConfig, ProportionalMode};

// ── Control loop call record ──────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum LoopCall {
    SetTunings { kp: f64, ki: f64, kd: f64, mode: ProportionalMode },
    SetSampleTime(u32),
    SetOutputLimits { min: f64, max: f64 },
}

// ── RecordingLoop ─────────────────────────────────────────────

/// Cloneable: one clone goes into the link, the test keeps the other.
#[derive(Clone, Default)]
pub struct RecordingLoop {
    calls: Arc<Mutex<Vec<LoopCall>>>,
}

#[allow(dead_code)]
impl RecordingLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<LoopCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Number of complete applies (tunings + sample time + limits).
    pub fn apply_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, LoopCall::SetOutputLimits { .. }))
            .count()
    }

    pub fn last_tunings(&self) -> Option<(f64, f64, f64, ProportionalMode)> {
        self.calls().iter().rev().find_map(|c| match *c {
            LoopCall::SetTunings { kp, ki, kd, mode } => Some((kp, ki, kd, mode)),
            _ => None,
        })
    }

    pub fn last_sample_time(&self) -> Option<u32> {
        self.calls().iter().rev().find_map(|c| match *c {
            LoopCall::SetSampleTime(ms) => Some(ms),
            _ => None,
        })
    }

    pub fn last_limits(&self) -> Option<(f64, f64)> {
        self.calls().iter().rev().find_map(|c| match *c {
            LoopCall::SetOutputLimits { min, max } => Some((min, max)),
            _ => None,
        })
    }
}

impl ControlLoopPort for RecordingLoop {
    fn set_tunings(&mut self, kp: f64, ki: f64, kd: f64, mode: ProportionalMode) {
        self.calls
            .lock()
            .unwrap()
            .push(LoopCall::SetTunings { kp, ki, kd, mode });
    }

    fn set_sample_time(&mut self, sample_time_ms: u32) {
        self.calls
            .lock()
            .unwrap()
            .push(LoopCall::SetSampleTime(sample_time_ms));
    }

    fn set_output_limits(&mut self, min: f64, max: f64) {
        self.calls
            .lock()
            .unwrap()
            .push(LoopCall::SetOutputLimits { min, max });
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub type TestLink = RoasterLink<RecordingLoop, SimRadio>;

/// Status characteristic handle used by every fixture.
pub const STATUS_HANDLE: u16 = 0x2a;

#[allow(dead_code)]
pub fn make_link_with(config: FirmwareConfig) -> (TestLink, RecordingLoop) {
    let control = RecordingLoop::new();
    let link = RoasterLink::new(config, PidConfig::default(), control.clone(), SimRadio::new());
    link.bind_status_handle(STATUS_HANDLE);
    (link, control)
}

/// Default config, status characteristic bound, advertising started.
#[allow(dead_code)]
pub fn make_link() -> (TestLink, RecordingLoop) {
    let (link, control) = make_link_with(FirmwareConfig::default());
    link.start().unwrap();
    (link, control)
}

/// Simulate a central connecting through the radio.
#[allow(dead_code)]
pub fn connect(link: &TestLink, handle: u16) {
    assert!(
        link.with_radio(SimRadio::accept_central),
        "central can only connect while advertising"
    );
    link.on_connect(handle);
}
