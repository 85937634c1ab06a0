//! Applied loop parameters shared with the roast control loop.
//!
//! The BLE tuning surface writes here (through [`ControlLoopPort`]); the
//! control loop reads a consistent [`LoopParameters`] snapshot each
//! iteration and re-tunes its controller when the generation moves.

use core::cell::Cell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::app::ports::ControlLoopPort;
use crate::control::pid_config::{PidConfig, ProportionalMode};

/// The parameters most recently pushed to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopParameters {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub p_mode: ProportionalMode,
    pub sample_time_ms: u32,
    pub output_min: f64,
    pub output_max: f64,
    /// Bumped on every setter call.
    pub generation: u32,
}

impl LoopParameters {
    fn from_config(config: &PidConfig) -> Self {
        let (kp, ki, kd) = config.gains();
        Self {
            kp,
            ki,
            kd,
            p_mode: config.p_mode(),
            sample_time_ms: config.sample_time_ms(),
            output_min: 0.0,
            output_max: f64::from(config.max_power()),
            generation: 0,
        }
    }
}

/// Cloneable handle to the applied loop parameters.
#[derive(Clone)]
pub struct SharedLoopParameters {
    inner: Arc<Mutex<CriticalSectionRawMutex, Cell<LoopParameters>>>,
}

impl SharedLoopParameters {
    pub fn new(initial: &PidConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Cell::new(LoopParameters::from_config(initial)))),
        }
    }

    /// Consistent copy of all parameters.
    pub fn snapshot(&self) -> LoopParameters {
        self.inner.lock(Cell::get)
    }

    pub fn generation(&self) -> u32 {
        self.snapshot().generation
    }

    fn update(&self, f: impl FnOnce(&mut LoopParameters)) {
        self.inner.lock(|cell| {
            let mut p = cell.get();
            f(&mut p);
            p.generation = p.generation.wrapping_add(1);
            cell.set(p);
        });
    }
}

impl ControlLoopPort for SharedLoopParameters {
    fn set_tunings(&mut self, kp: f64, ki: f64, kd: f64, mode: ProportionalMode) {
        self.update(|p| {
            p.kp = kp;
            p.ki = ki;
            p.kd = kd;
            p.p_mode = mode;
        });
    }

    fn set_sample_time(&mut self, sample_time_ms: u32) {
        self.update(|p| p.sample_time_ms = sample_time_ms);
    }

    fn set_output_limits(&mut self, min: f64, max: f64) {
        self.update(|p| {
            p.output_min = min;
            p.output_max = max;
        });
    }
}
