//! PID tuning configuration for the roaster temperature loop
//!
//! Holds the gains, proportional mode, sample time and output ceiling that
//! the companion app edits over BLE. The model validates what it can
//! (sample time, max power) and pushes itself to the control loop as a
//! single unit via [`PidConfig::apply`].

use serde::Serialize;

use crate::app::ports::ControlLoopPort;
use crate::error::TuningError;

/// Wire token for proportional-on-error.
pub const P_ON_E_TOKEN: &str = "P_ON_E";
/// Wire token for proportional-on-measurement.
pub const P_ON_M_TOKEN: &str = "P_ON_M";

/// Source of the proportional term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ProportionalMode {
    /// Proportional term computed from the error signal.
    OnError,
    /// Proportional term computed from the measured variable.
    #[default]
    OnMeasurement,
}

impl ProportionalMode {
    /// Decode a wire token. Only an exact `P_ON_E` selects `OnError`;
    /// everything else, including garbage, is `OnMeasurement`.
    pub fn from_token(token: &[u8]) -> Self {
        if token == P_ON_E_TOKEN.as_bytes() {
            Self::OnError
        } else {
            Self::OnMeasurement
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::OnError => P_ON_E_TOKEN,
            Self::OnMeasurement => P_ON_M_TOKEN,
        }
    }
}

/// PID tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PidConfig {
    kp: f64,
    ki: f64,
    kd: f64,
    /// Always > 0.
    sample_time_ms: u32,
    p_mode: ProportionalMode,
    /// Always within 0..=100.
    max_power: u8,
}

impl PidConfig {
    pub const DEFAULT_KP: f64 = 9.0;
    pub const DEFAULT_KI: f64 = 0.3;
    pub const DEFAULT_KD: f64 = 2.5;
    pub const DEFAULT_SAMPLE_TIME_MS: u32 = 500;
    pub const DEFAULT_MAX_POWER: u8 = 100;

    pub fn new() -> Self {
        Self {
            kp: Self::DEFAULT_KP,
            ki: Self::DEFAULT_KI,
            kd: Self::DEFAULT_KD,
            sample_time_ms: Self::DEFAULT_SAMPLE_TIME_MS,
            p_mode: ProportionalMode::OnMeasurement,
            max_power: Self::DEFAULT_MAX_POWER,
        }
    }

    // ── Getters ───────────────────────────────────────────────

    pub fn kp(&self) -> f64 {
        self.kp
    }

    pub fn ki(&self) -> f64 {
        self.ki
    }

    pub fn kd(&self) -> f64 {
        self.kd
    }

    pub fn gains(&self) -> (f64, f64, f64) {
        (self.kp, self.ki, self.kd)
    }

    pub fn sample_time_ms(&self) -> u32 {
        self.sample_time_ms
    }

    pub fn p_mode(&self) -> ProportionalMode {
        self.p_mode
    }

    pub fn max_power(&self) -> u8 {
        self.max_power
    }

    // ── Setters ───────────────────────────────────────────────

    /// Gains carry controller-defined meaning and are stored as given.
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    pub fn set_p_mode(&mut self, mode: ProportionalMode) {
        self.p_mode = mode;
    }

    /// Rejects non-positive values; the previous sample time is kept.
    pub fn set_sample_time(&mut self, sample_time_ms: i32) -> Result<(), TuningError> {
        if sample_time_ms <= 0 {
            return Err(TuningError::SampleTimeNotPositive(sample_time_ms));
        }
        self.sample_time_ms = sample_time_ms as u32;
        Ok(())
    }

    /// Rejects values outside 0..=100; the previous ceiling is kept.
    pub fn set_max_power(&mut self, max_power: i32) -> Result<(), TuningError> {
        if !(0..=100).contains(&max_power) {
            return Err(TuningError::MaxPowerOutOfRange(max_power));
        }
        self.max_power = max_power as u8;
        Ok(())
    }

    // ── Apply ─────────────────────────────────────────────────

    /// Push every field to the control loop. Idempotent.
    pub fn apply(&self, target: &mut impl ControlLoopPort) {
        target.set_tunings(self.kp, self.ki, self.kd, self.p_mode);
        target.set_sample_time(self.sample_time_ms);
        target.set_output_limits(0.0, f64::from(self.max_power));
    }
}

impl Default for PidConfig {
    fn default() -> Self {
        Self::new()
    }
}
