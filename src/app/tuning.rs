//! Read/write surface for the four PID tuning characteristics.
//!
//! | Parameter   | Write payload         | Read payload        |
//! |-------------|-----------------------|---------------------|
//! | Gains       | `p,i,d`               | `p.pp,i.ii,d.dd`    |
//! | Mode        | `P_ON_E` / anything   | `P_ON_E` / `P_ON_M` |
//! | Sample time | integer ms (> 0)      | integer             |
//! | Max power   | integer % (0..=100)   | integer             |
//!
//! Every accepted write pushes the whole [`PidConfig`] to the control loop.
//! A rejected write changes nothing and applies nothing; the reason is
//! returned for logging only, the wire protocol has no error channel.

use std::sync::Mutex;

use log::{info, warn};

use crate::app::lock_unpoisoned;
use crate::app::ports::ControlLoopPort;
use crate::control::pid_config::{PidConfig, ProportionalMode};
use crate::error::TuningError;
use crate::gatt::Characteristic;

/// One of the tunable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningParam {
    Gains,
    Mode,
    SampleTime,
    MaxPower,
}

impl TuningParam {
    pub const ALL: [Self; 4] = [Self::Gains, Self::Mode, Self::SampleTime, Self::MaxPower];

    /// The tuning parameter behind a characteristic, if it is one.
    pub fn from_characteristic(c: Characteristic) -> Option<Self> {
        match c {
            Characteristic::PidTune => Some(Self::Gains),
            Characteristic::PidMode => Some(Self::Mode),
            Characteristic::PidSampleTime => Some(Self::SampleTime),
            Characteristic::PidMaxPower => Some(Self::MaxPower),
            _ => None,
        }
    }

    pub fn characteristic(self) -> Characteristic {
        match self {
            Self::Gains => Characteristic::PidTune,
            Self::Mode => Characteristic::PidMode,
            Self::SampleTime => Characteristic::PidSampleTime,
            Self::MaxPower => Characteristic::PidMaxPower,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Payload codec
// ───────────────────────────────────────────────────────────────

/// Parse `"p,i,d"`.  Exactly three finite numbers are required; tokens
/// may carry surrounding whitespace.
pub fn parse_gains(text: &str) -> Result<(f64, f64, f64), TuningError> {
    let tokens: Vec<&str> = text.split(',').collect();
    if tokens.len() != 3 {
        return Err(TuningError::WrongTokenCount(tokens.len()));
    }
    let mut gains = [0.0_f64; 3];
    for (slot, token) in gains.iter_mut().zip(&tokens) {
        let v: f64 = token.trim().parse().map_err(|_| TuningError::NotANumber)?;
        if !v.is_finite() {
            return Err(TuningError::NotANumber);
        }
        *slot = v;
    }
    Ok((gains[0], gains[1], gains[2]))
}

/// Parse a decimal integer, ignoring surrounding whitespace.
pub fn parse_int(text: &str) -> Result<i32, TuningError> {
    text.trim().parse().map_err(|_| TuningError::NotAnInteger)
}

/// Gains as the companion app expects them: two decimals each, or the
/// shortest exact form when two decimals would lose precision.
pub fn format_gains(kp: f64, ki: f64, kd: f64) -> String {
    format!("{},{},{}", format_gain(kp), format_gain(ki), format_gain(kd))
}

fn format_gain(v: f64) -> String {
    let short = format!("{v:.2}");
    if short.parse::<f64>() == Ok(v) {
        short
    } else {
        v.to_string()
    }
}

// ───────────────────────────────────────────────────────────────
// TuningService
// ───────────────────────────────────────────────────────────────

struct Inner<C> {
    config: PidConfig,
    control: C,
}

/// Owns the live [`PidConfig`] and the control loop it feeds.
pub struct TuningService<C> {
    inner: Mutex<Inner<C>>,
}

impl<C: ControlLoopPort> TuningService<C> {
    /// Takes ownership of the control loop handle and applies `config` to
    /// it once, so the loop starts from known values.
    pub fn new(config: PidConfig, mut control: C) -> Self {
        config.apply(&mut control);
        Self {
            inner: Mutex::new(Inner { config, control }),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> PidConfig {
        lock_unpoisoned(&self.inner).config
    }

    /// Text served for a read of `param`.
    pub fn read(&self, param: TuningParam) -> String {
        let c = self.config();
        match param {
            TuningParam::Gains => format_gains(c.kp(), c.ki(), c.kd()),
            TuningParam::Mode => c.p_mode().token().to_string(),
            TuningParam::SampleTime => c.sample_time_ms().to_string(),
            TuningParam::MaxPower => c.max_power().to_string(),
        }
    }

    /// Handle a write of `raw` to `param`.
    pub fn write(&self, param: TuningParam, raw: &[u8]) -> Result<(), TuningError> {
        let mut guard = lock_unpoisoned(&self.inner);
        let Inner { config, control } = &mut *guard;

        let mut next = *config;
        let outcome = match param {
            TuningParam::Gains => text(raw, TuningError::NotANumber)
                .and_then(parse_gains)
                .map(|(kp, ki, kd)| next.set_gains(kp, ki, kd)),
            TuningParam::Mode => {
                next.set_p_mode(ProportionalMode::from_token(raw));
                Ok(())
            }
            TuningParam::SampleTime => text(raw, TuningError::NotAnInteger)
                .and_then(parse_int)
                .and_then(|v| next.set_sample_time(v)),
            TuningParam::MaxPower => text(raw, TuningError::NotAnInteger)
                .and_then(parse_int)
                .and_then(|v| next.set_max_power(v)),
        };

        if let Err(e) = outcome {
            warn!("TUNE: {param:?} write rejected: {e}");
            return Err(e);
        }

        *config = next;
        config.apply(control);
        info!(
            "TUNE: applied Kp={} Ki={} Kd={} mode={} sample={}ms max={}%",
            config.kp(),
            config.ki(),
            config.kd(),
            config.p_mode().token(),
            config.sample_time_ms(),
            config.max_power()
        );
        Ok(())
    }
}

fn text(raw: &[u8], err: TuningError) -> Result<&str, TuningError> {
    core::str::from_utf8(raw).map_err(|_| err)
}
