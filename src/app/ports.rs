//! Port traits: the hexagonal boundary between the link core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ RoasterLink (domain)
//! ```
//!
//! The BLE stack adapter implements the radio ports, the roast loop
//! implements (or is fed by) [`ControlLoopPort`], and the lamp driver sits
//! behind [`IndicatorPort`].  The domain never touches Bluedroid directly,
//! so every path is testable on the host with recording mocks.

use crate::config::ConnParams;
use crate::control::pid_config::ProportionalMode;
use crate::error::LinkError;

// ───────────────────────────────────────────────────────────────
// Control loop port (driven adapter: domain → temperature loop)
// ───────────────────────────────────────────────────────────────

/// Receives tuning parameters.  Mirrors the three calls a PID library
/// exposes; [`PidConfig::apply`](crate::control::pid_config::PidConfig::apply)
/// always issues all three together.
pub trait ControlLoopPort {
    fn set_tunings(&mut self, kp: f64, ki: f64, kd: f64, mode: ProportionalMode);
    fn set_sample_time(&mut self, sample_time_ms: u32);
    fn set_output_limits(&mut self, min: f64, max: f64);
}

// ───────────────────────────────────────────────────────────────
// Radio ports (driven adapter: domain → BLE stack)
// ───────────────────────────────────────────────────────────────

/// Link-layer control: discoverability and per-connection timing.
pub trait LinkControlPort {
    /// (Re)start connectable advertising.
    fn start_advertising(&mut self) -> Result<(), LinkError>;

    /// Ask the central to switch `conn_handle` to `params`.
    fn update_conn_params(&mut self, conn_handle: u16, params: &ConnParams)
    -> Result<(), LinkError>;
}

/// Outbound GATT notifications.
pub trait NotifyPort {
    /// Send `payload` as a single notification on `attr_handle`.
    fn notify(&mut self, conn_handle: u16, attr_handle: u16, payload: &[u8])
    -> Result<(), LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → status lamp)
// ───────────────────────────────────────────────────────────────

pub trait IndicatorPort {
    fn set_rgb(&mut self, r: u8, g: u8, b: u8);
}
