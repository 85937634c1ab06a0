//! Firmware configuration parameters
//!
//! Link-layer and housekeeping settings for the roaster control surface.
//! PID tuning is *not* part of this struct; it lives in
//! [`PidConfig`](crate::control::pid_config::PidConfig) and is changed over BLE.

use serde::{Deserialize, Serialize};

/// Default BLE advertising name (kept for companion-app discovery).
pub const DEFAULT_DEVICE_NAME: &str = "ESP32_Skycommand_NimBLE";

/// Connection parameters requested from the central after it connects.
///
/// Units follow the BLE link layer: intervals in 1.25 ms steps, supervision
/// timeout in 10 ms steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnParams {
    pub min_interval: u16,
    pub max_interval: u16,
    /// Peripheral latency (connection events the peripheral may skip).
    pub latency: u16,
    pub supervision_timeout: u16,
}

impl ConnParams {
    /// Interval bounds 15–30 ms, latency 4, timeout 5 s.
    ///
    /// Chosen to fall inside the window iOS centrals accept without
    /// renegotiating.
    pub const MOBILE: Self = Self {
        min_interval: 12,
        max_interval: 24,
        latency: 4,
        supervision_timeout: 500,
    };

    pub fn min_interval_ms(&self) -> f32 {
        self.min_interval as f32 * 1.25
    }

    pub fn max_interval_ms(&self) -> f32 {
        self.max_interval as f32 * 1.25
    }

    pub fn supervision_timeout_ms(&self) -> u32 {
        self.supervision_timeout as u32 * 10
    }
}

impl Default for ConnParams {
    fn default() -> Self {
        Self::MOBILE
    }
}

/// Core firmware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareConfig {
    // --- BLE ---
    /// Advertised local name (29 bytes fit a legacy advertising packet).
    pub device_name: heapless::String<29>,
    /// Parameters requested on every new connection.
    pub conn_params: ConnParams,

    // --- Command ingress ---
    /// Optional bound on queued commands. `None` keeps the queue unbounded;
    /// `Some(n)` drops the oldest command when the n+1-th arrives.
    pub command_queue_limit: Option<usize>,

    // --- Indicator ---
    /// Flip/flop period of the connection status lamp (milliseconds).
    pub indicator_flash_ms: u32,

    // --- Diagnostics ---
    /// Keep serial logging enabled after boot. Off by default: on single-USB
    /// boards the serial port is shared with the roaster link.
    pub serial_log: bool,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        let mut device_name = heapless::String::new();
        let _ = device_name.push_str(DEFAULT_DEVICE_NAME);
        Self {
            device_name,
            conn_params: ConnParams::default(),
            command_queue_limit: None,
            indicator_flash_ms: 1000,
            serial_log: false,
        }
    }
}
