//! Application service: the hexagonal core.
//!
//! [`RoasterLink`] is the single context object the bootstrap builds and
//! hands to the BLE callbacks.  It owns the tuning model, the command
//! queue, the link state and the status channel, and routes every GATT
//! access by [`Characteristic`].
//!
//! ```text
//!  BLE stack ──▶ ┌──────────────────────────────┐ ──▶ ControlLoopPort
//!  (callbacks)   │          RoasterLink          │
//!                │ Tuning · Commands · Link · Tx │ ──▶ LinkControlPort
//!  Roast loop ◀──│                              │ ──▶ NotifyPort
//!                └──────────────────────────────┘
//! ```
//!
//! All methods take `&self`; the struct is `Sync` whenever the control
//! loop and radio handles are `Send`, so the BLE task and the roast loop
//! can share it behind an `Arc` or a `static`.

use std::sync::Mutex;

use log::{debug, info, warn};

use crate::app::commands::{CommandQueue, Ingress};
use crate::app::connection::ConnectionManager;
use crate::app::lock_unpoisoned;
use crate::app::notify::NotificationChannel;
use crate::app::ports::{ControlLoopPort, LinkControlPort, NotifyPort};
use crate::app::tuning::{TuningParam, TuningService};
use crate::config::FirmwareConfig;
use crate::control::pid_config::PidConfig;
use crate::error::{GattError, LinkError, Result};
use crate::gatt::{Characteristic, DeviceInfo, MAX_ATTR_LEN, Uuid};

// ───────────────────────────────────────────────────────────────
// RoasterLink
// ───────────────────────────────────────────────────────────────

pub struct RoasterLink<C, R> {
    config: FirmwareConfig,
    tuning: TuningService<C>,
    commands: CommandQueue,
    connection: ConnectionManager,
    notifier: NotificationChannel,
    radio: Mutex<R>,
    device_info: DeviceInfo,
}

impl<C, R> RoasterLink<C, R>
where
    C: ControlLoopPort,
    R: LinkControlPort + NotifyPort,
{
    /// Build the context.  `pid` is applied to `control` immediately.
    ///
    /// Does **not** touch the radio; call [`start`](Self::start) next.
    pub fn new(config: FirmwareConfig, pid: PidConfig, control: C, radio: R) -> Self {
        Self {
            tuning: TuningService::new(pid, control),
            commands: CommandQueue::with_limit(config.command_queue_limit),
            connection: ConnectionManager::new(config.conn_params),
            notifier: NotificationChannel::new(),
            radio: Mutex::new(radio),
            device_info: DeviceInfo::current(),
            config,
        }
    }

    /// Override the identification served under the device-info service.
    pub fn with_device_info(mut self, info: DeviceInfo) -> Self {
        self.device_info = info;
        self
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start advertising.  Failure is fatal to the bootstrap.
    pub fn start(&self) -> core::result::Result<(), LinkError> {
        info!("BLE: starting as '{}'", self.config.device_name);
        self.connection.start(&mut *lock_unpoisoned(&self.radio))
    }

    pub fn on_connect(&self, conn_handle: u16) {
        self.connection
            .on_link_established(conn_handle, &mut *lock_unpoisoned(&self.radio));
    }

    pub fn on_disconnect(&self, conn_handle: u16, reason: i32) {
        // Logged by the connection manager.
        let _ = self
            .connection
            .on_link_lost(conn_handle, reason, &mut *lock_unpoisoned(&self.radio));
    }

    /// Record the attribute handle assigned to the status characteristic.
    pub fn bind_status_handle(&self, attr_handle: u16) {
        self.notifier.bind_tx(attr_handle);
    }

    // ── Inbound GATT access ───────────────────────────────────

    /// Route a client write.  Errors are for logging only; the client
    /// never sees them.
    pub fn on_write(&self, characteristic: Characteristic, raw: &[u8]) -> Result<()> {
        if !characteristic.def().writable() {
            return Err(GattError::NotWritable.into());
        }
        // Mode has no invalid payload: anything but `P_ON_E` selects P_ON_M.
        if raw.len() > MAX_ATTR_LEN && characteristic != Characteristic::PidMode {
            return Err(GattError::DataTooLong.into());
        }

        if characteristic == Characteristic::CommandRx {
            if let Ingress::Queued(depth) = self.commands.on_command_write(raw)? {
                debug!("CMD: {depth} pending");
            }
            return Ok(());
        }

        match TuningParam::from_characteristic(characteristic) {
            Some(param) => Ok(self.tuning.write(param, raw)?),
            None => Err(GattError::NotWritable.into()),
        }
    }

    /// Same as [`on_write`](Self::on_write), addressed by UUID.
    pub fn on_write_uuid(&self, uuid: Uuid, raw: &[u8]) -> Result<()> {
        let c = Characteristic::from_uuid(uuid).ok_or(GattError::UnknownCharacteristic)?;
        self.on_write(c, raw)
    }

    /// Value served for a client read.
    pub fn on_read(&self, characteristic: Characteristic) -> Result<String> {
        if !characteristic.def().readable() {
            return Err(GattError::NotReadable.into());
        }
        if characteristic == Characteristic::StatusTx {
            return Ok(self.notifier.last_value());
        }
        if let Some(param) = TuningParam::from_characteristic(characteristic) {
            return Ok(self.tuning.read(param));
        }
        self.device_info
            .value(characteristic)
            .ok_or_else(|| GattError::NotReadable.into())
    }

    // ── Control-loop side ─────────────────────────────────────

    /// Send a status message to the connected peer.  Non-fatal: a failure
    /// is logged and returned, never retried.
    pub fn notify(&self, message: &str) -> core::result::Result<(), LinkError> {
        self.notifier
            .notify(&self.connection, &mut *lock_unpoisoned(&self.radio), message)
    }

    /// Next pending command, oldest first.
    pub fn next_command(&self) -> Option<String> {
        self.commands.dequeue()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn pid_config(&self) -> PidConfig {
        self.tuning.config()
    }

    pub fn commands(&self) -> &CommandQueue {
        &self.commands
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Run `f` with exclusive access to the radio.
    pub fn with_radio<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        f(&mut lock_unpoisoned(&self.radio))
    }
}

/// Log and swallow a GATT-boundary error.
pub fn log_rejected(characteristic: Characteristic, result: Result<()>) {
    if let Err(e) = result {
        warn!("BLE: {characteristic:?} write ignored: {e}");
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
