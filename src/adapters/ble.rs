//! BLE radio adapter.
//!
//! Implements [`LinkControlPort`] and [`NotifyPort`] and feeds GATT events
//! into the [`RoasterLink`](crate::app::service::RoasterLink) context.
//!
//! ## cfg gating
//!
//! - **`feature = "espidf"`**: Bluedroid GATT server via raw `esp_idf_svc::sys`
//!   calls.  The attribute table is registered from
//!   [`CHARACTERISTICS`](crate::gatt::CHARACTERISTICS) one
//!   entry at a time as Bluedroid acknowledges each step.
//! - **otherwise**: [`SimRadio`], an in-memory radio that records every
//!   request for host-side tests.

#[cfg(feature = "espidf")]
pub use self::esp::*;

use log::info;

use crate::app::ports::{LinkControlPort, NotifyPort};
use crate::config::ConnParams;
use crate::error::LinkError;

// ───────────────────────────────────────────────────────────────
// Simulation radio (host)
// ───────────────────────────────────────────────────────────────

/// A notification as it would have gone over the air.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub conn_handle: u16,
    pub attr_handle: u16,
    pub payload: Vec<u8>,
}

/// Host stand-in for the Bluedroid radio.
#[derive(Debug, Default)]
pub struct SimRadio {
    advertising: bool,
    pub adverts_started: u32,
    pub param_requests: Vec<(u16, ConnParams)>,
    pub notifications: Vec<SentNotification>,
    /// Make the next advertising start fail with this code.
    pub fail_advertising: Option<i32>,
    /// Make every notification fail with this code.
    pub fail_notify: Option<i32>,
}

impl SimRadio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_advertising(&self) -> bool {
        self.advertising
    }

    /// A central tries to connect.  Only succeeds while advertising; the
    /// controller stops advertising once the link is up.
    pub fn accept_central(&mut self) -> bool {
        core::mem::replace(&mut self.advertising, false)
    }

    /// Payloads sent so far, as text.
    pub fn sent_text(&self) -> Vec<String> {
        self.notifications
            .iter()
            .map(|n| String::from_utf8_lossy(&n.payload).into_owned())
            .collect()
    }
}

impl LinkControlPort for SimRadio {
    fn start_advertising(&mut self) -> Result<(), LinkError> {
        if let Some(rc) = self.fail_advertising.take() {
            return Err(LinkError::AdvertisingFailed(rc));
        }
        self.advertising = true;
        self.adverts_started += 1;
        info!("BLE(sim): advertising");
        Ok(())
    }

    fn update_conn_params(&mut self, conn_handle: u16, params: &ConnParams) -> Result<(), LinkError> {
        self.param_requests.push((conn_handle, *params));
        Ok(())
    }
}

impl NotifyPort for SimRadio {
    fn notify(&mut self, conn_handle: u16, attr_handle: u16, payload: &[u8]) -> Result<(), LinkError> {
        if let Some(rc) = self.fail_notify {
            return Err(LinkError::NotifyFailed(rc));
        }
        self.notifications.push(SentNotification {
            conn_handle,
            attr_handle,
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Bluedroid GATT server (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(feature = "espidf")]
mod esp {
    use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};
    use std::ffi::CString;
    use std::sync::{Mutex, OnceLock};
    use std::time::{Duration, Instant};

    use esp_idf_svc::sys::*;
    use log::{debug, error, info, warn};

    use super::{LinkControlPort, NotifyPort};
    use crate::app::lock_unpoisoned;
    use crate::app::service::{RoasterLink, log_rejected};
    use crate::config::ConnParams;
    use crate::control::loop_params::SharedLoopParameters;
    use crate::error::LinkError;
    use crate::gatt::{
        CHARACTERISTIC_COUNT, CHARACTERISTICS, Characteristic, CharacteristicDef, MAX_ATTR_LEN,
        SERVICE_UUID, Uuid,
    };

    /// The context the GATT callbacks dispatch into.
    pub type BleLink = RoasterLink<SharedLoopParameters, BluedroidRadio>;

    const CCCD_UUID: u16 = 0x2902;
    const LOCAL_MTU: u16 = 517;
    /// Advertising interval bounds, 0.625 ms units (20-40 ms).
    const ADV_INT_MIN: u16 = 0x20;
    const ADV_INT_MAX: u16 = 0x40;

    // ── Static state bridging the C callbacks ─────────────────
    //
    // Bluedroid callbacks are C function pointers that cannot capture Rust
    // closures. These statics bridge the callback context to the adapter.

    static LINK: OnceLock<BleLink> = OnceLock::new();
    static GATTS_IF: AtomicU32 = AtomicU32::new(ESP_GATT_IF_NONE);
    static REGISTERED: AtomicBool = AtomicBool::new(false);
    static ATTR_HANDLES: [AtomicU16; CHARACTERISTIC_COUNT] =
        [const { AtomicU16::new(0) }; CHARACTERISTIC_COUNT];
    static PEER_BDA: Mutex<esp_bd_addr_t> = Mutex::new([0; 6]);
    static REGISTRATION: Mutex<Registration> = Mutex::new(Registration::new());

    /// Hand the context to the callbacks.  Only the first call wins.
    pub fn install(link: BleLink) -> anyhow::Result<&'static BleLink> {
        if LINK.set(link).is_err() {
            anyhow::bail!("BLE context already installed");
        }
        LINK.get().ok_or_else(|| anyhow::anyhow!("BLE context missing"))
    }

    /// Attribute handle assigned to `kind`, once registered.
    pub fn attr_handle(kind: Characteristic) -> Option<u16> {
        let idx = CHARACTERISTICS.iter().position(|d| d.kind == kind)?;
        match ATTR_HANDLES[idx].load(Ordering::Acquire) {
            0 => None,
            h => Some(h),
        }
    }

    fn characteristic_at(handle: u16) -> Option<Characteristic> {
        ATTR_HANDLES
            .iter()
            .position(|h| h.load(Ordering::Acquire) == handle)
            .map(|i| CHARACTERISTICS[i].kind)
    }

    fn esp_check(rc: esp_err_t) -> Result<(), i32> {
        if rc == ESP_OK as esp_err_t { Ok(()) } else { Err(rc) }
    }

    fn to_esp_uuid(uuid: Uuid) -> esp_bt_uuid_t {
        // SAFETY: plain C struct, all-zero is a valid bit pattern.
        let mut t: esp_bt_uuid_t = unsafe { core::mem::zeroed() };
        match uuid {
            Uuid::Short(v) => {
                t.len = ESP_UUID_LEN_16 as u16;
                t.uuid.uuid16 = v;
            }
            Uuid::Long(v) => {
                t.len = ESP_UUID_LEN_128 as u16;
                t.uuid.uuid128 = v.to_le_bytes();
            }
        }
        t
    }

    // ── Radio ─────────────────────────────────────────────────

    /// Bluedroid-backed radio.  Link state lives in the stack itself.
    pub struct BluedroidRadio;

    /// Register callbacks and the GATT application.  The Bluedroid stack
    /// must already be enabled (`BtDriver<Ble>`).
    pub fn bring_up(device_name: &str) -> anyhow::Result<()> {
        let name = CString::new(device_name)?;
        // SAFETY: callbacks are `'static` fns; called once from main.
        unsafe {
            esp!(esp_ble_gap_register_callback(Some(gap_event_handler)))?;
            esp!(esp_ble_gatts_register_callback(Some(gatts_event_handler)))?;
            esp!(esp_ble_gap_set_device_name(name.as_ptr()))?;
            esp!(esp_ble_gatt_set_local_mtu(LOCAL_MTU))?;
            esp!(esp_ble_gatts_app_register(0))?;
        }
        info!("BLE: GATT application registered as '{}'", device_name);
        Ok(())
    }

    /// Block until every characteristic has a handle.
    pub fn wait_registered(timeout: Duration) -> anyhow::Result<()> {
        let start = Instant::now();
        while !REGISTERED.load(Ordering::Acquire) {
            if start.elapsed() > timeout {
                anyhow::bail!("GATT registration timed out");
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(())
    }

    impl LinkControlPort for BluedroidRadio {
        fn start_advertising(&mut self) -> Result<(), LinkError> {
            let mut params = esp_ble_adv_params_t {
                adv_int_min: ADV_INT_MIN,
                adv_int_max: ADV_INT_MAX,
                adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
                own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
                channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
                adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
                // SAFETY: remaining fields (peer address) are unused for ADV_IND.
                ..unsafe { core::mem::zeroed() }
            };
            // SAFETY: params outlives the call; the stack copies it.
            esp_check(unsafe { esp_ble_gap_start_advertising(&mut params) })
                .map_err(LinkError::AdvertisingFailed)
        }

        fn update_conn_params(&mut self, _conn_handle: u16, p: &ConnParams) -> Result<(), LinkError> {
            let mut req = esp_ble_conn_update_params_t {
                bda: *lock_unpoisoned(&PEER_BDA),
                min_int: p.min_interval,
                max_int: p.max_interval,
                latency: p.latency,
                timeout: p.supervision_timeout,
            };
            // SAFETY: req outlives the call; the stack copies it.
            esp_check(unsafe { esp_ble_gap_update_conn_params(&mut req) })
                .map_err(LinkError::ConnParamsRejected)
        }
    }

    impl NotifyPort for BluedroidRadio {
        fn notify(&mut self, conn_handle: u16, attr_handle: u16, payload: &[u8]) -> Result<(), LinkError> {
            let gatts_if = GATTS_IF.load(Ordering::Acquire);
            if gatts_if == ESP_GATT_IF_NONE {
                return Err(LinkError::TxUnavailable);
            }
            // SAFETY: the stack copies `payload` before returning.
            esp_check(unsafe {
                esp_ble_gatts_send_indicate(
                    gatts_if as esp_gatt_if_t,
                    conn_handle,
                    attr_handle,
                    payload.len() as u16,
                    payload.as_ptr().cast_mut(),
                    false,
                )
            })
            .map_err(LinkError::NotifyFailed)
        }
    }

    // ── Attribute table registration ──────────────────────────
    //
    // Bluedroid adds attributes asynchronously: each add is acknowledged by
    // an event, and only then may the next one be issued.

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Pending {
        Service,
        Characteristic,
        Cccd,
        Descriptor,
    }

    struct Registration {
        cursor: usize,
        svc_handle: u16,
        pending: Pending,
    }

    impl Registration {
        const fn new() -> Self {
            Self {
                cursor: 0,
                svc_handle: 0,
                pending: Pending::Service,
            }
        }

        fn current(&self) -> &'static CharacteristicDef {
            &CHARACTERISTICS[self.cursor]
        }

        fn create_service(&mut self, gatts_if: esp_gatt_if_t) {
            let service = self.current().service;
            let handles = 1 + crate::gatt::service_characteristics(service)
                .map(|d| 2 + u16::from(d.notifies()) + u16::from(d.descriptor.is_some()))
                .sum::<u16>();
            let mut id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: to_esp_uuid(service.uuid()),
                    inst_id: 0,
                },
                is_primary: true,
            };
            self.pending = Pending::Service;
            // SAFETY: id outlives the call.
            let rc = unsafe { esp_ble_gatts_create_service(gatts_if, &mut id, handles) };
            if let Err(rc) = esp_check(rc) {
                error!("BLE: create service {:?} failed ({})", service, rc);
            }
        }

        fn add_characteristic(&mut self) {
            let def = self.current();
            let mut perm = 0;
            if def.readable() {
                perm |= ESP_GATT_PERM_READ;
            }
            if def.writable() {
                perm |= ESP_GATT_PERM_WRITE;
            }
            let mut uuid = to_esp_uuid(def.uuid);
            self.pending = Pending::Characteristic;
            // SAFETY: uuid outlives the call; NULL control means the
            // application answers reads and writes itself.
            let rc = unsafe {
                esp_ble_gatts_add_char(
                    self.svc_handle,
                    &mut uuid,
                    perm as esp_gatt_perm_t,
                    def.props as esp_gatt_char_prop_t,
                    core::ptr::null_mut(),
                    core::ptr::null_mut(),
                )
            };
            if let Err(rc) = esp_check(rc) {
                error!("BLE: add {:?} failed ({})", def.kind, rc);
            }
        }

        fn add_descriptor(&mut self, uuid: Uuid, perm: u32, value: &[u8], pending: Pending) {
            let mut uuid = to_esp_uuid(uuid);
            let mut val = esp_attr_value_t {
                attr_max_len: value.len() as u16,
                attr_len: value.len() as u16,
                attr_value: value.as_ptr().cast_mut(),
            };
            let mut control = esp_attr_control_t {
                auto_rsp: ESP_GATT_AUTO_RSP as u8,
            };
            self.pending = pending;
            // SAFETY: all pointers outlive the call; the stack copies the value.
            let rc = unsafe {
                esp_ble_gatts_add_char_descr(
                    self.svc_handle,
                    &mut uuid,
                    perm as esp_gatt_perm_t,
                    &mut val,
                    &mut control,
                )
            };
            if let Err(rc) = esp_check(rc) {
                error!("BLE: add descriptor for {:?} failed ({})", self.current().kind, rc);
            }
        }

        /// Hint text, filed under the characteristic's own UUID.
        fn add_text_descriptor_or_advance(&mut self, gatts_if: esp_gatt_if_t) {
            let def = self.current();
            match def.descriptor {
                Some(text) => {
                    self.add_descriptor(def.uuid, ESP_GATT_PERM_READ, text.as_bytes(), Pending::Descriptor);
                }
                None => self.advance(gatts_if),
            }
        }

        fn advance(&mut self, gatts_if: esp_gatt_if_t) {
            let service = self.current().service;
            self.cursor += 1;
            if self.cursor == CHARACTERISTIC_COUNT {
                REGISTERED.store(true, Ordering::Release);
                info!("BLE: attribute table complete");
            } else if self.current().service != service {
                self.create_service(gatts_if);
            } else {
                self.add_characteristic();
            }
        }

        fn on_service_created(&mut self, svc_handle: u16) {
            self.svc_handle = svc_handle;
            // SAFETY: handle comes straight from the CREATE event.
            if let Err(rc) = esp_check(unsafe { esp_ble_gatts_start_service(svc_handle) }) {
                error!("BLE: start service failed ({})", rc);
            }
            self.add_characteristic();
        }

        fn on_characteristic_added(&mut self, attr_handle: u16, gatts_if: esp_gatt_if_t) {
            let def = self.current();
            ATTR_HANDLES[self.cursor].store(attr_handle, Ordering::Release);
            debug!("BLE: {:?} -> handle {}", def.kind, attr_handle);
            if def.notifies() {
                self.add_descriptor(
                    Uuid::Short(CCCD_UUID),
                    ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE,
                    &[0, 0],
                    Pending::Cccd,
                );
            } else {
                self.add_text_descriptor_or_advance(gatts_if);
            }
        }

        fn on_descriptor_added(&mut self, gatts_if: esp_gatt_if_t) {
            match self.pending {
                Pending::Cccd => self.add_text_descriptor_or_advance(gatts_if),
                _ => self.advance(gatts_if),
            }
        }
    }

    // ── Callbacks ─────────────────────────────────────────────

    unsafe extern "C" fn gap_event_handler(event: esp_gap_ble_cb_event_t, param: *mut esp_ble_gap_cb_param_t) {
        // SAFETY: Bluedroid passes a valid parameter block for the duration
        // of the callback.
        let Some(param) = (unsafe { param.as_ref() }) else {
            return;
        };
        match event {
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
                // SAFETY: union member matches the event.
                let status = unsafe { param.adv_start_cmpl.status };
                if status == esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                    debug!("BLE GAP: advertising started");
                } else {
                    warn!("BLE GAP: advertising start failed (status={})", status);
                }
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_UPDATE_CONN_PARAMS_EVT => {
                // SAFETY: union member matches the event.
                let p = unsafe { &param.update_conn_params };
                info!(
                    "BLE GAP: conn params status={} interval={} latency={} timeout={}",
                    p.status, p.conn_int, p.latency, p.timeout
                );
            }
            _ => {}
        }
    }

    unsafe extern "C" fn gatts_event_handler(
        event: esp_gatts_cb_event_t,
        gatts_if: esp_gatt_if_t,
        param: *mut esp_ble_gatts_cb_param_t,
    ) {
        // SAFETY: Bluedroid passes a valid parameter block for the duration
        // of the callback.
        let Some(param) = (unsafe { param.as_ref() }) else {
            return;
        };
        // SAFETY: each arm reads the union member documented for its event.
        unsafe {
            match event {
                esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => on_registered(gatts_if),
                esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
                    lock_unpoisoned(&REGISTRATION).on_service_created(param.create.service_handle);
                }
                esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
                    lock_unpoisoned(&REGISTRATION).on_characteristic_added(param.add_char.attr_handle, gatts_if);
                }
                esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
                    lock_unpoisoned(&REGISTRATION).on_descriptor_added(gatts_if);
                }
                esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
                    let p = &param.connect;
                    *lock_unpoisoned(&PEER_BDA) = p.remote_bda;
                    if let Some(link) = LINK.get() {
                        link.on_connect(p.conn_id);
                    }
                }
                esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
                    let p = &param.disconnect;
                    if let Some(link) = LINK.get() {
                        link.on_disconnect(p.conn_id, p.reason as i32);
                    }
                }
                esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => on_write(gatts_if, &param.write),
                esp_gatts_cb_event_t_ESP_GATTS_READ_EVT => on_read(gatts_if, &param.read),
                esp_gatts_cb_event_t_ESP_GATTS_MTU_EVT => {
                    debug!("BLE GATTS: MTU {}", param.mtu.mtu);
                }
                _ => {}
            }
        }
    }

    fn on_registered(gatts_if: esp_gatt_if_t) {
        GATTS_IF.store(u32::from(gatts_if), Ordering::Release);
        info!("BLE GATTS: app registered (if={})", gatts_if);
        configure_advertising_data();
        lock_unpoisoned(&REGISTRATION).create_service(gatts_if);
    }

    /// Name in the advertisement, service UUID in the scan response
    /// (both will not fit in 31 bytes).
    fn configure_advertising_data() {
        let mut uuid = SERVICE_UUID.to_le_bytes();
        // SAFETY: plain C struct, all-zero is a valid bit pattern.
        let mut adv: esp_ble_adv_data_t = unsafe { core::mem::zeroed() };
        adv.include_name = true;
        adv.flag = (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8;
        let mut rsp = adv;
        rsp.set_scan_rsp = true;
        rsp.include_name = false;
        rsp.service_uuid_len = uuid.len() as u16;
        rsp.p_service_uuid = uuid.as_mut_ptr();
        // SAFETY: the stack deep-copies both blocks before returning.
        unsafe {
            if let Err(rc) = esp_check(esp_ble_gap_config_adv_data(&mut adv)) {
                error!("BLE: adv data rejected ({})", rc);
            }
            if let Err(rc) = esp_check(esp_ble_gap_config_adv_data(&mut rsp)) {
                error!("BLE: scan response rejected ({})", rc);
            }
        }
    }

    fn respond(gatts_if: esp_gatt_if_t, conn_id: u16, trans_id: u32, status: esp_gatt_status_t, rsp: *mut esp_gatt_rsp_t) {
        // SAFETY: rsp is either NULL or points at a live response block.
        let rc = unsafe { esp_ble_gatts_send_response(gatts_if, conn_id, trans_id, status, rsp) };
        if let Err(rc) = esp_check(rc) {
            warn!("BLE GATTS: response failed ({})", rc);
        }
    }

    fn on_write(gatts_if: esp_gatt_if_t, p: &esp_ble_gatts_cb_param_t_gatts_write_evt_param) {
        if p.is_prep {
            // Values never exceed one ATT write; queued writes are refused.
            if p.need_rsp {
                respond(gatts_if, p.conn_id, p.trans_id, esp_gatt_status_t_ESP_GATT_REQ_NOT_SUPPORTED, core::ptr::null_mut());
            }
            return;
        }

        let data: &[u8] = if p.value.is_null() {
            &[]
        } else {
            // SAFETY: Bluedroid guarantees `len` readable bytes at `value`.
            unsafe { core::slice::from_raw_parts(p.value, usize::from(p.len)) }
        };
        match (characteristic_at(p.handle), LINK.get()) {
            (Some(kind), Some(link)) => log_rejected(kind, link.on_write(kind, data)),
            _ => debug!("BLE GATTS: write to unmapped handle {}", p.handle),
        }

        // The protocol has no error channel: every write is acknowledged.
        if p.need_rsp {
            respond(gatts_if, p.conn_id, p.trans_id, esp_gatt_status_t_ESP_GATT_OK, core::ptr::null_mut());
        }
    }

    fn on_read(gatts_if: esp_gatt_if_t, p: &esp_ble_gatts_cb_param_t_gatts_read_evt_param) {
        if !p.need_rsp {
            return;
        }
        let value = match (characteristic_at(p.handle), LINK.get()) {
            (Some(kind), Some(link)) => link.on_read(kind).unwrap_or_else(|e| {
                warn!("BLE: {:?} read failed: {}", kind, e);
                String::new()
            }),
            _ => String::new(),
        };

        // SAFETY: plain C union, all-zero is a valid bit pattern.
        let mut rsp: esp_gatt_rsp_t = unsafe { core::mem::zeroed() };
        // SAFETY: attr_value is the member used for read responses.
        let attr = unsafe { &mut rsp.attr_value };
        let bytes = value.as_bytes();
        let offset = usize::from(p.offset).min(bytes.len());
        let chunk = &bytes[offset..];
        let n = chunk.len().min(attr.value.len()).min(MAX_ATTR_LEN);
        attr.value[..n].copy_from_slice(&chunk[..n]);
        attr.handle = p.handle;
        attr.offset = p.offset;
        attr.len = n as u16;
        respond(gatts_if, p.conn_id, p.trans_id, esp_gatt_status_t_ESP_GATT_OK, &mut rsp);
    }

}
