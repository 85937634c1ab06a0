//! GATT layout of the roaster control surface.
//!
//! One static table describes every characteristic the firmware exposes.
//! The Bluedroid adapter walks it at registration time and the domain
//! dispatches inbound reads/writes on [`Characteristic`], so a UUID lives
//! in exactly one place.
//!
//! ## Roaster service (Nordic UART compatible)
//!
//! | Characteristic | UUID                                     | Props          |
//! |----------------|------------------------------------------|----------------|
//! | Command RX     | `6e400002-b5a3-f393-e0a9-e50e24dcca9e`   | Write, WriteNR |
//! | Status TX      | `6e400003-b5a3-f393-e0a9-e50e24dcca9e`   | Notify, Read   |
//! | PID tune       | `6dbf0201-758d-4b5e-bc11-40cfaea42dfe`   | Read, Write    |
//! | PID mode       | `6dbf0202-758d-4b5e-bc11-40cfaea42dfe`   | Read, Write    |
//! | PID sample time| `6dbf0203-758d-4b5e-bc11-40cfaea42dfe`   | Read, Write    |
//! | PID max power  | `6dbf0204-758d-4b5e-bc11-40cfaea42dfe`   | Read, Write    |
//!
//! ## Device information (`0x180A`)
//!
//! `0x2A29` board id, `0x2A28` sketch name, `0x2A26` firmware revision.

use crate::pins;

// ───────────────────────────────────────────────────────────────
// Identifiers
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0x6e400001_b5a3_f393_e0a9_e50e24dcca9e;
pub const CHAR_COMMAND_RX: u128 = 0x6e400002_b5a3_f393_e0a9_e50e24dcca9e;
pub const CHAR_STATUS_TX: u128 = 0x6e400003_b5a3_f393_e0a9_e50e24dcca9e;

pub const CHAR_PID_TUNE: u128 = 0x6dbf0201_758d_4b5e_bc11_40cfaea42dfe;
pub const CHAR_PID_MODE: u128 = 0x6dbf0202_758d_4b5e_bc11_40cfaea42dfe;
pub const CHAR_PID_SAMPLE_TIME: u128 = 0x6dbf0203_758d_4b5e_bc11_40cfaea42dfe;
pub const CHAR_PID_MAX_POWER: u128 = 0x6dbf0204_758d_4b5e_bc11_40cfaea42dfe;

pub const DEVICE_INFO_SERVICE_UUID: u16 = 0x180A;
pub const CHAR_MANUFACTURER_NAME: u16 = 0x2A29;
pub const CHAR_SOFTWARE_REVISION: u16 = 0x2A28;
pub const CHAR_FIRMWARE_REVISION: u16 = 0x2A26;

/// Largest value a client may write (ATT attribute limit).
pub const MAX_ATTR_LEN: usize = 512;

// Characteristic property bits (Bluetooth Core Vol 3, Part G, 3.3.1.1).
pub const PROP_READ: u8 = 0x02;
pub const PROP_WRITE_NR: u8 = 0x04;
pub const PROP_WRITE: u8 = 0x08;
pub const PROP_NOTIFY: u8 = 0x10;

/// A 16- or 128-bit attribute UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uuid {
    Short(u16),
    Long(u128),
}

impl Uuid {
    /// Little-endian 128-bit form (16-bit UUIDs expanded onto the base UUID).
    pub fn to_le_bytes(self) -> [u8; 16] {
        match self {
            Self::Long(v) => v.to_le_bytes(),
            Self::Short(v) => {
                const BASE: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;
                (BASE | (u128::from(v) << 96)).to_le_bytes()
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Characteristic table
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Roaster,
    DeviceInfo,
}

impl Service {
    pub fn uuid(self) -> Uuid {
        match self {
            Self::Roaster => Uuid::Long(SERVICE_UUID),
            Self::DeviceInfo => Uuid::Short(DEVICE_INFO_SERVICE_UUID),
        }
    }
}

/// Every characteristic the firmware serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Characteristic {
    CommandRx,
    StatusTx,
    PidTune,
    PidMode,
    PidSampleTime,
    PidMaxPower,
    BoardId,
    SketchName,
    FirmwareRevision,
}

/// Static description of one characteristic.
#[derive(Debug, Clone, Copy)]
pub struct CharacteristicDef {
    pub kind: Characteristic,
    pub service: Service,
    pub uuid: Uuid,
    pub props: u8,
    /// Human-readable hint attached as a descriptor.  The companion app
    /// looks it up under the characteristic's own UUID.
    pub descriptor: Option<&'static str>,
}

impl CharacteristicDef {
    pub fn readable(&self) -> bool {
        self.props & PROP_READ != 0
    }

    pub fn writable(&self) -> bool {
        self.props & (PROP_WRITE | PROP_WRITE_NR) != 0
    }

    pub fn notifies(&self) -> bool {
        self.props & PROP_NOTIFY != 0
    }
}

pub const CHARACTERISTIC_COUNT: usize = 9;

pub static CHARACTERISTICS: [CharacteristicDef; CHARACTERISTIC_COUNT] = [
    CharacteristicDef {
        kind: Characteristic::StatusTx,
        service: Service::Roaster,
        uuid: Uuid::Long(CHAR_STATUS_TX),
        props: PROP_NOTIFY | PROP_READ,
        descriptor: None,
    },
    CharacteristicDef {
        kind: Characteristic::CommandRx,
        service: Service::Roaster,
        uuid: Uuid::Long(CHAR_COMMAND_RX),
        props: PROP_WRITE | PROP_WRITE_NR,
        descriptor: None,
    },
    CharacteristicDef {
        kind: Characteristic::PidTune,
        service: Service::Roaster,
        uuid: Uuid::Long(CHAR_PID_TUNE),
        props: PROP_READ | PROP_WRITE,
        descriptor: Some("PID Tune: p.pp,i.ii,d.dd"),
    },
    CharacteristicDef {
        kind: Characteristic::PidMode,
        service: Service::Roaster,
        uuid: Uuid::Long(CHAR_PID_MODE),
        props: PROP_READ | PROP_WRITE,
        descriptor: Some("PID Mode: P_ON_M | P_ON_E"),
    },
    CharacteristicDef {
        kind: Characteristic::PidSampleTime,
        service: Service::Roaster,
        uuid: Uuid::Long(CHAR_PID_SAMPLE_TIME),
        props: PROP_READ | PROP_WRITE,
        descriptor: Some("PID Sample Time: iiii (ms)"),
    },
    CharacteristicDef {
        kind: Characteristic::PidMaxPower,
        service: Service::Roaster,
        uuid: Uuid::Long(CHAR_PID_MAX_POWER),
        props: PROP_READ | PROP_WRITE,
        descriptor: Some("PID Max Power: 0-100 (%)"),
    },
    CharacteristicDef {
        kind: Characteristic::BoardId,
        service: Service::DeviceInfo,
        uuid: Uuid::Short(CHAR_MANUFACTURER_NAME),
        props: PROP_READ,
        descriptor: None,
    },
    CharacteristicDef {
        kind: Characteristic::SketchName,
        service: Service::DeviceInfo,
        uuid: Uuid::Short(CHAR_SOFTWARE_REVISION),
        props: PROP_READ,
        descriptor: None,
    },
    CharacteristicDef {
        kind: Characteristic::FirmwareRevision,
        service: Service::DeviceInfo,
        uuid: Uuid::Short(CHAR_FIRMWARE_REVISION),
        props: PROP_READ,
        descriptor: None,
    },
];

impl Characteristic {
    pub fn def(self) -> &'static CharacteristicDef {
        let idx = match self {
            Self::StatusTx => 0,
            Self::CommandRx => 1,
            Self::PidTune => 2,
            Self::PidMode => 3,
            Self::PidSampleTime => 4,
            Self::PidMaxPower => 5,
            Self::BoardId => 6,
            Self::SketchName => 7,
            Self::FirmwareRevision => 8,
        };
        &CHARACTERISTICS[idx]
    }

    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        CHARACTERISTICS.iter().find(|d| d.uuid == uuid).map(|d| d.kind)
    }
}

/// Characteristics of one service, in registration order.
pub fn service_characteristics(service: Service) -> impl Iterator<Item = &'static CharacteristicDef> {
    CHARACTERISTICS.iter().filter(move |d| d.service == service)
}

// ───────────────────────────────────────────────────────────────
// Device information
// ───────────────────────────────────────────────────────────────

/// Static identification served under `0x180A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub board_id: &'static str,
    pub sketch_name: &'static str,
    pub firmware_version: &'static str,
}

impl DeviceInfo {
    /// Identity of this build on the selected board.
    pub const fn current() -> Self {
        Self {
            board_id: pins::BOARD.id,
            sketch_name: env!("CARGO_PKG_NAME"),
            firmware_version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Value of a device-information characteristic, `None` for others.
    pub fn value(&self, kind: Characteristic) -> Option<String> {
        match kind {
            Characteristic::BoardId => Some(self.board_id.to_string()),
            Characteristic::SketchName => Some(self.sketch_name.to_string()),
            Characteristic::FirmwareRevision => {
                Some(format!("{} {}", self.sketch_name, self.firmware_version))
            }
            _ => None,
        }
    }
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self::current()
    }
}
