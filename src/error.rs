//! Unified error types for the roaster firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the BLE
//! callback boundary can log any failure uniformly before dropping it.
//! All variants are `Copy`; none of them allocate.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A tuning payload was malformed or a value was out of range.
    Tuning(TuningError),
    /// A link-layer operation (advertising, notify) failed.
    Link(LinkError),
    /// An inbound GATT access could not be routed.
    Gatt(GattError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tuning(e) => write!(f, "tuning: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Gatt(e) => write!(f, "gatt: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tuning errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningError {
    /// Gains payload did not contain exactly three comma-separated tokens.
    WrongTokenCount(usize),
    /// A gain token was not a finite decimal number.
    NotANumber,
    /// An integer payload could not be parsed.
    NotAnInteger,
    /// Sample time must be strictly positive.
    SampleTimeNotPositive(i32),
    /// Max power must lie in `0..=100`.
    MaxPowerOutOfRange(i32),
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongTokenCount(n) => write!(f, "expected 3 gain tokens, got {n}"),
            Self::NotANumber => write!(f, "gain token is not a finite number"),
            Self::NotAnInteger => write!(f, "payload is not an integer"),
            Self::SampleTimeNotPositive(v) => write!(f, "sample time {v} ms must be > 0"),
            Self::MaxPowerOutOfRange(v) => write!(f, "max power {v}% outside 0-100"),
        }
    }
}

impl From<TuningError> for Error {
    fn from(e: TuningError) -> Self {
        Self::Tuning(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No peer is connected.
    NotConnected,
    /// The status characteristic has not been registered yet.
    TxUnavailable,
    /// The radio refused to (re)start advertising.
    AdvertisingFailed(i32),
    /// The radio refused the connection parameter update.
    ConnParamsRejected(i32),
    /// The radio failed to send a notification.
    NotifyFailed(i32),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "no peer connected"),
            Self::TxUnavailable => write!(f, "status characteristic unavailable"),
            Self::AdvertisingFailed(rc) => write!(f, "advertising start failed (rc={rc})"),
            Self::ConnParamsRejected(rc) => write!(f, "conn param update rejected (rc={rc})"),
            Self::NotifyFailed(rc) => write!(f, "notification failed (rc={rc})"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// GATT routing errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GattError {
    /// No characteristic with this UUID is registered.
    UnknownCharacteristic,
    /// The characteristic does not accept writes.
    NotWritable,
    /// The characteristic does not accept reads.
    NotReadable,
    /// The written value exceeds the attribute size limit.
    DataTooLong,
    /// The written value is not valid UTF-8.
    InvalidUtf8,
}

impl fmt::Display for GattError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCharacteristic => write!(f, "unknown characteristic"),
            Self::NotWritable => write!(f, "characteristic is not writable"),
            Self::NotReadable => write!(f, "characteristic is not readable"),
            Self::DataTooLong => write!(f, "write exceeds max attribute length"),
            Self::InvalidUtf8 => write!(f, "write contains invalid UTF-8"),
        }
    }
}

impl From<GattError> for Error {
    fn from(e: GattError) -> Self {
        Self::Gatt(e)
    }
}

impl core::error::Error for Error {}
impl core::error::Error for TuningError {}
impl core::error::Error for LinkError {}
impl core::error::Error for GattError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
