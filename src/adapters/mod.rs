//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter | Implements                    | Connects to                 |
//! |---------|-------------------------------|-----------------------------|
//! | `ble`   | LinkControlPort, NotifyPort   | Bluedroid GATT server / sim |
//!
//! The status lamp ([`IndicatorPort`](crate::app::ports::IndicatorPort))
//! lives with the other peripheral code in [`drivers`](crate::drivers).

pub mod ble;
