//! Skiroast firmware library.
//!
//! BLE control surface for a coffee roaster: command ingress, status
//! notifications and PID tuning over GATT.  The pure-logic modules are
//! exposed for integration testing; everything ESP-IDF-specific is guarded
//! by the `espidf` feature inside each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod gatt;
pub mod pins;
#[cfg(any(feature = "espidf", test))]
mod section;
