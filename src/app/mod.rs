//! Application core: link and tuning logic, zero I/O.
//!
//! Everything the companion app can do to the roaster is decided here:
//! command ingress, status egress, tuning reads/writes and the connection
//! lifecycle.  The BLE stack and the roast loop are reached only through
//! the **port traits** in [`ports`], so the whole layer runs under
//! `cargo test` on the host.

pub mod commands;
pub mod connection;
pub mod notify;
pub mod ports;
pub mod service;
pub mod tuning;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// A panic in one BLE callback must not wedge every later callback.
pub(crate) fn lock_unpoisoned<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
