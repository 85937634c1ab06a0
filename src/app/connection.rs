//! Link lifecycle: one peer at a time, advertising whenever idle.
//!
//! ```text
//!            on_link_established
//!  ┌──────────────┐ ───────────────▶ ┌──────────────┐
//!  │ Disconnected │                  │  Connected   │
//!  │ (advertising)│ ◀─────────────── │  { handle }  │
//!  └──────────────┘   on_link_lost   └──────────────┘
//! ```
//!
//! Entering `Disconnected` always re-arms advertising.  Entering
//! `Connected` asks the central for the mobile-friendly connection
//! parameters in [`ConnParams`].

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{info, warn};

use crate::app::ports::LinkControlPort;
use crate::config::ConnParams;
use crate::error::LinkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connected {
        handle: u16,
    },
}

/// Tracks whether a peer is attached and drives the radio accordingly.
pub struct ConnectionManager {
    state: Mutex<CriticalSectionRawMutex, Cell<LinkState>>,
    params: ConnParams,
}

impl ConnectionManager {
    pub fn new(params: ConnParams) -> Self {
        Self {
            state: Mutex::new(Cell::new(LinkState::Disconnected)),
            params,
        }
    }

    /// Begin advertising at boot.  A failure here is fatal to the caller.
    pub fn start(&self, radio: &mut impl LinkControlPort) -> Result<(), LinkError> {
        radio.start_advertising()?;
        info!("LINK: advertising");
        Ok(())
    }

    /// A central connected.  The parameter request is best-effort: the
    /// link stays up with whatever timing the central chose.
    pub fn on_link_established(&self, handle: u16, radio: &mut impl LinkControlPort) {
        let prev = self.state.lock(|s| s.replace(LinkState::Connected { handle }));
        if let LinkState::Connected { handle: old } = prev {
            warn!("LINK: connect on {handle} while {old} still open, replacing");
        }
        info!("LINK: peer connected (handle={handle})");

        let p = &self.params;
        match radio.update_conn_params(handle, p) {
            Ok(()) => info!(
                "LINK: requested interval {}-{} ms, latency {}, timeout {} ms",
                p.min_interval_ms(),
                p.max_interval_ms(),
                p.latency,
                p.supervision_timeout_ms()
            ),
            Err(e) => warn!("LINK: conn param update failed: {e}"),
        }
    }

    /// The peer went away.  `reason` is the controller's HCI code and is
    /// only logged.  Advertising restarts unconditionally.
    pub fn on_link_lost(
        &self,
        handle: u16,
        reason: i32,
        radio: &mut impl LinkControlPort,
    ) -> Result<(), LinkError> {
        let prev = self.state.lock(|s| s.replace(LinkState::Disconnected));
        match prev {
            LinkState::Connected { handle: h } if h == handle => {}
            LinkState::Connected { handle: h } => {
                warn!("LINK: disconnect for {handle} but {h} was tracked");
            }
            LinkState::Disconnected => warn!("LINK: disconnect for {handle} while idle"),
        }
        info!("LINK: peer disconnected (handle={handle}, reason=0x{reason:02x})");

        radio.start_advertising().inspect_err(|e| {
            warn!("LINK: could not restart advertising: {e}");
        })?;
        info!("LINK: advertising");
        Ok(())
    }

    pub fn state(&self) -> LinkState {
        self.state.lock(Cell::get)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state(), LinkState::Connected { .. })
    }

    pub fn conn_handle(&self) -> Option<u16> {
        match self.state() {
            LinkState::Connected { handle } => Some(handle),
            LinkState::Disconnected => None,
        }
    }
}
