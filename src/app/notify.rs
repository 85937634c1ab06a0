//! Outbound status messages to the connected peer.
//!
//! Fire-and-forget: one notification per call, sent only while a peer is
//! attached and the status characteristic has been registered.  There is no
//! queue and no retry; a refused send is reported to the caller and logged.

use std::sync::Mutex;

use log::{debug, warn};

use crate::app::connection::ConnectionManager;
use crate::app::lock_unpoisoned;
use crate::app::ports::NotifyPort;
use crate::error::LinkError;

#[derive(Default)]
struct TxState {
    /// Attribute handle of the status characteristic, once registered.
    handle: Option<u16>,
    /// Value served to reads of the status characteristic.
    last_value: String,
}

/// Status egress.
#[derive(Default)]
pub struct NotificationChannel {
    tx: Mutex<TxState>,
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the status characteristic's attribute handle.
    pub fn bind_tx(&self, attr_handle: u16) {
        lock_unpoisoned(&self.tx).handle = Some(attr_handle);
        debug!("BLE: status tx bound to handle {attr_handle}");
    }

    /// Send `message` to the peer.
    ///
    /// The characteristic value is updated only when the radio accepted
    /// the notification.
    pub fn notify(
        &self,
        link: &ConnectionManager,
        radio: &mut impl NotifyPort,
        message: &str,
    ) -> Result<(), LinkError> {
        let Some(conn) = link.conn_handle() else {
            warn!("BLE: notify dropped, no peer: '{message}'");
            return Err(LinkError::NotConnected);
        };

        let mut tx = lock_unpoisoned(&self.tx);
        let Some(attr) = tx.handle else {
            warn!("BLE: notify dropped, status characteristic not registered");
            return Err(LinkError::TxUnavailable);
        };

        radio
            .notify(conn, attr, message.as_bytes())
            .inspect_err(|e| warn!("BLE: notify failed: {e}"))?;
        message.clone_into(&mut tx.last_value);
        debug!("BLE: notified '{message}'");
        Ok(())
    }

    /// Last message that was successfully sent (empty before the first).
    pub fn last_value(&self) -> String {
        lock_unpoisoned(&self.tx).last_value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::LinkControlPort;
    use crate::config::ConnParams;

    #[derive(Default)]
    struct Radio {
        sent: Vec<(u16, u16, Vec<u8>)>,
        refuse: bool,
    }

    impl NotifyPort for Radio {
        fn notify(&mut self, conn: u16, attr: u16, payload: &[u8]) -> Result<(), LinkError> {
            if self.refuse {
                return Err(LinkError::NotifyFailed(-3));
            }
            self.sent.push((conn, attr, payload.to_vec()));
            Ok(())
        }
    }

    impl LinkControlPort for Radio {
        fn start_advertising(&mut self) -> Result<(), LinkError> {
            Ok(())
        }
        fn update_conn_params(&mut self, _: u16, _: &ConnParams) -> Result<(), LinkError> {
            Ok(())
        }
    }

    #[test]
    fn disconnected_sends_nothing() {
        let link = ConnectionManager::new(ConnParams::MOBILE);
        let ch = NotificationChannel::new();
        ch.bind_tx(42);
        let mut radio = Radio::default();
        assert_eq!(ch.notify(&link, &mut radio, "hello"), Err(LinkError::NotConnected));
        assert!(radio.sent.is_empty());
        assert_eq!(ch.last_value(), "");
    }

    #[test]
    fn unbound_tx_sends_nothing() {
        let link = ConnectionManager::new(ConnParams::MOBILE);
        let mut radio = Radio::default();
        link.on_link_established(1, &mut radio);
        let ch = NotificationChannel::new();
        assert_eq!(ch.notify(&link, &mut radio, "hello"), Err(LinkError::TxUnavailable));
        assert!(radio.sent.is_empty());
    }

    #[test]
    fn connected_sends_one_notification() {
        let link = ConnectionManager::new(ConnParams::MOBILE);
        let mut radio = Radio::default();
        link.on_link_established(5, &mut radio);
        let ch = NotificationChannel::new();
        ch.bind_tx(42);
        ch.notify(&link, &mut radio, "ROASTING").unwrap();
        assert_eq!(radio.sent, vec![(5, 42, b"ROASTING".to_vec())]);
        assert_eq!(ch.last_value(), "ROASTING");
    }

    #[test]
    fn refused_send_keeps_previous_value() {
        let link = ConnectionManager::new(ConnParams::MOBILE);
        let mut radio = Radio::default();
        link.on_link_established(5, &mut radio);
        let ch = NotificationChannel::new();
        ch.bind_tx(42);
        ch.notify(&link, &mut radio, "one").unwrap();
        radio.refuse = true;
        assert_eq!(
            ch.notify(&link, &mut radio, "two"),
            Err(LinkError::NotifyFailed(-3))
        );
        assert_eq!(ch.last_value(), "one");
    }
}
