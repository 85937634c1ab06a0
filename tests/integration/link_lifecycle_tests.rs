//! Integration tests for connect / disconnect / notify over the sim radio.

use skiroast::adapters::ble::SimRadio;
use skiroast::app::connection::LinkState;
use skiroast::app::service::RoasterLink;
use skiroast::config::{ConnParams, FirmwareConfig};
use skiroast::control::pid_config::PidConfig;
use skiroast::error::LinkError;
use skiroast::gatt::Characteristic;

use crate::mock_loop::{RecordingLoop, STATUS_HANDLE, connect, make_link};

#[test]
fn boot_starts_advertising() {
    let (link, _control) = make_link();
    link.with_radio(|r| {
        assert!(r.is_advertising());
        assert_eq!(r.adverts_started, 1);
    });
    assert!(!link.is_connected());
}

#[test]
fn connect_requests_mobile_parameters() {
    let (link, _control) = make_link();
    connect(&link, 1);
    assert_eq!(link.connection().state(), LinkState::Connected { handle: 1 });
    link.with_radio(|r| {
        assert_eq!(r.param_requests, vec![(1, ConnParams::MOBILE)]);
        let (_, p) = r.param_requests[0];
        assert_eq!((p.min_interval, p.max_interval), (12, 24));
        assert_eq!((p.latency, p.supervision_timeout), (4, 500));
    });
}

#[test]
fn notify_while_disconnected_sends_nothing() {
    let (link, _control) = make_link();
    assert_eq!(link.notify("HEATING"), Err(LinkError::NotConnected));
    link.with_radio(|r| assert!(r.notifications.is_empty()));
}

#[test]
fn notify_while_connected_sends_once() {
    let (link, _control) = make_link();
    connect(&link, 4);
    link.notify("HEATING").unwrap();
    link.with_radio(|r| {
        assert_eq!(r.notifications.len(), 1);
        assert_eq!(r.notifications[0].conn_handle, 4);
        assert_eq!(r.notifications[0].attr_handle, STATUS_HANDLE);
        assert_eq!(r.sent_text(), ["HEATING"]);
    });
    assert_eq!(link.on_read(Characteristic::StatusTx).unwrap(), "HEATING");
}

#[test]
fn link_loss_rearms_advertising_and_reconnects() {
    let (link, _control) = make_link();
    connect(&link, 1);
    link.with_radio(|r| assert!(!r.is_advertising()));

    link.on_disconnect(1, 0x13);
    assert!(!link.is_connected());
    link.with_radio(|r| {
        assert!(r.is_advertising(), "advertising must restart after loss");
        assert_eq!(r.adverts_started, 2);
    });
    assert_eq!(link.notify("lost"), Err(LinkError::NotConnected));

    connect(&link, 2);
    link.notify("back").unwrap();
    link.with_radio(|r| {
        assert_eq!(r.sent_text(), ["back"]);
        assert_eq!(r.notifications[0].conn_handle, 2);
        assert_eq!(r.param_requests.len(), 2);
    });
}

#[test]
fn repeated_cycles_always_readvertise() {
    let (link, _control) = make_link();
    for handle in 1..=5 {
        connect(&link, handle);
        link.on_disconnect(handle, 0x08);
    }
    link.with_radio(|r| assert_eq!(r.adverts_started, 6));
}

#[test]
fn failed_notify_is_non_fatal() {
    let (link, _control) = make_link();
    connect(&link, 1);
    link.with_radio(|r| r.fail_notify = Some(-1));
    assert_eq!(link.notify("x"), Err(LinkError::NotifyFailed(-1)));
    assert!(link.is_connected());

    link.with_radio(|r| r.fail_notify = None);
    link.notify("y").unwrap();
    assert_eq!(link.on_read(Characteristic::StatusTx).unwrap(), "y");
}

#[test]
fn notify_before_status_registered_reports_unavailable() {
    let link = RoasterLink::new(
        FirmwareConfig::default(),
        PidConfig::default(),
        RecordingLoop::new(),
        SimRadio::new(),
    );
    link.start().unwrap();
    link.with_radio(SimRadio::accept_central);
    link.on_connect(1);
    assert_eq!(link.notify("early"), Err(LinkError::TxUnavailable));
}

#[test]
fn advertising_failure_at_boot_is_reported() {
    let mut radio = SimRadio::new();
    radio.fail_advertising = Some(-7);
    let link = RoasterLink::new(
        FirmwareConfig::default(),
        PidConfig::default(),
        RecordingLoop::new(),
        radio,
    );
    assert_eq!(link.start(), Err(LinkError::AdvertisingFailed(-7)));
}
