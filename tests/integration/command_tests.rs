//! Integration tests for the command ingress path (GATT write → queue → loop).

use skiroast::config::FirmwareConfig;
use skiroast::error::{Error, GattError};
use skiroast::gatt::{CHAR_COMMAND_RX, Characteristic, MAX_ATTR_LEN, Uuid};

use crate::mock_loop::{make_link, make_link_with};

#[test]
fn commands_dequeue_in_arrival_order() {
    let (link, _control) = make_link();
    link.on_write(Characteristic::CommandRx, b"PRESET1").unwrap();
    link.on_write(Characteristic::CommandRx, b"ABORT").unwrap();

    assert_eq!(link.next_command().as_deref(), Some("PRESET1"));
    assert_eq!(link.next_command().as_deref(), Some("ABORT"));
    assert_eq!(link.next_command(), None);
}

#[test]
fn empty_command_enqueues_nothing() {
    let (link, _control) = make_link();
    link.on_write(Characteristic::CommandRx, b"").unwrap();
    link.on_write(Characteristic::CommandRx, b"\n").unwrap();
    assert_eq!(link.next_command(), None);
}

#[test]
fn trailing_newline_is_stripped() {
    let (link, _control) = make_link();
    link.on_write_uuid(Uuid::Long(CHAR_COMMAND_RX), b"READ\n")
        .unwrap();
    link.on_write(Characteristic::CommandRx, b"OT1;50\r\n").unwrap();
    assert_eq!(link.next_command().as_deref(), Some("READ"));
    assert_eq!(link.next_command().as_deref(), Some("OT1;50"));
}

#[test]
fn malformed_commands_rejected() {
    let (link, _control) = make_link();
    assert_eq!(
        link.on_write(Characteristic::CommandRx, &[0xc3, 0x28]),
        Err(Error::Gatt(GattError::InvalidUtf8))
    );
    assert_eq!(
        link.on_write(Characteristic::CommandRx, &vec![b'X'; MAX_ATTR_LEN + 1]),
        Err(Error::Gatt(GattError::DataTooLong))
    );
    assert!(link.commands().is_empty());
}

#[test]
fn commands_do_not_touch_tuning() {
    let (link, control) = make_link();
    control.clear();
    link.on_write(Characteristic::CommandRx, b"PID;T;12,0.5,1").unwrap();
    assert!(control.calls().is_empty());
    assert_eq!(link.pid_config().gains(), (9.0, 0.3, 2.5));
}

#[test]
fn bounded_queue_keeps_newest() {
    let mut config = FirmwareConfig::default();
    config.command_queue_limit = Some(3);
    let (link, _control) = make_link_with(config);

    for cmd in ["A", "B", "C", "D", "E"] {
        link.on_write(Characteristic::CommandRx, cmd.as_bytes()).unwrap();
    }
    assert_eq!(link.commands().dropped(), 2);

    let mut seen = Vec::new();
    link.commands().drain(|c| seen.push(c));
    assert_eq!(seen, ["C", "D", "E"]);
}
