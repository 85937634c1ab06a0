//! Integration tests for GATT tuning writes → PidConfig → control loop.

use skiroast::control::pid_config::{PidConfig, ProportionalMode};
use skiroast::error::{Error, TuningError};
use skiroast::gatt::{CHAR_PID_TUNE, Characteristic, MAX_ATTR_LEN, Uuid};

use crate::mock_loop::{LoopCall, make_link};

fn read(link: &crate::mock_loop::TestLink, c: Characteristic) -> String {
    link.on_read(c).unwrap()
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_applies_defaults_once() {
    let (link, control) = make_link();
    assert_eq!(
        control.calls(),
        vec![
            LoopCall::SetTunings {
                kp: 9.0,
                ki: 0.3,
                kd: 2.5,
                mode: ProportionalMode::OnMeasurement
            },
            LoopCall::SetSampleTime(500),
            LoopCall::SetOutputLimits { min: 0.0, max: 100.0 },
        ]
    );
    assert_eq!(link.pid_config(), PidConfig::default());
}

// ── Gains ─────────────────────────────────────────────────────

#[test]
fn gains_write_round_trips() {
    let (link, control) = make_link();
    link.on_write(Characteristic::PidTune, b"12.5,0.75,3.0").unwrap();

    let cfg = link.pid_config();
    assert!((cfg.kp() - 12.5).abs() < 1e-9);
    assert!((cfg.ki() - 0.75).abs() < 1e-9);
    assert!((cfg.kd() - 3.0).abs() < 1e-9);

    let text = read(&link, Characteristic::PidTune);
    let parsed: Vec<f64> = text.split(',').map(|t| t.parse().unwrap()).collect();
    assert_eq!(parsed.len(), 3);
    assert!((parsed[0] - 12.5).abs() < 1e-9);
    assert!((parsed[1] - 0.75).abs() < 1e-9);
    assert!((parsed[2] - 3.0).abs() < 1e-9);

    assert_eq!(control.apply_count(), 2);
    assert_eq!(
        control.last_tunings(),
        Some((12.5, 0.75, 3.0, ProportionalMode::OnMeasurement))
    );
}

#[test]
fn short_gains_payload_changes_nothing() {
    let (link, control) = make_link();
    control.clear();

    let r = link.on_write(Characteristic::PidTune, b"12.5,0.75");
    assert_eq!(r, Err(Error::Tuning(TuningError::WrongTokenCount(2))));
    assert_eq!(link.pid_config().gains(), (9.0, 0.3, 2.5));
    assert!(control.calls().is_empty(), "rejected write must not re-apply");
}

#[test]
fn fine_gains_survive_read_and_write_back() {
    let (link, _control) = make_link();
    link.on_write(Characteristic::PidTune, b"12.345,0.004,1.0").unwrap();

    let text = read(&link, Characteristic::PidTune);
    assert_eq!(text, "12.345,0.004,1.00");

    // The app echoing the read value back must not lose Ki.
    link.on_write(Characteristic::PidTune, text.as_bytes()).unwrap();
    assert_eq!(link.pid_config().gains(), (12.345, 0.004, 1.0));
}

#[test]
fn gains_write_by_uuid() {
    let (link, _control) = make_link();
    link.on_write_uuid(Uuid::Long(CHAR_PID_TUNE), b"1,2,3\n").unwrap();
    assert_eq!(read(&link, Characteristic::PidTune), "1.00,2.00,3.00");
}

// ── Mode ──────────────────────────────────────────────────────

#[test]
fn mode_token_and_fallback() {
    let (link, control) = make_link();

    link.on_write(Characteristic::PidMode, b"P_ON_E").unwrap();
    assert_eq!(read(&link, Characteristic::PidMode), "P_ON_E");
    assert_eq!(
        control.last_tunings().map(|t| t.3),
        Some(ProportionalMode::OnError)
    );

    link.on_write(Characteristic::PidMode, b"bogus").unwrap();
    assert_eq!(read(&link, Characteristic::PidMode), "P_ON_M");

    link.on_write(Characteristic::PidMode, b"P_ON_E").unwrap();
    link.on_write(Characteristic::PidMode, b"").unwrap();
    assert_eq!(read(&link, Characteristic::PidMode), "P_ON_M");
}

#[test]
fn oversized_mode_payload_still_falls_back() {
    let (link, control) = make_link();
    link.on_write(Characteristic::PidMode, b"P_ON_E").unwrap();

    let big = vec![b'P'; MAX_ATTR_LEN + 1];
    link.on_write(Characteristic::PidMode, &big).unwrap();
    assert_eq!(read(&link, Characteristic::PidMode), "P_ON_M");
    assert_eq!(
        control.last_tunings().map(|t| t.3),
        Some(ProportionalMode::OnMeasurement)
    );
}

// ── Sample time ───────────────────────────────────────────────

#[test]
fn sample_time_rejects_non_positive() {
    let (link, control) = make_link();
    control.clear();

    assert!(link.on_write(Characteristic::PidSampleTime, b"0").is_err());
    assert!(link.on_write(Characteristic::PidSampleTime, b"-5").is_err());
    assert!(link.on_write(Characteristic::PidSampleTime, b"soon").is_err());
    assert_eq!(read(&link, Characteristic::PidSampleTime), "500");
    assert!(control.calls().is_empty());

    link.on_write(Characteristic::PidSampleTime, b"750").unwrap();
    assert_eq!(read(&link, Characteristic::PidSampleTime), "750");
    assert_eq!(control.last_sample_time(), Some(750));
}

// ── Max power ─────────────────────────────────────────────────

#[test]
fn max_power_bounds() {
    let (link, control) = make_link();

    assert!(link.on_write(Characteristic::PidMaxPower, b"150").is_err());
    assert!(link.on_write(Characteristic::PidMaxPower, b"-1").is_err());
    assert_eq!(read(&link, Characteristic::PidMaxPower), "100");

    link.on_write(Characteristic::PidMaxPower, b"80").unwrap();
    assert_eq!(read(&link, Characteristic::PidMaxPower), "80");
    assert_eq!(control.last_limits(), Some((0.0, 80.0)));

    link.on_write(Characteristic::PidMaxPower, b"0").unwrap();
    assert_eq!(control.last_limits(), Some((0.0, 0.0)));
}

// ── Whole-unit apply ──────────────────────────────────────────

#[test]
fn every_accepted_write_pushes_full_config() {
    let (link, control) = make_link();
    link.on_write(Characteristic::PidSampleTime, b"250").unwrap();
    link.on_write(Characteristic::PidMaxPower, b"60").unwrap();
    control.clear();

    link.on_write(Characteristic::PidMode, b"P_ON_E").unwrap();
    assert_eq!(
        control.calls(),
        vec![
            LoopCall::SetTunings {
                kp: 9.0,
                ki: 0.3,
                kd: 2.5,
                mode: ProportionalMode::OnError
            },
            LoopCall::SetSampleTime(250),
            LoopCall::SetOutputLimits { min: 0.0, max: 60.0 },
        ]
    );
}
