//! Concurrency tests: BLE callback context vs. control loop on separate threads.

use std::sync::Arc;
use std::thread;

use skiroast::gatt::Characteristic;

use crate::mock_loop::{connect, make_link};

#[test]
fn producer_consumer_preserves_order() {
    let (link, _control) = make_link();
    let link = Arc::new(link);
    const N: usize = 500;

    let producer = {
        let link = Arc::clone(&link);
        thread::spawn(move || {
            for i in 0..N {
                link.on_write(Characteristic::CommandRx, format!("CMD{i}\n").as_bytes())
                    .unwrap();
            }
        })
    };

    let mut received = Vec::with_capacity(N);
    while received.len() < N {
        match link.next_command() {
            Some(cmd) => received.push(cmd),
            None => thread::yield_now(),
        }
    }
    producer.join().unwrap();

    let expected: Vec<String> = (0..N).map(|i| format!("CMD{i}")).collect();
    assert_eq!(received, expected);
    assert_eq!(link.next_command(), None);
}

#[test]
fn concurrent_tuning_writes_keep_invariants() {
    let (link, control) = make_link();
    let link = Arc::new(link);

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let link = Arc::clone(&link);
            thread::spawn(move || {
                for i in 0..100 {
                    let st = format!("{}", t * 100 + i - 150);
                    let mp = format!("{}", t * 37 + i - 20);
                    let _ = link.on_write(Characteristic::PidSampleTime, st.as_bytes());
                    let _ = link.on_write(Characteristic::PidMaxPower, mp.as_bytes());
                    let _ = link.on_write(Characteristic::PidTune, b"1.5,0.25,0.75");
                }
            })
        })
        .collect();

    for _ in 0..200 {
        let cfg = link.pid_config();
        assert!(cfg.sample_time_ms() > 0);
        assert!(cfg.max_power() <= 100);
    }
    for w in writers {
        w.join().unwrap();
    }

    let cfg = link.pid_config();
    assert!(cfg.sample_time_ms() > 0);
    assert!(cfg.max_power() <= 100);
    assert_eq!(cfg.gains(), (1.5, 0.25, 0.75));

    // Last values reaching the loop match the model.
    assert_eq!(control.last_sample_time(), Some(cfg.sample_time_ms()));
    assert_eq!(
        control.last_limits(),
        Some((0.0, f64::from(cfg.max_power())))
    );
}

#[test]
fn notify_races_with_disconnect() {
    let (link, _control) = make_link();
    connect(&link, 1);
    let link = Arc::new(link);

    let notifier = {
        let link = Arc::clone(&link);
        thread::spawn(move || {
            let mut ok = 0;
            for i in 0..200 {
                if link.notify(&format!("T{i}")).is_ok() {
                    ok += 1;
                }
            }
            ok
        })
    };
    link.on_disconnect(1, 0x13);
    let ok = notifier.join().unwrap();

    // Every successful send hit the radio; nothing after the link dropped.
    link.with_radio(|r| assert_eq!(r.notifications.len(), ok));
    assert!(link.notify("after").is_err());
}
