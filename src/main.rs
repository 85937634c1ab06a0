//! Skiroast Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Bluedroid GATT callbacks        StatusLed (RMT)               │
//! │  BluedroidRadio (LinkControl + Notify)                         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            RoasterLink (pure logic)                    │    │
//! │  │  Tuning · Commands · Connection · Notifications        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Roast loop: commands out, SharedLoopParameters in             │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::time::{Duration, Instant};

use anyhow::Result;
use esp_idf_hal::gpio::AnyOutputPin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::bt::{Ble, BtDriver};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{LevelFilter, info};

use skiroast::adapters::ble::{self, BluedroidRadio};
use skiroast::app::ports::IndicatorPort;
use skiroast::app::service::RoasterLink;
use skiroast::config::FirmwareConfig;
use skiroast::control::loop_params::SharedLoopParameters;
use skiroast::control::pid_config::PidConfig;
use skiroast::drivers::indicator::{Colour, ConnectionIndicator};
use skiroast::drivers::status_led::StatusLed;
use skiroast::gatt::Characteristic;
use skiroast::pins;

const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(5);
const LOOP_PERIOD: Duration = Duration::from_millis(10);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Skiroast v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    info!(
        "Board: {} (roaster tx={} rx={}, led={})",
        pins::BOARD.id,
        pins::BOARD.roaster_tx_gpio,
        pins::BOARD.roaster_rx_gpio,
        pins::BOARD.led_gpio
    );

    // ── 2. Configuration ──────────────────────────────────────
    let config = FirmwareConfig::default();
    info!("Config: {}", serde_json::to_string(&config)?);
    let pid = PidConfig::default();
    info!("PID: {}", serde_json::to_string(&pid)?);
    let loop_params = SharedLoopParameters::new(&pid);

    // ── 3. Status lamp ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    // SAFETY: the LED pin is not claimed by any other driver.
    let led_pin = unsafe { AnyOutputPin::new(pins::BOARD.led_gpio) };
    let mut lamp = StatusLed::new(peripherals.rmt.channel0, led_pin, pins::BOARD.led_grb)?;
    let (r, g, b) = Colour::Green.rgb();
    lamp.set_rgb(r, g, b);

    // ── 4. BLE stack + GATT table ─────────────────────────────
    let nvs = EspDefaultNvsPartition::take()?;
    let _bt = BtDriver::<Ble>::new(peripherals.modem, Some(nvs))?;
    ble::bring_up(&config.device_name)?;

    let link = ble::install(RoasterLink::new(
        config.clone(),
        pid,
        loop_params.clone(),
        BluedroidRadio,
    ))?;
    ble::wait_registered(REGISTRATION_TIMEOUT)?;
    let tx = ble::attr_handle(Characteristic::StatusTx)
        .ok_or_else(|| anyhow::anyhow!("status characteristic has no handle"))?;
    link.bind_status_handle(tx);
    link.start()?;

    // Serial is shared with the roaster on single-USB boards.
    if !config.serial_log {
        info!("Serial logging disabled");
        log::set_max_level(LevelFilter::Off);
    }

    // ── 5. Main loop ──────────────────────────────────────────
    let boot = Instant::now();
    let mut indicator = ConnectionIndicator::new(config.indicator_flash_ms);
    let mut applied = loop_params.generation();

    loop {
        while let Some(command) = link.next_command() {
            info!("CMD: dispatch '{}'", command);
        }

        let generation = loop_params.generation();
        if generation != applied {
            let p = loop_params.snapshot();
            info!(
                "TUNE: loop now Kp={} Ki={} Kd={} {:?} {}ms out {}..{}",
                p.kp, p.ki, p.kd, p.p_mode, p.sample_time_ms, p.output_min, p.output_max
            );
            applied = generation;
        }

        indicator.tick(boot.elapsed().as_millis() as u32, link.is_connected(), &mut lamp);
        std::thread::sleep(LOOP_PERIOD);
    }
}
