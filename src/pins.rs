//! Board / pin assignments for the supported roaster dongles.
//!
//! The roaster UART pins, the status lamp pin and the board id reported over
//! BLE all come from [`BOARD`].  The board is picked at compile time with a
//! cargo feature:
//!
//! | Feature                   | Board                         |
//! |---------------------------|-------------------------------|
//! | `board-waveshare-s3-zero` | Waveshare ESP32-S3-Zero       |
//! | `board-esp32c6-dev`       | ESP32-C6 DevKit               |
//! | *(none)*                  | unknown / host simulation     |

/// Pin map and identity of one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    /// Reported as the manufacturer-name characteristic (`0x2A29`).
    pub id: &'static str,
    /// Output to the roaster control board.
    pub roaster_tx_gpio: i32,
    /// Input from the roaster control board.
    pub roaster_rx_gpio: i32,
    /// On-board addressable RGB LED.
    pub led_gpio: i32,
    /// The on-board LED expects G,R,B byte order.
    pub led_grb: bool,
}

// ---------------------------------------------------------------------------
// Waveshare ESP32-S3-Zero
// ---------------------------------------------------------------------------

pub const WAVESHARE_S3_ZERO: Board = Board {
    id: "ARDUINO_WAVESHARE_ESP32_S3_ZERO",
    roaster_tx_gpio: 19,
    roaster_rx_gpio: 20,
    led_gpio: 21,
    led_grb: true,
};

// ---------------------------------------------------------------------------
// ESP32-C6 DevKit
// ---------------------------------------------------------------------------

// Colour order on this board's LED has not been confirmed.
pub const ESP32C6_DEV: Board = Board {
    id: "ARDUINO_ESP32C6_DEV",
    roaster_tx_gpio: 11,
    roaster_rx_gpio: 10,
    led_gpio: 8,
    led_grb: true,
};

// ---------------------------------------------------------------------------
// Fallback (placeholder pins)
// ---------------------------------------------------------------------------

pub const UNKNOWN: Board = Board {
    id: "UNKNOWN",
    roaster_tx_gpio: 1,
    roaster_rx_gpio: 2,
    led_gpio: 0,
    led_grb: false,
};

#[cfg(feature = "board-waveshare-s3-zero")]
pub const BOARD: Board = WAVESHARE_S3_ZERO;

#[cfg(all(feature = "board-esp32c6-dev", not(feature = "board-waveshare-s3-zero")))]
pub const BOARD: Board = ESP32C6_DEV;

#[cfg(not(any(feature = "board-waveshare-s3-zero", feature = "board-esp32c6-dev")))]
pub const BOARD: Board = UNKNOWN;
