//! On-board addressable RGB LED driver.
//!
//! One WS2812-style pixel driven through `smart_leds`.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: `Ws2812Esp32Rmt` clocks the pixel out on an RMT channel.
//! On host/test: tracks state in-memory only.
//!
//! The RMT driver always sends green first.  Boards whose pixel expects
//! red first (`grb == false` in [`pins::BOARD`](crate::pins::BOARD)) get
//! the two channels swapped before the write.

use smart_leds::RGB8;

use crate::app::ports::IndicatorPort;

#[cfg(feature = "espidf")]
use esp_idf_hal::gpio::OutputPin;
#[cfg(feature = "espidf")]
use esp_idf_hal::peripheral::Peripheral;
#[cfg(feature = "espidf")]
use esp_idf_hal::rmt::RmtChannel;
#[cfg(feature = "espidf")]
use smart_leds::SmartLedsWrite;
#[cfg(feature = "espidf")]
use ws2812_esp32_rmt_driver::Ws2812Esp32Rmt;

pub struct StatusLed {
    #[cfg(feature = "espidf")]
    driver: Ws2812Esp32Rmt<'static>,
    grb: bool,
    current: (u8, u8, u8),
}

#[cfg(feature = "espidf")]
impl StatusLed {
    pub fn new<C: RmtChannel>(
        channel: impl Peripheral<P = C> + 'static,
        pin: impl Peripheral<P = impl OutputPin> + 'static,
        grb: bool,
    ) -> anyhow::Result<Self> {
        let driver = Ws2812Esp32Rmt::new(channel, pin)
            .map_err(|e| anyhow::anyhow!("WS2812 driver init failed: {e:?}"))?;
        Ok(Self {
            driver,
            grb,
            current: (0, 0, 0),
        })
    }
}

#[cfg(not(feature = "espidf"))]
impl StatusLed {
    pub fn new(grb: bool) -> Self {
        Self {
            grb,
            current: (0, 0, 0),
        }
    }
}

impl StatusLed {
    /// Pixel handed to the green-first driver.
    fn pixel(&self, r: u8, g: u8, b: u8) -> RGB8 {
        if self.grb {
            RGB8 { r, g, b }
        } else {
            RGB8 { r: g, g: r, b }
        }
    }

    pub fn set_colour(&mut self, r: u8, g: u8, b: u8) {
        let pixel = self.pixel(r, g, b);
        #[cfg(feature = "espidf")]
        if let Err(e) = self.driver.write(core::iter::once(pixel)) {
            log::warn!("LED: pixel write failed: {e:?}");
            return;
        }
        #[cfg(not(feature = "espidf"))]
        log::trace!("LED(sim): pixel {pixel:?}");
        self.current = (r, g, b);
    }

    pub fn off(&mut self) {
        self.set_colour(0, 0, 0);
    }

    pub fn current_colour(&self) -> (u8, u8, u8) {
        self.current
    }
}

impl IndicatorPort for StatusLed {
    fn set_rgb(&mut self, r: u8, g: u8, b: u8) {
        self.set_colour(r, g, b);
    }
}
