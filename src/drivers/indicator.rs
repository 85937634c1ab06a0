//! Connection status lamp.
//!
//! A timer-driven flip/flop evaluated once per flash period:
//!
//! | Lamp now | Peer connected | Next lamp | Period restarts |
//! |----------|----------------|-----------|-----------------|
//! | blue     | yes            | black     | no              |
//! | blue     | no             | red       | yes             |
//! | other    | any            | blue      | yes             |
//!
//! Disconnected the lamp alternates blue/red once a period.  Connected it
//! stays blue with a one-tick black blink, because black does not restart
//! the period and the next tick turns it straight back to blue.

use crate::app::ports::IndicatorPort;

/// Lamp colours.  Kept dim; the LED sits behind a thin diffuser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colour {
    Blue,
    Red,
    Green,
    Black,
}

impl Colour {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Blue => (0, 0, 10),
            Self::Red => (10, 0, 0),
            Self::Green => (0, 10, 0),
            Self::Black => (0, 0, 0),
        }
    }
}

pub struct ConnectionIndicator {
    period_ms: u32,
    last_on_ms: u32,
    colour: Colour,
}

impl ConnectionIndicator {
    /// The lamp is assumed blue at boot; nothing is written until the
    /// first period elapses.
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_on_ms: 0,
            colour: Colour::Blue,
        }
    }

    /// Advance the flip/flop.  Writes to `lamp` only when the colour changes.
    /// `now_ms` is a free-running millisecond counter and may wrap.
    pub fn tick(&mut self, now_ms: u32, connected: bool, lamp: &mut impl IndicatorPort) {
        if now_ms.wrapping_sub(self.last_on_ms) < self.period_ms {
            return;
        }

        let next = match (self.colour, connected) {
            (Colour::Blue, true) => Colour::Black,
            (Colour::Blue, false) => {
                self.last_on_ms = now_ms;
                Colour::Red
            }
            _ => {
                self.last_on_ms = now_ms;
                Colour::Blue
            }
        };

        if next != self.colour {
            let (r, g, b) = next.rgb();
            lamp.set_rgb(r, g, b);
            self.colour = next;
        }
    }

    pub fn colour(&self) -> Colour {
        self.colour
    }
}
