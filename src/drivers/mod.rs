//! Status lamp drivers.

pub mod indicator;
pub mod status_led;
