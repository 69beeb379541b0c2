//! Peripheral drivers: user button and status LED.

pub mod button;
pub mod status_led;
