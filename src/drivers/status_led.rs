//! Blinking status LED.
//!
//! A single GPIO toggled by its own thread at the current blink interval.
//! The interval is owned by the connectivity service; the main loop copies
//! it into a [`BlinkInterval`] after every event so the blink thread can
//! read it without locking.
//!
//! ## Dual-target design
//!
//! Generic over [`embedded_hal::digital::OutputPin`]: on ESP-IDF a
//! `PinDriver<Output>`, on host a test double.

use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::digital::OutputPin;

/// Lock-free mirror of the blink half-period (milliseconds).
pub struct BlinkInterval(AtomicU32);

impl BlinkInterval {
    pub const fn new(ms: u32) -> Self {
        Self(AtomicU32::new(ms))
    }

    pub fn set(&self, ms: u32) {
        self.0.store(ms, Ordering::Relaxed);
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct StatusLed<P: OutputPin> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, on: false }
    }

    /// Flip the LED.  Pin errors are ignored: a stuck LED is cosmetic.
    pub fn toggle(&mut self) {
        self.on = !self.on;
        let _ = if self.on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// One blink step: toggle, then return how long to wait before the
    /// next step.
    pub fn step(&mut self, interval: &BlinkInterval) -> u32 {
        self.toggle();
        interval.get()
    }
}
