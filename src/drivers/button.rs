//! Debounced push-button driver.
//!
//! ## Hardware
//!
//! Active-low momentary switch (BOOT button, internal pull-up).  The main
//! loop samples the level every few milliseconds and feeds it to
//! [`ButtonDriver::tick`], which reports a press on the falling edge.
//!
//! ## Debounce
//!
//! A press is accepted only if at least `debounce_ms` have elapsed since
//! the previously accepted press.  Contact bounce and rapid re-presses
//! inside the window are swallowed.

pub struct ButtonDriver {
    gpio: i32,
    debounce_ms: u32,
    was_pressed: bool,
    last_accept_ms: Option<u32>,
}

impl ButtonDriver {
    pub fn new(gpio: i32, debounce_ms: u32) -> Self {
        Self {
            gpio,
            debounce_ms,
            was_pressed: false,
            last_accept_ms: None,
        }
    }

    /// GPIO pin this button is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Feed one sample.  `now_ms` is monotonic time in milliseconds;
    /// `pressed` is the raw sampled level (true = held).
    ///
    /// Returns `true` exactly once per accepted press.
    pub fn tick(&mut self, now_ms: u32, pressed: bool) -> bool {
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        if !edge {
            return false;
        }

        let accept = match self.last_accept_ms {
            None => true,
            Some(last) => now_ms.wrapping_sub(last) >= self.debounce_ms,
        };
        if accept {
            self.last_accept_ms = Some(now_ms);
        }
        accept
    }
}
