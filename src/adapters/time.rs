//! ESP32 time adapters.
//!
//! - [`Esp32TimeAdapter`]: monotonic uptime for the main loop's periodic
//!   work (status tick, button sampling).
//! - [`ReconnectTimerAdapter`]: implements [`ReconnectTimer`], posting
//!   `ReconnectTimerExpired` onto the event queue when it fires.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` and an
//!   `EspTaskTimerService` one-shot timer.
//! - **`not(target_os = "espidf")`**: `std::time::Instant`, and a timer
//!   that records its deadline and fires when the test advances it.

use core::time::Duration;

use log::info;

use crate::app::ports::ReconnectTimer;
use crate::events::{EventQueue, NetEvent};

/// Monotonic clock.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot (monotonic, truncated to `u32`).
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u32 {
        ((unsafe { esp_idf_sys::esp_timer_get_time() }) / 1_000) as u32
    }

    /// Milliseconds since start (monotonic, truncated to `u32`).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}

// ───────────────────────────────────────────────────────────────
// Reconnect timer (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct ReconnectTimerAdapter {
    timer: esp_idf_svc::timer::EspTimer<'static>,
}

#[cfg(target_os = "espidf")]
impl ReconnectTimerAdapter {
    pub fn new(queue: &'static EventQueue) -> anyhow::Result<Self> {
        let service = esp_idf_svc::timer::EspTaskTimerService::new()?;
        let timer = service.timer(move || {
            queue.push(NetEvent::ReconnectTimerExpired);
        })?;
        Ok(Self { timer })
    }
}

#[cfg(target_os = "espidf")]
impl ReconnectTimer for ReconnectTimerAdapter {
    fn arm(&mut self, delay: Duration) {
        if let Err(e) = self.timer.cancel() {
            log::warn!("Reconnect timer: cancel failed ({})", e);
        }
        if let Err(e) = self.timer.after(delay) {
            log::warn!("Reconnect timer: arm failed ({})", e);
            return;
        }
        info!("Reconnect timer: armed for {} ms", delay.as_millis());
    }
}

// ───────────────────────────────────────────────────────────────
// Reconnect timer (simulation)
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct ReconnectTimerAdapter {
    queue: &'static EventQueue,
    /// Remaining time until expiry, if armed.
    remaining: Option<Duration>,
    arms: u32,
}

#[cfg(not(target_os = "espidf"))]
impl ReconnectTimerAdapter {
    pub fn new(queue: &'static EventQueue) -> Self {
        Self {
            queue,
            remaining: None,
            arms: 0,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.remaining.is_some()
    }

    /// How many times the timer was armed.
    pub fn arms(&self) -> u32 {
        self.arms
    }

    /// Let simulated time pass; posts the expiry event once if the
    /// deadline is reached.
    pub fn advance(&mut self, by: Duration) {
        let Some(left) = self.remaining else {
            return;
        };
        match left.checked_sub(by) {
            Some(rest) if !rest.is_zero() => self.remaining = Some(rest),
            _ => {
                self.remaining = None;
                self.queue.push(NetEvent::ReconnectTimerExpired);
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl ReconnectTimer for ReconnectTimerAdapter {
    fn arm(&mut self, delay: Duration) {
        self.remaining = Some(delay);
        self.arms += 1;
        info!("Reconnect timer(sim): armed for {} ms", delay.as_millis());
    }
}
