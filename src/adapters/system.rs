//! Device restart adapter.
//!
//! Implements [`DeviceControl`].  On hardware the restart runs on a short
//! helper thread so the caller (and the MQTT task flushing the
//! acknowledgment) keeps running until the delay elapses.

use core::time::Duration;

use log::info;

use crate::app::ports::DeviceControl;

#[derive(Default)]
pub struct SystemAdapter {
    #[cfg(not(target_os = "espidf"))]
    scheduled: Vec<Duration>,
}

impl SystemAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restarts requested so far (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn scheduled(&self) -> &[Duration] {
        &self.scheduled
    }
}

#[cfg(target_os = "espidf")]
impl DeviceControl for SystemAdapter {
    fn schedule_restart(&mut self, delay: Duration) {
        info!("System: restarting in {} ms", delay.as_millis());
        let spawned = std::thread::Builder::new()
            .name("restart".into())
            .stack_size(2048)
            .spawn(move || {
                std::thread::sleep(delay);
                unsafe { esp_idf_sys::esp_restart() };
            });
        if spawned.is_err() {
            // No thread available: restart inline after the delay.
            std::thread::sleep(delay);
            unsafe { esp_idf_sys::esp_restart() };
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl DeviceControl for SystemAdapter {
    fn schedule_restart(&mut self, delay: Duration) {
        info!("System(sim): restart requested in {} ms", delay.as_millis());
        self.scheduled.push(delay);
    }
}
