//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { ssid } => info!("START | ssid='{}'", ssid),
            AppEvent::LinkChanged { from, to } => info!("LINK  | {:?} -> {:?}", from, to),
            AppEvent::FallbackActivated => warn!("LINK  | retries exhausted, using default network"),
            AppEvent::SessionUp => info!("MQTT  | session up"),
            AppEvent::SessionDown => info!("MQTT  | session down, reconnect scheduled"),
            AppEvent::CredentialsChanged { ssid } => info!("CREDS | updated, ssid='{}'", ssid),
            AppEvent::CredentialsCleared => info!("CREDS | cleared, defaults restored"),
            AppEvent::RestartScheduled { delay_ms } => info!("SYS   | restart in {} ms", delay_ms),
            AppEvent::CommandIgnored(why) => info!("CTRL  | command ignored ({})", why),
            AppEvent::BlinkChanged { interval_ms } => info!("LED   | blink interval {} ms", interval_ms),
        }
    }
}
