//! Network configuration parameters
//!
//! Compiled-in defaults for the connectivity core: fallback WiFi
//! credentials, broker endpoint and topics, and retry/restart timing.
//! Only the WiFi credentials are persisted (see
//! [`CredentialStore`](crate::app::credentials::CredentialStore)); every
//! other value here is fixed at build time.

use serde::{Deserialize, Serialize};

/// Factory WiFi SSID used at first boot and after fallback.
pub const DEFAULT_WIFI_SSID: &str = "TRUC ANH";
/// Factory WiFi password paired with [`DEFAULT_WIFI_SSID`].
pub const DEFAULT_WIFI_PASSWORD: &str = "23230903";

/// Blink interval sequence walked by button presses (milliseconds).
pub const BLINK_SEQUENCE_MS: [u32; 3] = [500, 1000, 100];

/// Core network configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetConfig {
    // --- Broker ---
    /// Broker endpoint, e.g. `mqtt://test.mosquitto.org`
    pub broker_uri: String,
    /// Outbound status / response topic
    pub status_topic: String,
    /// Inbound control topic
    pub control_topic: String,

    // --- Connectivity policy ---
    /// Consecutive disconnections before falling back to default credentials
    pub max_retries: u32,
    /// Delay before re-opening a lost broker session (milliseconds)
    pub reconnect_delay_ms: u32,
    /// Delay between a credential acknowledgment and the restart (milliseconds)
    pub restart_delay_ms: u32,

    // --- Timing ---
    /// Periodic status publication interval (seconds)
    pub status_interval_secs: u32,
    /// Blink interval at boot (milliseconds)
    pub initial_blink_interval_ms: u32,
    /// Minimum spacing between accepted button presses (milliseconds)
    pub button_debounce_ms: u32,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            // Broker
            broker_uri: "mqtt://test.mosquitto.org".into(),
            status_topic: "nhatminh/data".into(),
            control_topic: "nhatminh/control".into(),

            // Connectivity policy
            max_retries: 5,
            reconnect_delay_ms: 10_000,
            restart_delay_ms: 500,

            // Timing
            status_interval_secs: 30,
            initial_blink_interval_ms: BLINK_SEQUENCE_MS[0],
            button_debounce_ms: 200,
        }
    }
}

/// Errors from [`NetConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl NetConfig {
    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.broker_uri.starts_with("mqtt://") && !self.broker_uri.starts_with("mqtts://") {
            return Err(ConfigError::ValidationFailed(
                "broker_uri must start with mqtt:// or mqtts://",
            ));
        }
        if self.status_topic.is_empty() || self.control_topic.is_empty() {
            return Err(ConfigError::ValidationFailed("topics must not be empty"));
        }
        if self.status_topic == self.control_topic {
            return Err(ConfigError::ValidationFailed(
                "status_topic and control_topic must differ",
            ));
        }
        if !(1..=100).contains(&self.max_retries) {
            return Err(ConfigError::ValidationFailed("max_retries must be 1–100"));
        }
        if !(1_000..=600_000).contains(&self.reconnect_delay_ms) {
            return Err(ConfigError::ValidationFailed(
                "reconnect_delay_ms must be 1000–600000",
            ));
        }
        if !(50..=10_000).contains(&self.restart_delay_ms) {
            return Err(ConfigError::ValidationFailed(
                "restart_delay_ms must be 50–10000",
            ));
        }
        if !(5..=3600).contains(&self.status_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "status_interval_secs must be 5–3600",
            ));
        }
        if !BLINK_SEQUENCE_MS.contains(&self.initial_blink_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "initial_blink_interval_ms must be one of the blink sequence values",
            ));
        }
        Ok(())
    }
}

/// Next blink interval after a button press: 500 → 1000 → 100 → 500.
/// Anything off the sequence restarts it.
pub fn next_blink_interval(current_ms: u32) -> u32 {
    match BLINK_SEQUENCE_MS.iter().position(|&v| v == current_ms) {
        Some(i) => BLINK_SEQUENCE_MS[(i + 1) % BLINK_SEQUENCE_MS.len()],
        None => BLINK_SEQUENCE_MS[0],
    }
}
