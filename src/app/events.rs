//! Outbound application events and broker payloads.
//!
//! The [`NetService`](super::service::NetService) emits [`AppEvent`]s
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them (serial log today).
//!
//! The payload structs at the bottom are the JSON bodies published on the
//! status topic.

use serde::Serialize;

use crate::fsm::LinkState;

/// Structured events emitted by the connectivity core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service started with the given SSID.
    Started { ssid: String },

    /// The link FSM moved between states.
    LinkChanged { from: LinkState, to: LinkState },

    /// Retries exhausted; the device switched to the default network.
    FallbackActivated,

    /// Broker session came up.
    SessionUp,

    /// Broker session dropped; a reconnect is scheduled.
    SessionDown,

    /// New credentials were persisted.
    CredentialsChanged { ssid: String },

    /// Stored credentials were erased.
    CredentialsCleared,

    /// A device restart is scheduled after `delay_ms`.
    RestartScheduled { delay_ms: u32 },

    /// A control command was dropped (reason is a short tag).
    CommandIgnored(&'static str),

    /// Blink interval changed by button press.
    BlinkChanged { interval_ms: u32 },
}

// ───────────────────────────────────────────────────────────────
// Broker payloads
// ───────────────────────────────────────────────────────────────

/// Device liveness snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload<'a> {
    pub status: &'a str,
    #[serde(rename = "blinkInterval")]
    pub blink_interval: u32,
}

/// Response to a `show_wifi` query.
#[derive(Debug, Clone, Serialize)]
pub struct WifiInfoPayload<'a> {
    pub ssid: &'a str,
    pub connected: bool,
}

/// Acknowledgment for an accepted credential command.
#[derive(Debug, Clone, Serialize)]
pub struct AckPayload<'a> {
    pub status: &'a str,
    pub message: &'a str,
}

impl<'a> AckPayload<'a> {
    pub fn success(message: &'a str) -> Self {
        Self { status: "success", message }
    }
}

/// Last-testament body registered with the broker.
pub const OFFLINE_PAYLOAD: &str = r#"{"status":"offline"}"#;

pub const ACK_CLEARED: &str = "WiFi credentials cleared, default values restored";
pub const ACK_UPDATED: &str = "WiFi credentials updated";
