//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NetService (domain)
//! ```
//!
//! Driven adapters (storage, WiFi driver, MQTT client, timers, restart,
//! event sinks) implement these traits.  The
//! [`NetService`](super::service::NetService) consumes them via generics,
//! so the domain core never touches the radio or flash directly.
//!
//! ## Asynchrony
//!
//! Every network-facing call only *initiates* an operation.  Completion
//! is reported later as a [`NetEvent`](crate::events::NetEvent) pushed
//! by the adapter onto the inbound event queue.

use core::time::Duration;

use super::credentials::Credentials;

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent namespaced string storage.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - [`write_batch`](StoragePort::write_batch) MUST be all-or-nothing:
///   on error no entry of the batch may be visible.  The ESP-IDF NVS API
///   gives this through a single `nvs_commit`; the simulation stages the
///   batch before swapping it in.
pub trait StoragePort {
    /// Read a string value into `buf`.  Returns the number of bytes read.
    fn read_str(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write several string entries and commit them atomically.
    fn write_batch(&mut self, namespace: &str, entries: &[(&str, &str)]) -> Result<(), StorageError>;

    /// Remove every key in `namespace`.  Succeeds if it was already empty.
    fn erase_namespace(&mut self, namespace: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: domain → WiFi station driver)
// ───────────────────────────────────────────────────────────────

/// WiFi station control.
pub trait NetworkPort {
    /// Load `creds` into the station configuration (does not associate).
    fn apply_credentials(&mut self, creds: &Credentials) -> Result<(), NetworkError>;

    /// Start the station interface.  Completion arrives as
    /// [`NetEvent::WifiStarted`](crate::events::NetEvent::WifiStarted).
    fn start(&mut self) -> Result<(), NetworkError>;

    /// Begin association with the configured AP.  Completion arrives as
    /// `GotIp` or `WifiDisconnected`.
    fn associate(&mut self) -> Result<(), NetworkError>;
}

// ───────────────────────────────────────────────────────────────
// Broker port (driven adapter: domain → MQTT client)
// ───────────────────────────────────────────────────────────────

/// Delivery guarantee requested for a publish or subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qos {
    AtMostOnce,
    AtLeastOnce,
}

/// Last-testament message the broker publishes if the session drops uncleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastWill {
    pub topic: String,
    pub payload: String,
    pub qos: Qos,
    pub retain: bool,
}

/// Everything needed to open a broker session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub broker_uri: String,
    pub client_id: String,
    pub last_will: LastWill,
}

/// MQTT session control.
pub trait BrokerPort {
    /// Create the client and start connecting.  Called once per process.
    fn open_session(&mut self, options: &SessionOptions) -> Result<(), BrokerError>;

    /// Re-start an existing client after a network or session loss.
    fn restart_session(&mut self) -> Result<(), BrokerError>;

    /// Subscribe to `topic`.
    fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<(), BrokerError>;

    /// Publish `payload` on `topic` (never retained).
    fn publish(&mut self, topic: &str, payload: &[u8], qos: Qos) -> Result<(), BrokerError>;
}

// ───────────────────────────────────────────────────────────────
// Timer + restart ports (driven adapters: domain → system services)
// ───────────────────────────────────────────────────────────────

/// One-shot timer that posts
/// [`NetEvent::ReconnectTimerExpired`](crate::events::NetEvent::ReconnectTimerExpired)
/// when it fires.  Re-arming an armed timer restarts the countdown.
pub trait ReconnectTimer {
    fn arm(&mut self, delay: Duration);
}

/// Device restart primitive.
pub trait DeviceControl {
    /// Restart the device after `delay`, giving in-flight publishes time
    /// to drain.  Does not return control on hardware once it fires.
    fn schedule_restart(&mut self, delay: Duration);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key or namespace does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Stored value does not fit the caller's buffer or is not valid UTF-8.
    InvalidValue,
    /// Generic I/O error (raw ESP-IDF error code, 0 in simulation).
    IoError(i32),
}

/// Errors from [`NetworkPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// SSID rejected by the driver configuration.
    InvalidSsid,
    /// Password rejected by the driver configuration.
    InvalidPassword,
    /// The driver refused the request.
    Driver(i32),
}

/// Errors from [`BrokerPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerError {
    /// No client has been created yet.
    NoSession,
    /// The client refused the request.
    Client(i32),
}

/// Errors from decoding an inbound control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Body is not well-formed JSON (carries the parser's description).
    Malformed(String),
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::InvalidValue => write!(f, "stored value invalid"),
            Self::IoError(code) => write!(f, "I/O error ({})", code),
        }
    }
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID rejected by driver"),
            Self::InvalidPassword => write!(f, "password rejected by driver"),
            Self::Driver(code) => write!(f, "WiFi driver error ({})", code),
        }
    }
}

impl core::fmt::Display for BrokerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoSession => write!(f, "no MQTT session"),
            Self::Client(code) => write!(f, "MQTT client error ({})", code),
        }
    }
}

impl core::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed(why) => write!(f, "malformed control message: {}", why),
        }
    }
}
