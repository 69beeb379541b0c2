//! Inbound event queue.
//!
//! Events are produced by:
//! - ESP-IDF WiFi / IP event callbacks (system event loop task)
//! - MQTT client callbacks (MQTT task)
//! - Timer callbacks (reconnect timer, periodic status tick)
//! - The main loop itself (debounced button presses)
//!
//! Events are consumed by the main loop, which hands them one at a time
//! to [`NetService::handle_event`](crate::app::service::NetService::handle_event).
//! That loop is the only code that mutates connectivity state.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ WiFi/IP cb  │────▶│              │     │              │
//! │ MQTT cb     │────▶│  EventQueue  │────▶│  Main Loop   │
//! │ Timer cb    │────▶│ (embassy-sync│     │  (consumer)  │
//! │ Button      │────▶│   channel)   │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 16;

/// Largest MQTT payload carried into the core; longer bodies are dropped
/// by the adapter before they reach the queue.
pub const MAX_PAYLOAD: usize = 512;

/// Largest topic name carried into the core.
pub const MAX_TOPIC: usize = 64;

/// Everything the connectivity core reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    // ── WiFi / IP ─────────────────────────────────────────
    /// Station interface started; association may begin.
    WifiStarted,
    /// Association lost or failed, with the driver's reason code.
    WifiDisconnected { reason: u16 },
    /// DHCP lease obtained (IPv4, network byte order as printed).
    GotIp { ip: [u8; 4] },

    // ── MQTT ──────────────────────────────────────────────
    SessionConnected,
    SessionDisconnected,
    /// Client-reported error (logged only).
    SessionError,
    /// Broker acknowledged a subscription.
    Subscribed,
    /// Inbound publish.
    MessageReceived {
        topic: heapless::String<MAX_TOPIC>,
        payload: heapless::Vec<u8, MAX_PAYLOAD>,
    },

    // ── Timers ────────────────────────────────────────────
    /// The one-shot broker reconnect timer fired.
    ReconnectTimerExpired,
    /// Periodic status publication is due.
    StatusTick,

    // ── User input ────────────────────────────────────────
    /// Debounced button press.
    ButtonPressed,
}

impl NetEvent {
    /// Build a `MessageReceived`, or `None` if topic or payload exceed
    /// the queue's fixed capacities.
    pub fn message(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut t = heapless::String::new();
        t.push_str(topic).ok()?;
        let p = heapless::Vec::from_slice(payload).ok()?;
        Some(Self::MessageReceived { topic: t, payload: p })
    }
}

/// Bounded MPSC queue shared between callback contexts and the main loop.
///
/// `const`-constructible so the firmware can keep it in a `static`;
/// tests create their own instance.
pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, NetEvent, EVENT_QUEUE_CAP>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Push an event.  Safe to call from any task or callback.
    /// Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: NetEvent) -> bool {
        match self.channel.try_send(event) {
            Ok(()) => true,
            Err(embassy_sync::channel::TrySendError::Full(dropped)) => {
                warn!("EventQueue: full, dropping {:?}", dropped);
                false
            }
        }
    }

    /// Pop the next event, or `None` if the queue is empty.
    pub fn pop(&self) -> Option<NetEvent> {
        self.channel.try_receive().ok()
    }

    /// Drain all pending events into a callback, in FIFO order.
    pub fn drain(&self, mut handler: impl FnMut(NetEvent)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.channel.len()
    }
}
