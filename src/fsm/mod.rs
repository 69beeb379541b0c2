//! WiFi link state machine.
//!
//! Pure logic: consumes link events, returns the action the caller must
//! perform.  No I/O happens here, so the retry and fallback policy is
//! testable without a radio.
//!
//! ```text
//!                 WifiStarted
//!  Disconnected ─────────────▶ Connecting ◀──────────┐
//!                                 │    ▲              │ disconnect
//!                          GotIp  │    │ disconnect   │ (attempts++)
//!                                 ▼    │              │
//!                              Connected ─────────────┘
//!
//!  UsingFallback: false ──(attempts reach limit, creds ≠ default)──▶ true
//! ```
//!
//! The fallback flag is sticky for the life of the process.  Once set,
//! disconnections no longer count attempts and the device keeps retrying
//! the default credentials indefinitely.

use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

/// What the caller must do after feeding an event to [`LinkFsm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Start (or retry) association with the current credentials.
    Associate,
    /// Switch to the default credentials: overwrite the in-memory pair,
    /// persist it, re-apply the network configuration, then associate.
    FallBack,
    /// An address was assigned: open the broker session, or restart it
    /// if one already exists.
    StartSession,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct LinkFsm {
    state: LinkState,
    attempts: u32,
    using_fallback: bool,
    max_retries: u32,
}

impl LinkFsm {
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: LinkState::Disconnected,
            attempts: 0,
            using_fallback: false,
            max_retries,
        }
    }

    /// Station interface is up: begin the first association.
    pub fn on_started(&mut self) -> LinkAction {
        self.attempts = 0;
        self.transition(LinkState::Connecting);
        LinkAction::Associate
    }

    /// Address assigned: the link is usable.
    pub fn on_got_ip(&mut self) -> LinkAction {
        self.attempts = 0;
        self.transition(LinkState::Connected);
        LinkAction::StartSession
    }

    /// Association lost or failed.
    ///
    /// `creds_are_default` tells the FSM whether falling back would change
    /// anything; a device already on the default pair just keeps retrying.
    pub fn on_disconnected(&mut self, reason: u16, creds_are_default: bool) -> LinkAction {
        self.transition(LinkState::Connecting);

        if self.using_fallback {
            info!("Link: disconnected (reason {}), retrying default network", reason);
            return LinkAction::Associate;
        }

        self.attempts = self.attempts.saturating_add(1);
        info!(
            "Link: disconnected (reason {}), reconnecting (attempt {})",
            reason, self.attempts
        );

        if self.attempts >= self.max_retries && !creds_are_default {
            info!(
                "Link: {} failed attempts, switching to default network",
                self.attempts
            );
            self.using_fallback = true;
            self.attempts = 0;
            return LinkAction::FallBack;
        }

        LinkAction::Associate
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn using_fallback(&self) -> bool {
        self.using_fallback
    }

    fn transition(&mut self, next: LinkState) {
        if next != self.state {
            info!("Link transition: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
