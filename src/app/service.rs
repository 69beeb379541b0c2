//! Connectivity service, the hexagonal core.
//!
//! [`NetService`] owns the credentials, the link FSM, the broker session
//! flags and the blink interval.  It is the only mutator of that state:
//! the main loop feeds it one [`NetEvent`] at a time, and every side
//! effect goes out through port traits injected at the call site, so the
//! whole service is testable with mock adapters.
//!
//! ```text
//!  NetEvent ──▶ ┌────────────────────────────┐ ──▶ NetworkPort
//!               │         NetService         │ ──▶ BrokerPort
//!  StoragePort ◀│ LinkFsm · creds · session  │ ──▶ ReconnectTimer
//!               └────────────────────────────┘ ──▶ DeviceControl
//!                              │
//!                              ▼ EventSink
//! ```

use core::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::{NetConfig, next_blink_interval};
use crate::events::NetEvent;
use crate::fsm::{LinkAction, LinkFsm};

use super::commands::{self, ControlCommand};
use super::credentials::{CredentialStore, Credentials};
use super::events::{
    ACK_CLEARED, ACK_UPDATED, AckPayload, AppEvent, OFFLINE_PAYLOAD, StatusPayload,
    WifiInfoPayload,
};
use super::ports::{
    BrokerPort, DeviceControl, EventSink, LastWill, NetworkPort, Qos, ReconnectTimer,
    SessionOptions, StoragePort,
};

// ───────────────────────────────────────────────────────────────
// NetService
// ───────────────────────────────────────────────────────────────

pub struct NetService<S: StoragePort> {
    store: CredentialStore<S>,
    creds: Credentials,
    fsm: LinkFsm,
    config: NetConfig,
    client_id: String,
    /// A broker client exists (created on the first address).
    session_open: bool,
    /// The broker has acknowledged the session.
    session_active: bool,
    blink_interval_ms: u32,
    /// A restart is scheduled; credential commands are refused.
    restart_pending: bool,
}

impl<S: StoragePort> NetService<S> {
    /// Construct the service.  Nothing is read or started until [`start`].
    ///
    /// [`start`]: Self::start
    pub fn new(config: NetConfig, storage: S, client_id: impl Into<String>) -> Self {
        Self {
            store: CredentialStore::new(storage),
            creds: Credentials::default(),
            fsm: LinkFsm::new(config.max_retries),
            blink_interval_ms: config.initial_blink_interval_ms,
            config,
            client_id: client_id.into(),
            session_open: false,
            session_active: false,
            restart_pending: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load credentials (substituting and persisting the defaults when
    /// nothing is stored), configure the station and start it.
    ///
    /// Association begins when the driver reports `WifiStarted`.
    pub fn start(
        &mut self,
        net: &mut impl NetworkPort,
        sink: &mut impl EventSink,
    ) -> crate::error::Result<()> {
        self.creds = self.store.load();
        if self.creds.is_empty() {
            info!("No stored credentials, using defaults");
            self.creds = Credentials::factory_default();
            if let Err(e) = self.store.save(&self.creds) {
                warn!("Could not persist default credentials: {}", e);
            }
        }

        net.apply_credentials(&self.creds)?;
        net.start()?;

        sink.emit(&AppEvent::Started {
            ssid: self.creds.ssid.as_str().into(),
        });
        info!("NetService started (SSID '{}')", self.creds.ssid);
        Ok(())
    }

    // ── Event dispatch ────────────────────────────────────────

    /// Process one inbound event.
    ///
    /// `io` satisfies every driven port; passing a single value keeps the
    /// borrow simple while the port boundary stays explicit.
    pub fn handle_event(
        &mut self,
        event: NetEvent,
        io: &mut (impl NetworkPort + BrokerPort + ReconnectTimer + DeviceControl),
        sink: &mut impl EventSink,
    ) {
        match event {
            NetEvent::WifiStarted => {
                let action = self.drive_fsm(sink, LinkFsm::on_started);
                self.apply_link_action(action, io, sink);
            }
            NetEvent::WifiDisconnected { reason } => {
                let on_defaults = self.creds.is_factory_default();
                let action = self.drive_fsm(sink, |fsm| fsm.on_disconnected(reason, on_defaults));
                self.apply_link_action(action, io, sink);
            }
            NetEvent::GotIp { ip } => {
                info!("Got IP {}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]);
                let action = self.drive_fsm(sink, LinkFsm::on_got_ip);
                self.apply_link_action(action, io, sink);
            }

            NetEvent::SessionConnected => {
                info!("MQTT connected");
                self.session_active = true;
                if let Err(e) = io.subscribe(&self.config.control_topic, Qos::AtMostOnce) {
                    warn!("Subscribe to '{}' failed: {}", self.config.control_topic, e);
                }
                sink.emit(&AppEvent::SessionUp);
                self.publish_status(io);
            }
            NetEvent::SessionDisconnected => {
                info!("MQTT disconnected");
                self.session_active = false;
                io.arm(Duration::from_millis(u64::from(self.config.reconnect_delay_ms)));
                sink.emit(&AppEvent::SessionDown);
            }
            NetEvent::SessionError => warn!("MQTT client reported an error"),
            NetEvent::Subscribed => info!("MQTT subscription acknowledged"),
            NetEvent::MessageReceived { topic, payload } => {
                if topic.as_str() != self.config.control_topic {
                    debug!("Ignoring message on '{}'", topic);
                    return;
                }
                self.handle_control(&payload, io, sink);
            }

            NetEvent::ReconnectTimerExpired => {
                // The link may have brought the session back already.
                if self.session_active {
                    debug!("Reconnect timer fired on a live session, ignoring");
                    return;
                }
                info!("Reconnecting to MQTT broker");
                self.start_session(io);
            }
            NetEvent::StatusTick => self.publish_status(io),
            NetEvent::ButtonPressed => {
                self.blink_interval_ms = next_blink_interval(self.blink_interval_ms);
                info!("Blink interval now {} ms", self.blink_interval_ms);
                sink.emit(&AppEvent::BlinkChanged {
                    interval_ms: self.blink_interval_ms,
                });
                self.publish_status(io);
            }
        }
    }

    /// Publish `{"status":"online","blinkInterval":n}`.  No-op without an
    /// active session.
    pub fn publish_status(&self, broker: &mut impl BrokerPort) {
        let body = StatusPayload {
            status: "online",
            blink_interval: self.blink_interval_ms,
        };
        self.publish_json(broker, &body);
    }

    // ── Control commands ──────────────────────────────────────

    fn handle_control(
        &mut self,
        body: &[u8],
        io: &mut (impl BrokerPort + DeviceControl),
        sink: &mut impl EventSink,
    ) {
        let cmds = match commands::decode(body) {
            Ok(cmds) => cmds,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };
        if cmds.is_empty() {
            debug!("Control message carried no command");
        }
        for cmd in cmds {
            self.handle_command(cmd, io, sink);
        }
    }

    fn handle_command(
        &mut self,
        cmd: ControlCommand,
        io: &mut (impl BrokerPort + DeviceControl),
        sink: &mut impl EventSink,
    ) {
        match cmd {
            ControlCommand::QueryStatus => {
                let body = WifiInfoPayload {
                    ssid: self.creds.ssid.as_str(),
                    connected: self.fsm.is_connected(),
                };
                self.publish_json(io, &body);
            }
            ControlCommand::ClearCredentials => {
                if self.restart_pending {
                    debug!("clear_wifi ignored: restart pending");
                    sink.emit(&AppEvent::CommandIgnored("restart pending"));
                    return;
                }
                if let Err(e) = self.store.erase_all() {
                    warn!("Erasing credentials failed: {}", e);
                }
                self.creds = Credentials::factory_default();
                sink.emit(&AppEvent::CredentialsCleared);
                self.publish_json(io, &AckPayload::success(ACK_CLEARED));
                self.schedule_restart(io, sink);
            }
            ControlCommand::SetCredentials { ssid, password } => {
                if self.restart_pending {
                    debug!("wifi_config ignored: restart pending");
                    sink.emit(&AppEvent::CommandIgnored("restart pending"));
                    return;
                }
                let creds = match Credentials::new(&ssid, &password) {
                    Ok(c) => c,
                    Err(e) => {
                        debug!("wifi_config ignored: {}", e);
                        sink.emit(&AppEvent::CommandIgnored("invalid credentials"));
                        return;
                    }
                };
                if let Err(e) = self.store.save(&creds) {
                    warn!("Saving new credentials failed: {}", e);
                    return;
                }
                self.creds = creds;
                sink.emit(&AppEvent::CredentialsChanged { ssid });
                self.publish_json(io, &AckPayload::success(ACK_UPDATED));
                self.schedule_restart(io, sink);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Credentials currently in use.
    pub fn credentials(&self) -> &Credentials {
        &self.creds
    }

    pub fn is_fallback(&self) -> bool {
        self.fsm.using_fallback()
    }

    /// Disconnections counted since the last association.
    pub fn attempts(&self) -> u32 {
        self.fsm.attempts()
    }

    pub fn is_connected(&self) -> bool {
        self.fsm.is_connected()
    }

    pub fn session_active(&self) -> bool {
        self.session_active
    }

    pub fn blink_interval(&self) -> u32 {
        self.blink_interval_ms
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_pending
    }

    pub fn store(&self) -> &CredentialStore<S> {
        &self.store
    }

    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Run one FSM step and report any state change.
    fn drive_fsm(
        &mut self,
        sink: &mut impl EventSink,
        step: impl FnOnce(&mut LinkFsm) -> LinkAction,
    ) -> LinkAction {
        let from = self.fsm.state();
        let action = step(&mut self.fsm);
        let to = self.fsm.state();
        if from != to {
            sink.emit(&AppEvent::LinkChanged { from, to });
        }
        action
    }

    fn apply_link_action(
        &mut self,
        action: LinkAction,
        io: &mut (impl NetworkPort + BrokerPort),
        sink: &mut impl EventSink,
    ) {
        match action {
            LinkAction::Associate => self.associate(io),
            LinkAction::FallBack => {
                self.creds = Credentials::factory_default();
                if let Err(e) = self.store.save(&self.creds) {
                    warn!("Could not persist default credentials: {}", e);
                }
                if let Err(e) = io.apply_credentials(&self.creds) {
                    warn!("Applying default credentials failed: {}", e);
                }
                sink.emit(&AppEvent::FallbackActivated);
                self.associate(io);
            }
            LinkAction::StartSession => self.start_session(io),
        }
    }

    fn associate(&self, net: &mut impl NetworkPort) {
        if let Err(e) = net.associate() {
            warn!("Association request failed: {}", e);
        }
    }

    /// Create the broker client on first use, restart it afterwards.
    fn start_session(&mut self, broker: &mut impl BrokerPort) {
        if self.session_open {
            if let Err(e) = broker.restart_session() {
                warn!("MQTT restart failed: {}", e);
            }
            return;
        }
        match broker.open_session(&self.session_options()) {
            Ok(()) => self.session_open = true,
            Err(e) => warn!("MQTT session open failed: {}", e),
        }
    }

    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            broker_uri: self.config.broker_uri.clone(),
            client_id: self.client_id.clone(),
            last_will: LastWill {
                topic: self.config.status_topic.clone(),
                payload: OFFLINE_PAYLOAD.into(),
                qos: Qos::AtLeastOnce,
                retain: false,
            },
        }
    }

    fn schedule_restart(&mut self, device: &mut impl DeviceControl, sink: &mut impl EventSink) {
        self.restart_pending = true;
        device.schedule_restart(Duration::from_millis(u64::from(self.config.restart_delay_ms)));
        sink.emit(&AppEvent::RestartScheduled {
            delay_ms: self.config.restart_delay_ms,
        });
    }

    /// Serialise `body` and publish it on the status topic.
    fn publish_json(&self, broker: &mut impl BrokerPort, body: &impl Serialize) {
        if !self.session_active {
            debug!("No active MQTT session, skipping publish");
            return;
        }
        let bytes = match serde_json::to_vec(body) {
            Ok(b) => b,
            Err(e) => {
                warn!("Payload serialisation failed: {}", e);
                return;
            }
        };
        if let Err(e) = broker.publish(&self.config.status_topic, &bytes, Qos::AtLeastOnce) {
            warn!("Publish to '{}' failed: {}", self.config.status_topic, e);
        }
    }
}
