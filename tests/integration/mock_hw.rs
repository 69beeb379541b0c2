//! Mock adapters for integration tests.
//!
//! [`MockIo`] records every outbound port call so tests can assert on the
//! full command history without a radio, a broker or a reboot.
//! [`MockNvs`] is an in-memory [`StoragePort`] with switchable write
//! failures.

#![allow(dead_code)]

use core::time::Duration;
use std::collections::HashMap;

use linkcfg::app::credentials::{Credentials, WIFI_NAMESPACE};
use linkcfg::app::events::AppEvent;
use linkcfg::app::ports::{
    BrokerError, BrokerPort, DeviceControl, EventSink, NetworkError, NetworkPort, Qos,
    ReconnectTimer, SessionOptions, StorageError, StoragePort,
};
use linkcfg::app::service::NetService;
use linkcfg::config::NetConfig;
use linkcfg::events::NetEvent;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum IoCall {
    ApplyCredentials { ssid: String, password: String },
    StartWifi,
    Associate,
    OpenSession(SessionOptions),
    RestartSession,
    Subscribe { topic: String, qos: Qos },
    Publish { topic: String, body: String, qos: Qos },
    ArmTimer(Duration),
    ScheduleRestart(Duration),
}

// ── MockIo ────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockIo {
    pub calls: Vec<IoCall>,
}

impl MockIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&IoCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn associations(&self) -> usize {
        self.count(|c| matches!(c, IoCall::Associate))
    }

    pub fn restarts_scheduled(&self) -> Vec<Duration> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                IoCall::ScheduleRestart(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    /// Bodies of every publish, parsed as JSON.
    pub fn published(&self) -> Vec<serde_json::Value> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                IoCall::Publish { body, .. } => serde_json::from_str(body).ok(),
                _ => None,
            })
            .collect()
    }

    pub fn last_applied(&self) -> Option<(String, String)> {
        self.calls.iter().rev().find_map(|c| match c {
            IoCall::ApplyCredentials { ssid, password } => Some((ssid.clone(), password.clone())),
            _ => None,
        })
    }
}

impl NetworkPort for MockIo {
    fn apply_credentials(&mut self, creds: &Credentials) -> Result<(), NetworkError> {
        self.calls.push(IoCall::ApplyCredentials {
            ssid: creds.ssid.as_str().into(),
            password: creds.password.as_str().into(),
        });
        Ok(())
    }

    fn start(&mut self) -> Result<(), NetworkError> {
        self.calls.push(IoCall::StartWifi);
        Ok(())
    }

    fn associate(&mut self) -> Result<(), NetworkError> {
        self.calls.push(IoCall::Associate);
        Ok(())
    }
}

impl BrokerPort for MockIo {
    fn open_session(&mut self, options: &SessionOptions) -> Result<(), BrokerError> {
        self.calls.push(IoCall::OpenSession(options.clone()));
        Ok(())
    }

    fn restart_session(&mut self) -> Result<(), BrokerError> {
        self.calls.push(IoCall::RestartSession);
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<(), BrokerError> {
        self.calls.push(IoCall::Subscribe {
            topic: topic.into(),
            qos,
        });
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], qos: Qos) -> Result<(), BrokerError> {
        self.calls.push(IoCall::Publish {
            topic: topic.into(),
            body: String::from_utf8_lossy(payload).into_owned(),
            qos,
        });
        Ok(())
    }
}

impl ReconnectTimer for MockIo {
    fn arm(&mut self, delay: Duration) {
        self.calls.push(IoCall::ArmTimer(delay));
    }
}

impl DeviceControl for MockIo {
    fn schedule_restart(&mut self, delay: Duration) {
        self.calls.push(IoCall::ScheduleRestart(delay));
    }
}

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNvs {
    store: HashMap<(String, String), String>,
    pub fail_writes: bool,
}

impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated with a stored credential pair.
    pub fn with_credentials(ssid: &str, password: &str) -> Self {
        let mut nvs = Self::new();
        nvs.put(WIFI_NAMESPACE, "ssid", ssid);
        nvs.put(WIFI_NAMESPACE, "password", password);
        nvs
    }

    pub fn put(&mut self, ns: &str, key: &str, value: &str) {
        self.store.insert((ns.into(), key.into()), value.into());
    }

    pub fn get(&self, ns: &str, key: &str) -> Option<&str> {
        self.store.get(&(ns.to_string(), key.to_string())).map(String::as_str)
    }

    /// Stored `(ssid, password)`, if both entries exist.
    pub fn stored_pair(&self) -> Option<(String, String)> {
        Some((
            self.get(WIFI_NAMESPACE, "ssid")?.into(),
            self.get(WIFI_NAMESPACE, "password")?.into(),
        ))
    }
}

impl StoragePort for MockNvs {
    fn read_str(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let value = self.get(namespace, key).ok_or(StorageError::NotFound)?;
        let bytes = value.as_bytes();
        if bytes.len() > buf.len() {
            return Err(StorageError::InvalidValue);
        }
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    fn write_batch(&mut self, namespace: &str, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError(0));
        }
        for (key, value) in entries {
            self.put(namespace, key, value);
        }
        Ok(())
    }

    fn erase_namespace(&mut self, namespace: &str) -> Result<(), StorageError> {
        self.store.retain(|(ns, _), _| ns != namespace);
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.get(namespace, key).is_some()
    }
}

// ── LogSink ───────────────────────────────────────────────────

/// Event sink that records every [`AppEvent`].
#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

pub struct Rig {
    pub svc: NetService<MockNvs>,
    pub io: MockIo,
    pub sink: LogSink,
}

impl Rig {
    /// Service started over `nvs`, with the WiFi start event delivered.
    pub fn started(nvs: MockNvs) -> Self {
        let mut rig = Self {
            svc: NetService::new(NetConfig::default(), nvs, "esp32_efcafe"),
            io: MockIo::new(),
            sink: LogSink::new(),
        };
        rig.svc
            .start(&mut rig.io, &mut rig.sink)
            .expect("start succeeds with mocks");
        rig.feed(NetEvent::WifiStarted);
        rig
    }

    /// Started, associated, and with an active broker session.
    pub fn online(nvs: MockNvs) -> Self {
        let mut rig = Self::started(nvs);
        rig.feed(NetEvent::GotIp { ip: [192, 168, 1, 50] });
        rig.feed(NetEvent::SessionConnected);
        rig.io.clear();
        rig.sink.events.clear();
        rig
    }

    pub fn feed(&mut self, event: NetEvent) {
        self.svc.handle_event(event, &mut self.io, &mut self.sink);
    }

    pub fn control(&mut self, body: &str) {
        let event = NetEvent::message("nhatminh/control", body.as_bytes())
            .expect("test body fits the queue limits");
        self.feed(event);
    }
}
