//! MQTT client adapter.
//!
//! Implements [`BrokerPort`] over the ESP-IDF MQTT client.  The client
//! callback runs on the MQTT task and only translates events onto the
//! shared [`EventQueue`]:
//!
//! | Client event     | NetEvent              |
//! |------------------|-----------------------|
//! | `Connected`      | `SessionConnected`    |
//! | `Disconnected`   | `SessionDisconnected` |
//! | `Subscribed`     | `Subscribed`          |
//! | `Received`       | `MessageReceived`     |
//! | `Error`          | `SessionError`        |
//!
//! Automatic reconnection inside the client is disabled; the service
//! re-opens the session from its own reconnect timer.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{BrokerError, BrokerPort, Qos, SessionOptions};
use crate::events::{EventQueue, NetEvent};

// ───────────────────────────────────────────────────────────────
// MQTT adapter (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct MqttAdapter {
    queue: &'static EventQueue,
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    options: Option<SessionOptions>,
}

#[cfg(target_os = "espidf")]
fn to_esp_qos(qos: Qos) -> esp_idf_svc::mqtt::client::QoS {
    use esp_idf_svc::mqtt::client::QoS;
    match qos {
        Qos::AtMostOnce => QoS::AtMostOnce,
        Qos::AtLeastOnce => QoS::AtLeastOnce,
    }
}

#[cfg(target_os = "espidf")]
impl MqttAdapter {
    pub fn new(queue: &'static EventQueue) -> Self {
        Self {
            queue,
            client: None,
            options: None,
        }
    }

    fn connect(&mut self, options: &SessionOptions) -> Result<(), BrokerError> {
        use esp_idf_svc::mqtt::client::{
            EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration,
        };

        let conf = MqttClientConfiguration {
            client_id: Some(options.client_id.as_str()),
            lwt: Some(LwtConfiguration {
                topic: options.last_will.topic.as_str(),
                payload: options.last_will.payload.as_bytes(),
                qos: to_esp_qos(options.last_will.qos),
                retain: options.last_will.retain,
            }),
            // No client-side retry: the reconnect timer is the only path.
            reconnect_timeout: None,
            ..Default::default()
        };

        let queue = self.queue;
        let client = EspMqttClient::new_cb(&options.broker_uri, &conf, move |event| {
            let translated = match event.payload() {
                EventPayload::Connected(_) => Some(NetEvent::SessionConnected),
                EventPayload::Disconnected => Some(NetEvent::SessionDisconnected),
                EventPayload::Subscribed(_) => Some(NetEvent::Subscribed),
                EventPayload::Error(_) => Some(NetEvent::SessionError),
                EventPayload::Received { topic, data, .. } => {
                    let topic = topic.unwrap_or_default();
                    let msg = NetEvent::message(topic, data);
                    if msg.is_none() {
                        warn!("MQTT: dropping oversized message on '{}'", topic);
                    }
                    msg
                }
                _ => None,
            };
            if let Some(e) = translated {
                queue.push(e);
            }
        })
        .map_err(|e| BrokerError::Client(e.code()))?;

        // Dropping the old client stops and destroys it.
        self.client = Some(client);
        info!("MQTT: connecting to {} as '{}'", options.broker_uri, options.client_id);
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl BrokerPort for MqttAdapter {
    fn open_session(&mut self, options: &SessionOptions) -> Result<(), BrokerError> {
        self.connect(options)?;
        self.options = Some(options.clone());
        Ok(())
    }

    fn restart_session(&mut self) -> Result<(), BrokerError> {
        let options = self.options.clone().ok_or(BrokerError::NoSession)?;
        self.client = None;
        self.connect(&options)
    }

    fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<(), BrokerError> {
        let client = self.client.as_mut().ok_or(BrokerError::NoSession)?;
        client
            .subscribe(topic, to_esp_qos(qos))
            .map_err(|e| BrokerError::Client(e.code()))?;
        info!("MQTT: subscribing to '{}'", topic);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], qos: Qos) -> Result<(), BrokerError> {
        let client = self.client.as_mut().ok_or(BrokerError::NoSession)?;
        client
            .publish(topic, to_esp_qos(qos), false, payload)
            .map_err(|e| BrokerError::Client(e.code()))?;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// MQTT adapter (simulation)
// ───────────────────────────────────────────────────────────────

/// One publish seen by the simulated broker.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: Qos,
}

/// Loopback broker: records publishes and answers session requests
/// with the events a real broker would produce.
#[cfg(not(target_os = "espidf"))]
pub struct MqttAdapter {
    queue: &'static EventQueue,
    options: Option<SessionOptions>,
    subscriptions: Vec<String>,
    published: Vec<Published>,
    restarts: u32,
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    pub fn new(queue: &'static EventQueue) -> Self {
        Self {
            queue,
            options: None,
            subscriptions: Vec::new(),
            published: Vec::new(),
            restarts: 0,
        }
    }

    pub fn options(&self) -> Option<&SessionOptions> {
        self.options.as_ref()
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    pub fn published(&self) -> &[Published] {
        &self.published
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Simulate the broker dropping the session.
    pub fn drop_session(&self) {
        self.queue.push(NetEvent::SessionDisconnected);
    }

    /// Simulate an inbound publish from another client.
    pub fn deliver(&self, topic: &str, payload: &[u8]) -> bool {
        NetEvent::message(topic, payload).is_some_and(|e| self.queue.push(e))
    }
}

#[cfg(not(target_os = "espidf"))]
impl BrokerPort for MqttAdapter {
    fn open_session(&mut self, options: &SessionOptions) -> Result<(), BrokerError> {
        info!("MQTT(sim): session open to {}", options.broker_uri);
        self.options = Some(options.clone());
        self.queue.push(NetEvent::SessionConnected);
        Ok(())
    }

    fn restart_session(&mut self) -> Result<(), BrokerError> {
        if self.options.is_none() {
            return Err(BrokerError::NoSession);
        }
        self.restarts += 1;
        self.queue.push(NetEvent::SessionConnected);
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, _qos: Qos) -> Result<(), BrokerError> {
        if self.options.is_none() {
            return Err(BrokerError::NoSession);
        }
        self.subscriptions.push(topic.into());
        self.queue.push(NetEvent::Subscribed);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], qos: Qos) -> Result<(), BrokerError> {
        if self.options.is_none() {
            return Err(BrokerError::NoSession);
        }
        self.published.push(Published {
            topic: topic.into(),
            payload: payload.to_vec(),
            qos,
        });
        Ok(())
    }
}
