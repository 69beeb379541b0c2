//! Bundle of the driven adapters the service needs per event.
//!
//! [`NetService::handle_event`](crate::app::service::NetService::handle_event)
//! takes one value implementing every outbound port; [`DeviceIo`] owns
//! the concrete adapters and forwards each trait to the right one.

use core::time::Duration;

use crate::app::credentials::Credentials;
use crate::app::ports::{
    BrokerError, BrokerPort, DeviceControl, NetworkError, NetworkPort, Qos, ReconnectTimer,
    SessionOptions,
};

use super::mqtt::MqttAdapter;
use super::system::SystemAdapter;
use super::time::ReconnectTimerAdapter;
use super::wifi::WifiAdapter;

pub struct DeviceIo {
    pub wifi: WifiAdapter,
    pub mqtt: MqttAdapter,
    pub timer: ReconnectTimerAdapter,
    pub system: SystemAdapter,
}

impl NetworkPort for DeviceIo {
    fn apply_credentials(&mut self, creds: &Credentials) -> Result<(), NetworkError> {
        self.wifi.apply_credentials(creds)
    }

    fn start(&mut self) -> Result<(), NetworkError> {
        self.wifi.start()
    }

    fn associate(&mut self) -> Result<(), NetworkError> {
        self.wifi.associate()
    }
}

impl BrokerPort for DeviceIo {
    fn open_session(&mut self, options: &SessionOptions) -> Result<(), BrokerError> {
        self.mqtt.open_session(options)
    }

    fn restart_session(&mut self) -> Result<(), BrokerError> {
        self.mqtt.restart_session()
    }

    fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<(), BrokerError> {
        self.mqtt.subscribe(topic, qos)
    }

    fn publish(&mut self, topic: &str, payload: &[u8], qos: Qos) -> Result<(), BrokerError> {
        self.mqtt.publish(topic, payload, qos)
    }
}

impl ReconnectTimer for DeviceIo {
    fn arm(&mut self, delay: Duration) {
        self.timer.arm(delay);
    }
}

impl DeviceControl for DeviceIo {
    fn schedule_restart(&mut self, delay: Duration) {
        self.system.schedule_restart(delay);
    }
}
