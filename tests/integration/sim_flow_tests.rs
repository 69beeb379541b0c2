//! End-to-end flow over the host simulation adapters.
//!
//! Unlike the mock-based tests, every event here travels through a real
//! [`EventQueue`]: adapters push, the loop drains, exactly as on target.

use core::time::Duration;

use linkcfg::adapters::io::DeviceIo;
use linkcfg::adapters::log_sink::LogEventSink;
use linkcfg::adapters::mqtt::MqttAdapter;
use linkcfg::adapters::nvs::NvsAdapter;
use linkcfg::adapters::system::SystemAdapter;
use linkcfg::adapters::time::ReconnectTimerAdapter;
use linkcfg::adapters::wifi::WifiAdapter;
use linkcfg::app::service::NetService;
use linkcfg::config::NetConfig;
use linkcfg::events::EventQueue;

struct Device {
    queue: &'static EventQueue,
    svc: NetService<NvsAdapter>,
    io: DeviceIo,
    sink: LogEventSink,
}

impl Device {
    fn boot() -> Self {
        let queue: &'static EventQueue = Box::leak(Box::new(EventQueue::new()));
        let mut dev = Self {
            queue,
            svc: NetService::new(NetConfig::default(), NvsAdapter::new().unwrap(), "esp32_efcafe"),
            io: DeviceIo {
                wifi: WifiAdapter::new(queue),
                mqtt: MqttAdapter::new(queue),
                timer: ReconnectTimerAdapter::new(queue),
                system: SystemAdapter::new(),
            },
            sink: LogEventSink::new(),
        };
        dev.svc.start(&mut dev.io, &mut dev.sink).unwrap();
        dev.run();
        dev
    }

    /// Drain until the queue is quiet (handlers may enqueue follow-ups).
    fn run(&mut self) {
        while let Some(event) = self.queue.pop() {
            self.svc.handle_event(event, &mut self.io, &mut self.sink);
        }
    }
}

#[test]
fn boot_to_online() {
    let mut dev = Device::boot();
    assert!(dev.io.wifi.is_started());
    assert_eq!(dev.io.wifi.associations(), 1);
    assert_eq!(dev.io.wifi.ssid(), "TRUC ANH");

    dev.io.wifi.inject_got_ip([192, 168, 1, 50]);
    dev.run();

    assert!(dev.svc.session_active());
    assert_eq!(dev.io.mqtt.subscriptions(), &["nhatminh/control".to_string()]);
    let status = &dev.io.mqtt.published()[0];
    assert_eq!(status.topic, "nhatminh/data");
    assert_eq!(status.payload, br#"{"status":"online","blinkInterval":500}"#.to_vec());
}

#[test]
fn remote_credential_update_round_trip() {
    let mut dev = Device::boot();
    dev.io.wifi.inject_got_ip([192, 168, 1, 50]);
    dev.run();

    assert!(dev.io.mqtt.deliver(
        "nhatminh/control",
        br#"{"wifi_config":true,"ssid":"Home","password":"secret123"}"#,
    ));
    dev.run();

    assert_eq!(dev.io.system.scheduled(), &[Duration::from_millis(500)]);
    let loaded = dev.svc.store().load();
    assert_eq!(loaded.ssid.as_str(), "Home");
    assert_eq!(loaded.password.as_str(), "secret123");
    let ack = dev.io.mqtt.published().last().unwrap();
    assert_eq!(
        ack.payload,
        br#"{"status":"success","message":"WiFi credentials updated"}"#.to_vec()
    );
}

#[test]
fn broker_loss_reconnects_after_delay() {
    let mut dev = Device::boot();
    dev.io.wifi.inject_got_ip([192, 168, 1, 50]);
    dev.run();

    dev.io.mqtt.drop_session();
    dev.run();
    assert!(!dev.svc.session_active());
    assert!(dev.io.timer.is_armed());

    dev.io.timer.advance(Duration::from_secs(9));
    dev.run();
    assert_eq!(dev.io.mqtt.restarts(), 0);

    dev.io.timer.advance(Duration::from_secs(1));
    dev.run();
    assert_eq!(dev.io.mqtt.restarts(), 1);
    assert!(dev.svc.session_active());
}

#[test]
fn repeated_wifi_failures_land_on_defaults() {
    let mut dev = Device::boot();
    // Move off the defaults first, as if a previous boot stored a pair.
    dev.svc = NetService::new(
        NetConfig::default(),
        {
            let mut nvs = NvsAdapter::new().unwrap();
            linkcfg::app::ports::StoragePort::write_batch(
                &mut nvs,
                "wifi-config",
                &[("ssid", "Home"), ("password", "secret123")],
            )
            .unwrap();
            nvs
        },
        "esp32_efcafe",
    );
    dev.svc.start(&mut dev.io, &mut dev.sink).unwrap();
    dev.run();
    assert_eq!(dev.io.wifi.ssid(), "Home");

    for _ in 0..5 {
        dev.io.wifi.inject_disconnect(201);
        dev.run();
    }
    assert!(dev.svc.is_fallback());
    assert_eq!(dev.io.wifi.ssid(), "TRUC ANH");
    assert_eq!(dev.svc.store().load().ssid.as_str(), "TRUC ANH");
}
