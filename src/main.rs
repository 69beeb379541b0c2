//! linkcfg firmware: main entry point.
//!
//! Hexagonal architecture with a single event-driven control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WifiAdapter    MqttAdapter    ReconnectTimer   SystemAdapter  │
//! │  (NetworkPort)  (BrokerPort)   (ReconnectTimer) (DeviceControl)│
//! │  NvsAdapter     LogEventSink                                   │
//! │  (StoragePort)  (EventSink)                                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              NetService (pure logic)                   │    │
//! │  │  LinkFsm · credentials · session · control commands    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  EventQueue ◀── driver callbacks, timers, button sampling      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::info;

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_hal::gpio::{PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use linkcfg::adapters::device_id;
use linkcfg::adapters::io::DeviceIo;
use linkcfg::adapters::log_sink::LogEventSink;
use linkcfg::adapters::mqtt::MqttAdapter;
use linkcfg::adapters::nvs::NvsAdapter;
use linkcfg::adapters::system::SystemAdapter;
use linkcfg::adapters::time::{Esp32TimeAdapter, ReconnectTimerAdapter};
use linkcfg::adapters::wifi::WifiAdapter;
use linkcfg::app::service::NetService;
use linkcfg::config::NetConfig;
use linkcfg::drivers::button::ButtonDriver;
use linkcfg::drivers::status_led::{BlinkInterval, StatusLed};
use linkcfg::events::{EventQueue, NetEvent};
use linkcfg::pins;

/// Inbound events from every callback context.
static EVENTS: EventQueue = EventQueue::new();

/// Blink half-period shared with the LED thread.
static BLINK: BlinkInterval = BlinkInterval::new(500);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("linkcfg v{}", env!("CARGO_PKG_VERSION"));

    let config = NetConfig::default();
    config.validate().map_err(linkcfg::error::Error::from)?;

    // ── 2. Persistence (fatal on failure) ─────────────────────
    let nvs = NvsAdapter::new().map_err(|e| {
        log::error!("NVS init failed: {}", e);
        linkcfg::error::Error::from(e)
    })?;

    // ── 3. Peripherals and adapters ───────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let mut io = DeviceIo {
        wifi: WifiAdapter::new(peripherals.modem, sysloop, nvs_partition, &EVENTS)?,
        mqtt: MqttAdapter::new(&EVENTS),
        timer: ReconnectTimerAdapter::new(&EVENTS)?,
        system: SystemAdapter::new(),
    };
    let mut sink = LogEventSink::new();

    let client_id = device_id::mqtt_client_id(&device_id::read_mac());
    info!("Client id: {}", client_id);

    // ── 4. Blink LED thread ───────────────────────────────────
    info!("LED on GPIO{}, button on GPIO{}", pins::LED_GPIO, pins::BUTTON_GPIO);
    BLINK.set(config.initial_blink_interval_ms);
    let led_pin = PinDriver::output(peripherals.pins.gpio48)?;
    thread::Builder::new()
        .name("blink".into())
        .stack_size(2048)
        .spawn(move || {
            let mut led = StatusLed::new(led_pin);
            loop {
                let wait_ms = led.step(&BLINK);
                thread::sleep(Duration::from_millis(u64::from(wait_ms)));
            }
        })?;

    let mut button_pin = PinDriver::input(peripherals.pins.gpio0)?;
    button_pin.set_pull(Pull::Up)?;
    let mut button = ButtonDriver::new(pins::BUTTON_GPIO, config.button_debounce_ms);

    // ── 5. Service start ──────────────────────────────────────
    let status_period_ms = config.status_interval_secs.saturating_mul(1000);
    let mut service = NetService::new(config, nvs, client_id.as_str());
    service.start(&mut io, &mut sink)?;

    info!("System ready. Entering event loop.");

    // ── 6. Event loop ─────────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut last_status_ms = clock.uptime_ms();

    loop {
        let now = clock.uptime_ms();

        if button.tick(now, button_pin.is_low()) {
            EVENTS.push(NetEvent::ButtonPressed);
        }
        if now.wrapping_sub(last_status_ms) >= status_period_ms {
            last_status_ms = now;
            EVENTS.push(NetEvent::StatusTick);
        }

        EVENTS.drain(|event| service.handle_event(event, &mut io, &mut sink));
        BLINK.set(service.blink_interval());

        thread::sleep(Duration::from_millis(u64::from(pins::BUTTON_POLL_MS)));
    }
}
