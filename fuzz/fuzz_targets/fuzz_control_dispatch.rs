//! Fuzz target: `NetService::handle_event(MessageReceived)`
//!
//! Feeds arbitrary control bodies to an online service over the host
//! simulation adapters.  Whatever arrives, at most one restart may be
//! scheduled, and only together with the pending flag.
//!
//! cargo fuzz run fuzz_control_dispatch

#![no_main]

use libfuzzer_sys::fuzz_target;
use linkcfg::adapters::io::DeviceIo;
use linkcfg::adapters::log_sink::LogEventSink;
use linkcfg::adapters::mqtt::MqttAdapter;
use linkcfg::adapters::nvs::NvsAdapter;
use linkcfg::adapters::system::SystemAdapter;
use linkcfg::adapters::time::ReconnectTimerAdapter;
use linkcfg::adapters::wifi::WifiAdapter;
use linkcfg::app::service::NetService;
use linkcfg::config::NetConfig;
use linkcfg::events::{EventQueue, NetEvent};

static QUEUE: EventQueue = EventQueue::new();

fuzz_target!(|data: &[u8]| {
    while QUEUE.pop().is_some() {}

    let Ok(nvs) = NvsAdapter::new() else { return };
    let mut svc = NetService::new(NetConfig::default(), nvs, "esp32_f022e5");
    let mut io = DeviceIo {
        wifi: WifiAdapter::new(&QUEUE),
        mqtt: MqttAdapter::new(&QUEUE),
        timer: ReconnectTimerAdapter::new(&QUEUE),
        system: SystemAdapter::new(),
    };
    let mut sink = LogEventSink::new();

    if svc.start(&mut io, &mut sink).is_err() {
        return;
    }
    QUEUE.push(NetEvent::GotIp { ip: [10, 0, 0, 1] });
    QUEUE.drain(|e| svc.handle_event(e, &mut io, &mut sink));

    for chunk in data.split(|&b| b == 0) {
        if let Some(msg) = NetEvent::message("nhatminh/control", chunk) {
            svc.handle_event(msg, &mut io, &mut sink);
        }
    }

    assert_eq!(
        io.system.scheduled().len(),
        usize::from(svc.restart_pending()),
        "at most one restart, and only once one is pending"
    );
});
