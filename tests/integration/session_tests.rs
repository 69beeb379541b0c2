//! Broker session lifecycle: open, subscribe, status, loss and reconnect.

use core::time::Duration;

use linkcfg::app::events::AppEvent;
use linkcfg::app::ports::Qos;
use linkcfg::events::NetEvent;

use crate::mock_hw::{IoCall, MockNvs, Rig};

#[test]
fn first_address_opens_session_with_last_will() {
    let mut rig = Rig::started(MockNvs::new());
    rig.feed(NetEvent::GotIp { ip: [192, 168, 1, 50] });

    let opens: Vec<_> = rig
        .io
        .calls
        .iter()
        .filter_map(|c| match c {
            IoCall::OpenSession(o) => Some(o.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(opens.len(), 1);
    let opts = &opens[0];
    assert_eq!(opts.broker_uri, "mqtt://test.mosquitto.org");
    assert_eq!(opts.client_id, "esp32_efcafe");
    assert_eq!(opts.last_will.topic, "nhatminh/data");
    assert_eq!(opts.last_will.payload, r#"{"status":"offline"}"#);
    assert_eq!(opts.last_will.qos, Qos::AtLeastOnce);
    assert!(!opts.last_will.retain);
}

#[test]
fn later_addresses_restart_the_session() {
    let mut rig = Rig::started(MockNvs::new());
    rig.feed(NetEvent::GotIp { ip: [192, 168, 1, 50] });
    rig.feed(NetEvent::WifiDisconnected { reason: 8 });
    rig.feed(NetEvent::GotIp { ip: [192, 168, 1, 51] });

    assert_eq!(rig.io.count(|c| matches!(c, IoCall::OpenSession(_))), 1);
    assert_eq!(rig.io.count(|c| matches!(c, IoCall::RestartSession)), 1);
}

#[test]
fn connect_subscribes_and_announces_online() {
    let mut rig = Rig::started(MockNvs::new());
    rig.feed(NetEvent::GotIp { ip: [192, 168, 1, 50] });
    rig.io.clear();
    rig.feed(NetEvent::SessionConnected);

    assert!(rig.svc.session_active());
    assert_eq!(
        rig.io.calls[0],
        IoCall::Subscribe {
            topic: "nhatminh/control".into(),
            qos: Qos::AtMostOnce,
        }
    );
    match &rig.io.calls[1] {
        IoCall::Publish { topic, body, qos } => {
            assert_eq!(topic, "nhatminh/data");
            assert_eq!(body, r#"{"status":"online","blinkInterval":500}"#);
            assert_eq!(*qos, Qos::AtLeastOnce);
        }
        other => panic!("expected status publish, got {:?}", other),
    }
    assert_eq!(rig.sink.count(|e| *e == AppEvent::SessionUp), 1);
}

#[test]
fn session_loss_arms_timer_and_timer_restarts() {
    let mut rig = Rig::online(MockNvs::new());

    rig.feed(NetEvent::SessionDisconnected);
    assert!(!rig.svc.session_active());
    assert_eq!(rig.io.calls, vec![IoCall::ArmTimer(Duration::from_secs(10))]);

    rig.feed(NetEvent::ReconnectTimerExpired);
    assert_eq!(rig.io.count(|c| matches!(c, IoCall::RestartSession)), 1);
    assert_eq!(rig.io.count(|c| matches!(c, IoCall::OpenSession(_))), 0);
}

#[test]
fn reconnection_is_retried_indefinitely() {
    let mut rig = Rig::online(MockNvs::new());
    for _ in 0..25 {
        rig.feed(NetEvent::SessionDisconnected);
        rig.feed(NetEvent::ReconnectTimerExpired);
    }
    assert_eq!(rig.io.count(|c| matches!(c, IoCall::ArmTimer(_))), 25);
    assert_eq!(rig.io.count(|c| matches!(c, IoCall::RestartSession)), 25);
    // Fixed delay, no backoff growth.
    assert!(
        rig.io
            .calls
            .iter()
            .all(|c| !matches!(c, IoCall::ArmTimer(d) if *d != Duration::from_secs(10)))
    );
}

#[test]
fn status_publish_is_noop_without_session() {
    let mut rig = Rig::started(MockNvs::new());
    rig.feed(NetEvent::StatusTick);
    assert_eq!(rig.io.count(|c| matches!(c, IoCall::Publish { .. })), 0);

    let mut rig = Rig::online(MockNvs::new());
    rig.feed(NetEvent::SessionDisconnected);
    rig.feed(NetEvent::StatusTick);
    assert_eq!(rig.io.count(|c| matches!(c, IoCall::Publish { .. })), 0);
}

#[test]
fn periodic_tick_publishes_status() {
    let mut rig = Rig::online(MockNvs::new());
    rig.feed(NetEvent::StatusTick);
    rig.feed(NetEvent::StatusTick);
    let bodies = rig.io.published();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["status"], "online");
    assert_eq!(bodies[0]["blinkInterval"], 500);
}

#[test]
fn button_cycles_blink_and_publishes() {
    let mut rig = Rig::online(MockNvs::new());

    rig.feed(NetEvent::ButtonPressed);
    assert_eq!(rig.svc.blink_interval(), 1000);
    rig.feed(NetEvent::ButtonPressed);
    assert_eq!(rig.svc.blink_interval(), 100);
    rig.feed(NetEvent::ButtonPressed);
    assert_eq!(rig.svc.blink_interval(), 500);

    let intervals: Vec<_> = rig
        .io
        .published()
        .iter()
        .map(|b| b["blinkInterval"].as_u64().unwrap())
        .collect();
    assert_eq!(intervals, vec![1000, 100, 500]);
}

#[test]
fn session_errors_and_acks_only_log() {
    let mut rig = Rig::online(MockNvs::new());
    rig.feed(NetEvent::SessionError);
    rig.feed(NetEvent::Subscribed);
    assert!(rig.io.calls.is_empty());
    assert!(rig.svc.session_active());
}

#[test]
fn late_timer_leaves_recovered_session_alone() {
    let mut rig = Rig::online(MockNvs::new());

    // Broker drops, then the link blips and the address brings it back
    // before the reconnect timer fires.
    rig.feed(NetEvent::SessionDisconnected);
    rig.feed(NetEvent::WifiDisconnected { reason: 8 });
    rig.feed(NetEvent::GotIp { ip: [192, 168, 1, 50] });
    rig.feed(NetEvent::SessionConnected);
    assert!(rig.svc.session_active());
    let restarts = rig.io.count(|c| matches!(c, IoCall::RestartSession));

    rig.feed(NetEvent::ReconnectTimerExpired);
    assert_eq!(rig.io.count(|c| matches!(c, IoCall::RestartSession)), restarts);
    assert!(rig.svc.session_active());
}
