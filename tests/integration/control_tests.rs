//! Control messages: status query, credential clear and update.

use core::time::Duration;

use linkcfg::app::events::AppEvent;
use linkcfg::config::{DEFAULT_WIFI_PASSWORD, DEFAULT_WIFI_SSID};
use linkcfg::events::NetEvent;

use crate::mock_hw::{IoCall, MockNvs, Rig};

fn restart_delay() -> Duration {
    Duration::from_millis(500)
}

#[test]
fn set_credentials_persists_acks_and_restarts() {
    let mut rig = Rig::online(MockNvs::new());
    rig.control(r#"{"wifi_config":true,"ssid":"Home","password":"secret123"}"#);

    assert_eq!(
        rig.svc.store().storage().stored_pair(),
        Some(("Home".into(), "secret123".into()))
    );
    assert_eq!(rig.svc.credentials().ssid.as_str(), "Home");

    let bodies = rig.io.published();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["status"], "success");
    assert_eq!(bodies[0]["message"], "WiFi credentials updated");
    assert_eq!(rig.io.restarts_scheduled(), vec![restart_delay()]);

    // Acknowledge before the restart is requested.
    let ack = rig.io.calls.iter().position(|c| matches!(c, IoCall::Publish { .. }));
    let restart = rig.io.calls.iter().position(|c| matches!(c, IoCall::ScheduleRestart(_)));
    assert!(ack < restart);
}

#[test]
fn set_credentials_with_empty_password_is_noop() {
    let mut rig = Rig::online(MockNvs::with_credentials("Old", "oldpass1"));
    rig.control(r#"{"wifi_config":true,"ssid":"Home","password":""}"#);

    assert_eq!(
        rig.svc.store().storage().stored_pair(),
        Some(("Old".into(), "oldpass1".into()))
    );
    assert_eq!(rig.svc.credentials().ssid.as_str(), "Old");
    assert!(rig.io.calls.is_empty());
}

#[test]
fn set_credentials_with_missing_ssid_is_noop() {
    let mut rig = Rig::online(MockNvs::with_credentials("Old", "oldpass1"));
    rig.control(r#"{"wifi_config":true,"password":"secret123"}"#);
    assert!(rig.io.calls.is_empty());
    assert!(!rig.svc.restart_pending());
}

#[test]
fn oversized_ssid_is_ignored() {
    let mut rig = Rig::online(MockNvs::with_credentials("Old", "oldpass1"));
    let body = format!(
        r#"{{"wifi_config":true,"ssid":"{}","password":"secret123"}}"#,
        "s".repeat(40)
    );
    rig.control(&body);
    assert!(rig.io.calls.is_empty());
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::CommandIgnored(_))),
        1
    );
}

#[test]
fn failed_save_keeps_everything_unchanged() {
    let mut nvs = MockNvs::with_credentials("Old", "oldpass1");
    nvs.fail_writes = true;
    let mut rig = Rig::online(nvs);

    rig.control(r#"{"wifi_config":true,"ssid":"Home","password":"secret123"}"#);

    assert_eq!(rig.svc.credentials().ssid.as_str(), "Old");
    assert_eq!(
        rig.svc.store().storage().stored_pair(),
        Some(("Old".into(), "oldpass1".into()))
    );
    assert!(rig.io.calls.is_empty());
}

#[test]
fn clear_credentials_once_despite_repeats() {
    let mut rig = Rig::online(MockNvs::with_credentials("Home", "secret123"));

    rig.control(r#"{"clear_wifi":true}"#);
    rig.control(r#"{"clear_wifi":true}"#);
    rig.control(r#"{"clear_wifi":true}"#);

    assert_eq!(rig.io.restarts_scheduled(), vec![restart_delay()]);
    let bodies = rig.io.published();
    assert_eq!(bodies.len(), 1);
    assert_eq!(
        bodies[0]["message"],
        "WiFi credentials cleared, default values restored"
    );
    assert_eq!(rig.svc.store().storage().stored_pair(), None);
    assert_eq!(rig.svc.credentials().ssid.as_str(), DEFAULT_WIFI_SSID);
    assert_eq!(rig.svc.credentials().password.as_str(), DEFAULT_WIFI_PASSWORD);
    assert_eq!(
        rig.sink.count(|e| *e == AppEvent::CommandIgnored("restart pending")),
        2
    );
}

#[test]
fn set_after_clear_is_ignored_while_restart_pending() {
    let mut rig = Rig::online(MockNvs::with_credentials("Home", "secret123"));
    rig.control(r#"{"clear_wifi":true,"wifi_config":true,"ssid":"Next","password":"nextpass"}"#);

    assert_eq!(rig.io.restarts_scheduled().len(), 1);
    assert_eq!(rig.svc.store().storage().stored_pair(), None);
}

#[test]
fn show_wifi_reports_ssid_and_link() {
    let mut rig = Rig::online(MockNvs::with_credentials("Home", "secret123"));
    rig.control(r#"{"show_wifi":true}"#);

    let bodies = rig.io.published();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["ssid"], "Home");
    assert_eq!(bodies[0]["connected"], true);
    assert!(rig.io.restarts_scheduled().is_empty());
}

#[test]
fn show_wifi_reports_lost_link() {
    let mut rig = Rig::online(MockNvs::with_credentials("Home", "secret123"));
    rig.feed(NetEvent::WifiDisconnected { reason: 8 });
    rig.io.clear();
    rig.control(r#"{"show_wifi":true}"#);

    let bodies = rig.io.published();
    assert_eq!(bodies[0]["connected"], false);
}

#[test]
fn show_wifi_still_served_while_restart_pending() {
    let mut rig = Rig::online(MockNvs::with_credentials("Home", "secret123"));
    rig.control(r#"{"clear_wifi":true}"#);
    rig.control(r#"{"show_wifi":true}"#);
    assert_eq!(rig.io.published().len(), 2);
}

#[test]
fn malformed_and_unknown_messages_change_nothing() {
    let mut rig = Rig::online(MockNvs::with_credentials("Home", "secret123"));
    rig.control("{not json");
    rig.control(r#"{"hello":"world"}"#);
    rig.control("[true]");
    rig.control(r#"{"clear_wifi":"yes"}"#);

    assert!(rig.io.calls.is_empty());
    assert_eq!(rig.svc.credentials().ssid.as_str(), "Home");
    assert!(!rig.svc.restart_pending());
}

#[test]
fn other_topics_are_ignored() {
    let mut rig = Rig::online(MockNvs::with_credentials("Home", "secret123"));
    let event = NetEvent::message("nhatminh/data", br#"{"clear_wifi":true}"#).unwrap();
    rig.feed(event);
    assert!(rig.io.calls.is_empty());
    assert_eq!(
        rig.svc.store().storage().stored_pair(),
        Some(("Home".into(), "secret123".into()))
    );
}
