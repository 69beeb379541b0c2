//! Inbound control commands.
//!
//! A control message is a JSON object whose flags select independent
//! commands:
//!
//! | field         | type   | command            |
//! |---------------|--------|--------------------|
//! | `show_wifi`   | bool   | `QueryStatus`      |
//! | `clear_wifi`  | bool   | `ClearCredentials` |
//! | `wifi_config` | bool   | `SetCredentials`   |
//! | `ssid`        | string | (with wifi_config) |
//! | `password`    | string | (with wifi_config) |
//!
//! The [`NetService`](super::service::NetService) executes the decoded
//! list in order.

use log::debug;
use serde_json::Value;

use super::ports::ProtocolError;

/// Commands that can arrive on the control topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// Report the active SSID and whether the link is up.
    QueryStatus,

    /// Erase stored credentials and restart on the defaults.
    ClearCredentials,

    /// Persist a new credential pair and restart onto it.
    SetCredentials { ssid: String, password: String },
}

/// Decode a control message body into the commands it requests,
/// in dispatch order.
///
/// Only the JSON boolean `true` sets a flag.  Valid JSON that is not an
/// object, or an object without any recognised flag, yields an empty list.
/// `SetCredentials` is dropped unless both `ssid` and `password` are
/// non-empty strings.
pub fn decode(body: &[u8]) -> Result<Vec<ControlCommand>, ProtocolError> {
    let root: Value =
        serde_json::from_slice(body).map_err(|e| ProtocolError::Malformed(format!("{}", e)))?;

    let mut cmds = Vec::new();
    let Some(obj) = root.as_object() else {
        debug!("Control: body is not an object, ignoring");
        return Ok(cmds);
    };

    let flag = |key: &str| obj.get(key).and_then(Value::as_bool) == Some(true);
    let text = |key: &str| obj.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());

    if flag("show_wifi") {
        cmds.push(ControlCommand::QueryStatus);
    }
    if flag("clear_wifi") {
        cmds.push(ControlCommand::ClearCredentials);
    }
    if flag("wifi_config") {
        match (text("ssid"), text("password")) {
            (Some(ssid), Some(password)) => cmds.push(ControlCommand::SetCredentials {
                ssid: ssid.into(),
                password: password.into(),
            }),
            _ => debug!("Control: wifi_config without ssid/password, ignoring"),
        }
    }

    Ok(cmds)
}
