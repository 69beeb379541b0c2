//! Fuzz target: `commands::decode`
//!
//! Drives arbitrary bytes into the control-message decoder and asserts
//! that it never panics and never yields more than one command per flag.
//!
//! cargo fuzz run fuzz_control_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use linkcfg::app::commands::{ControlCommand, decode};

fuzz_target!(|data: &[u8]| {
    if let Ok(cmds) = decode(data) {
        assert!(cmds.len() <= 3, "one command per flag at most");
        for cmd in &cmds {
            if let ControlCommand::SetCredentials { ssid, password } = cmd {
                assert!(!ssid.is_empty() && !password.is_empty());
            }
        }
    }
});
