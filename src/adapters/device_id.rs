//! Device identity derived from the ESP32 factory MAC address.
//!
//! The broker client id is `esp32_xxyyzz`: the last 3 bytes of the
//! 6-byte MAC in lowercase hex.  It is stable across reboots
//! (factory-burned eFuse MAC) and distinct per board, so two devices on
//! the public broker never steal each other's session.

/// Fixed-capacity client id string.
pub type ClientIdString = heapless::String<16>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Broker client id for `mac`.
pub fn mqtt_client_id(mac: &MacAddress) -> ClientIdString {
    let mut id = ClientIdString::new();
    use core::fmt::Write;
    let _ = write!(id, "esp32_{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    id
}
