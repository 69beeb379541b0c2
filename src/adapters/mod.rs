//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements     | Connects to                  |
//! |-------------|----------------|------------------------------|
//! | `device_id` | -              | eFuse MAC → client id        |
//! | `io`        | all outbound   | Bundles the adapters below   |
//! | `log_sink`  | EventSink      | Serial log output            |
//! | `mqtt`      | BrokerPort     | ESP-IDF MQTT client          |
//! | `nvs`       | StoragePort    | NVS / in-memory store        |
//! | `system`    | DeviceControl  | `esp_restart`                |
//! | `time`      | ReconnectTimer | ESP32 system timer           |
//! | `wifi`      | NetworkPort    | ESP-IDF WiFi STA             |

pub mod device_id;
pub mod io;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod system;
pub mod time;
pub mod wifi;
