//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`].  Every call only initiates the operation;
//! the driver's outcome comes back as a [`NetEvent`] on the shared
//! [`EventQueue`]:
//!
//! | ESP-IDF event               | NetEvent             |
//! |-----------------------------|----------------------|
//! | `WIFI_EVENT_STA_START`      | `WifiStarted`        |
//! | `WIFI_EVENT_STA_DISCONNECTED` | `WifiDisconnected` |
//! | `IP_EVENT_STA_GOT_IP`       | `GotIp`              |
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspWifi` driver plus raw event-loop
//!   handlers that translate and push.
//! - **all other targets**: simulation that records requests and lets
//!   tests inject driver events.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::credentials::Credentials;
use crate::app::ports::{NetworkError, NetworkPort};
use crate::events::{EventQueue, NetEvent};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), NetworkError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(NetworkError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), NetworkError> {
    if password.len() > 64 {
        return Err(NetworkError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct WifiAdapter {
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
    queue: &'static EventQueue,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    /// Take the modem, create the driver and hook the WiFi / IP event
    /// bases to `queue`.
    pub fn new(
        modem: esp_idf_hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: esp_idf_svc::nvs::EspDefaultNvsPartition,
        queue: &'static EventQueue,
    ) -> anyhow::Result<Self> {
        use esp_idf_sys as sys;

        let wifi = esp_idf_svc::wifi::EspWifi::new(modem, sysloop, Some(nvs))?;

        let arg = queue as *const EventQueue as *mut core::ffi::c_void;
        // SAFETY: `queue` is 'static; the handlers only read through it.
        unsafe {
            sys::esp!(sys::esp_event_handler_register(
                sys::WIFI_EVENT,
                sys::ESP_EVENT_ANY_ID,
                Some(on_sys_event),
                arg,
            ))?;
            sys::esp!(sys::esp_event_handler_register(
                sys::IP_EVENT,
                sys::ip_event_t_IP_EVENT_STA_GOT_IP as i32,
                Some(on_sys_event),
                arg,
            ))?;
        }

        Ok(Self { wifi, queue })
    }

    /// Queue this adapter reports into.
    pub fn queue(&self) -> &'static EventQueue {
        self.queue
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn on_sys_event(
    arg: *mut core::ffi::c_void,
    base: esp_idf_sys::esp_event_base_t,
    id: i32,
    data: *mut core::ffi::c_void,
) {
    use esp_idf_sys as sys;

    // SAFETY: registered with a pointer to a 'static EventQueue.
    let queue = unsafe { &*(arg as *const EventQueue) };

    let event = if base == unsafe { sys::WIFI_EVENT } {
        if id == sys::wifi_event_t_WIFI_EVENT_STA_START as i32 {
            Some(NetEvent::WifiStarted)
        } else if id == sys::wifi_event_t_WIFI_EVENT_STA_DISCONNECTED as i32 && !data.is_null() {
            // SAFETY: the driver passes this layout for STA_DISCONNECTED.
            let info = unsafe { &*(data as *const sys::wifi_event_sta_disconnected_t) };
            Some(NetEvent::WifiDisconnected {
                reason: u16::from(info.reason),
            })
        } else {
            None
        }
    } else if base == unsafe { sys::IP_EVENT }
        && id == sys::ip_event_t_IP_EVENT_STA_GOT_IP as i32
        && !data.is_null()
    {
        // SAFETY: the netif layer passes this layout for STA_GOT_IP.
        let info = unsafe { &*(data as *const sys::ip_event_got_ip_t) };
        Some(NetEvent::GotIp {
            ip: info.ip_info.ip.addr.to_le_bytes(),
        })
    } else {
        None
    };

    if let Some(event) = event {
        queue.push(event);
    }
}

#[cfg(target_os = "espidf")]
impl NetworkPort for WifiAdapter {
    fn apply_credentials(&mut self, creds: &Credentials) -> Result<(), NetworkError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        validate_ssid(&creds.ssid)?;
        validate_password(&creds.password)?;

        let auth_method = if creds.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: creds
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| NetworkError::InvalidSsid)?,
            password: creds
                .password
                .as_str()
                .try_into()
                .map_err(|_| NetworkError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        self.wifi
            .set_configuration(&conf)
            .map_err(|e| NetworkError::Driver(e.code()))?;
        info!("WiFi: station configured for '{}'", creds.ssid);
        Ok(())
    }

    fn start(&mut self) -> Result<(), NetworkError> {
        self.wifi.start().map_err(|e| NetworkError::Driver(e.code()))?;
        info!("WiFi: station started");
        Ok(())
    }

    fn associate(&mut self) -> Result<(), NetworkError> {
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect request rejected ({})", e);
            NetworkError::Driver(e.code())
        })
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter (simulation)
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct WifiAdapter {
    queue: &'static EventQueue,
    ssid: heapless::String<32>,
    started: bool,
    associations: u32,
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new(queue: &'static EventQueue) -> Self {
        Self {
            queue,
            ssid: heapless::String::new(),
            started: false,
            associations: 0,
        }
    }

    /// SSID most recently applied.
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Number of association requests issued.
    pub fn associations(&self) -> u32 {
        self.associations
    }

    /// Simulate the driver reporting a lost or failed association.
    pub fn inject_disconnect(&self, reason: u16) {
        self.queue.push(NetEvent::WifiDisconnected { reason });
    }

    /// Simulate a DHCP lease.
    pub fn inject_got_ip(&self, ip: [u8; 4]) {
        self.queue.push(NetEvent::GotIp { ip });
    }
}

#[cfg(not(target_os = "espidf"))]
impl NetworkPort for WifiAdapter {
    fn apply_credentials(&mut self, creds: &Credentials) -> Result<(), NetworkError> {
        validate_ssid(&creds.ssid)?;
        validate_password(&creds.password)?;
        self.ssid.clear();
        self.ssid
            .push_str(&creds.ssid)
            .map_err(|()| NetworkError::InvalidSsid)?;
        info!("WiFi(sim): station configured for '{}'", self.ssid);
        Ok(())
    }

    fn start(&mut self) -> Result<(), NetworkError> {
        self.started = true;
        self.queue.push(NetEvent::WifiStarted);
        Ok(())
    }

    fn associate(&mut self) -> Result<(), NetworkError> {
        if !self.started {
            return Err(NetworkError::Driver(-1));
        }
        self.associations += 1;
        info!("WiFi(sim): associating with '{}'", self.ssid);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
