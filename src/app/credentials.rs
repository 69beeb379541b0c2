//! WiFi credentials and their persistent store.
//!
//! The store owns the `wifi-config` namespace: two string entries,
//! `ssid` and `password`.  Reads never fail from the caller's point of
//! view (problems are logged and reported as "not found"); writes are
//! all-or-nothing.

use log::{info, warn};

use crate::config::{DEFAULT_WIFI_PASSWORD, DEFAULT_WIFI_SSID};

use super::ports::{StorageError, StoragePort};

/// NVS namespace holding the credential pair.
pub const WIFI_NAMESPACE: &str = "wifi-config";
const SSID_KEY: &str = "ssid";
const PASSWORD_KEY: &str = "password";

/// Longest SSID accepted, in bytes.
pub const MAX_SSID_LEN: usize = 31;
/// Longest password accepted, in bytes.
pub const MAX_PASSWORD_LEN: usize = 63;

/// SSID / password pair.
///
/// Capacities leave room for the NUL terminator the ESP-IDF string API
/// writes, so a value that round-trips through NVS always fits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

/// Why a credential pair was rejected before touching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    EmptySsid,
    SsidTooLong,
    PasswordTooLong,
    Storage(StorageError),
}

impl core::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::EmptySsid => write!(f, "SSID is empty"),
            Self::SsidTooLong => write!(f, "SSID longer than {} bytes", MAX_SSID_LEN),
            Self::PasswordTooLong => write!(f, "password longer than {} bytes", MAX_PASSWORD_LEN),
            Self::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl From<StorageError> for CredentialError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl Credentials {
    /// Build a pair, enforcing the SSID / password length limits.
    /// An empty SSID is rejected; an empty password (open network) is not.
    pub fn new(ssid: &str, password: &str) -> Result<Self, CredentialError> {
        if ssid.is_empty() {
            return Err(CredentialError::EmptySsid);
        }
        if ssid.len() > MAX_SSID_LEN {
            return Err(CredentialError::SsidTooLong);
        }
        if password.len() > MAX_PASSWORD_LEN {
            return Err(CredentialError::PasswordTooLong);
        }
        let mut c = Self::default();
        c.ssid.push_str(ssid).map_err(|()| CredentialError::SsidTooLong)?;
        c.password
            .push_str(password)
            .map_err(|()| CredentialError::PasswordTooLong)?;
        Ok(c)
    }

    /// The compiled-in fallback pair.
    pub fn factory_default() -> Self {
        let mut c = Self::default();
        // Lengths are checked by the config tests.
        let _ = c.ssid.push_str(DEFAULT_WIFI_SSID);
        let _ = c.password.push_str(DEFAULT_WIFI_PASSWORD);
        c
    }

    pub fn is_factory_default(&self) -> bool {
        self.ssid.as_str() == DEFAULT_WIFI_SSID && self.password.as_str() == DEFAULT_WIFI_PASSWORD
    }

    /// True when no SSID is present (nothing stored yet).
    pub fn is_empty(&self) -> bool {
        self.ssid.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// CredentialStore
// ───────────────────────────────────────────────────────────────

/// Durable credential persistence over any [`StoragePort`].
pub struct CredentialStore<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> CredentialStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Read the persisted pair.  Missing or unreadable entries come back
    /// empty; the caller substitutes defaults.
    pub fn load(&self) -> Credentials {
        let mut creds = Credentials::default();

        let mut buf = [0u8; MAX_PASSWORD_LEN + 1];
        if let Some(ssid) = self.read_entry(SSID_KEY, &mut buf) {
            if ssid.len() <= MAX_SSID_LEN {
                let _ = creds.ssid.push_str(ssid);
            } else {
                warn!("CredentialStore: stored SSID too long, ignoring");
            }
        }

        let mut buf = [0u8; MAX_PASSWORD_LEN + 1];
        if let Some(password) = self.read_entry(PASSWORD_KEY, &mut buf) {
            if password.len() <= MAX_PASSWORD_LEN {
                let _ = creds.password.push_str(password);
            } else {
                warn!("CredentialStore: stored password too long, ignoring");
            }
        }

        info!(
            "CredentialStore: loaded (SSID present: {})",
            if creds.is_empty() { "no" } else { "yes" }
        );
        creds
    }

    /// Persist both fields in one commit.
    pub fn save(&mut self, creds: &Credentials) -> Result<(), CredentialError> {
        // Re-validate: the fields are public.
        let checked = Credentials::new(&creds.ssid, &creds.password)?;
        self.storage.write_batch(
            WIFI_NAMESPACE,
            &[
                (SSID_KEY, checked.ssid.as_str()),
                (PASSWORD_KEY, checked.password.as_str()),
            ],
        )?;
        info!("CredentialStore: saved credentials for '{}'", checked.ssid);
        Ok(())
    }

    /// Remove every entry in the namespace.  Idempotent.
    pub fn erase_all(&mut self) -> Result<(), CredentialError> {
        self.storage.erase_namespace(WIFI_NAMESPACE)?;
        info!("CredentialStore: namespace '{}' erased", WIFI_NAMESPACE);
        Ok(())
    }

    /// Whether an SSID entry is currently persisted.
    pub fn has_stored(&self) -> bool {
        self.storage.exists(WIFI_NAMESPACE, SSID_KEY)
    }

    /// Borrow the backing storage (tests, diagnostics).
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn read_entry<'b>(&self, key: &str, buf: &'b mut [u8]) -> Option<&'b str> {
        match self.storage.read_str(WIFI_NAMESPACE, key, buf) {
            Ok(len) => match core::str::from_utf8(&buf[..len]) {
                Ok(s) => Some(s),
                Err(_) => {
                    warn!("CredentialStore: '{}' is not valid UTF-8", key);
                    None
                }
            },
            Err(StorageError::NotFound) => None,
            Err(e) => {
                warn!("CredentialStore: error reading '{}': {}", key, e);
                None
            }
        }
    }
}
