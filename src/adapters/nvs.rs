//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`] for the credential store.
//!
//! - **`target_os = "espidf"`**: raw `nvs_*` calls on the default
//!   partition, one handle per operation.
//! - **all other targets**: in-memory map, with optional write-fault
//!   injection for tests.
//!
//! # Atomic batches
//!
//! NVS commits each `nvs_set_str` on its own, so a two-key update is not
//! atomic by itself.  [`write_batch`](StoragePort::write_batch) snapshots
//! the previous values first and restores them if any write in the batch
//! fails, so callers never observe half an update.

use crate::app::ports::{StorageError, StoragePort};
use log::info;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;
#[cfg(target_os = "espidf")]
use log::warn;

/// NVS keys and namespaces are limited to 15 bytes plus NUL.
#[cfg(target_os = "espidf")]
const NVS_NAME_MAX: usize = 15;

// bindgen emits the error macros as `u32`; calls return `esp_err_t`.
#[cfg(target_os = "espidf")]
const OK: esp_err_t = ESP_OK as esp_err_t;
#[cfg(target_os = "espidf")]
const NOT_FOUND: esp_err_t = ESP_ERR_NVS_NOT_FOUND as esp_err_t;
#[cfg(target_os = "espidf")]
const NO_SPACE: esp_err_t = ESP_ERR_NVS_NOT_ENOUGH_SPACE as esp_err_t;
#[cfg(target_os = "espidf")]
const INVALID_LENGTH: esp_err_t = ESP_ERR_NVS_INVALID_LENGTH as esp_err_t;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, String>,
    /// Simulation: number of further entry writes allowed before failing.
    #[cfg(not(target_os = "espidf"))]
    writes_remaining: Option<usize>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.  Any other failure is
    /// returned; the device cannot run safely without a working store.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as esp_err_t
                || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as esp_err_t
            {
                warn!("NVS: erasing and re-initialising flash partition");
                let ret2 = unsafe { nvs_flash_erase() };
                if ret2 != OK {
                    return Err(StorageError::IoError(ret2));
                }
                let ret3 = unsafe { nvs_flash_init() };
                if ret3 != OK {
                    return Err(StorageError::IoError(ret3));
                }
            } else if ret != OK {
                return Err(StorageError::IoError(ret));
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
            #[cfg(not(target_os = "espidf"))]
            writes_remaining: None,
        })
    }

    /// Simulation: allow `n` more entry writes, then fail every write with
    /// `IoError` until [`clear_write_faults`](Self::clear_write_faults).
    #[cfg(not(target_os = "espidf"))]
    pub fn fail_writes_after(&mut self, n: usize) {
        self.writes_remaining = Some(n);
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn clear_write_faults(&mut self) {
        self.writes_remaining = None;
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    #[cfg(not(target_os = "espidf"))]
    fn sim_write(&mut self, composite: String, value: &str) -> Result<(), StorageError> {
        match self.writes_remaining {
            Some(0) => return Err(StorageError::IoError(0)),
            Some(ref mut n) => *n -= 1,
            None => {}
        }
        self.store.insert(composite, value.to_owned());
        Ok(())
    }

    /// Copy `name` into a NUL-terminated buffer (truncated to 15 bytes).
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; NVS_NAME_MAX + 1] {
        let mut buf = [0u8; NVS_NAME_MAX + 1];
        let bytes = name.as_bytes();
        let len = bytes.len().min(NVS_NAME_MAX);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns_buf = Self::c_name(namespace);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr().cast(), mode, &mut handle) };
        if ret != OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn map_err(code: i32) -> StorageError {
        match code {
            NOT_FOUND => StorageError::NotFound,
            NO_SPACE => StorageError::Full,
            INVALID_LENGTH => StorageError::InvalidValue,
            other => StorageError::IoError(other),
        }
    }

    /// Set one string and commit it.  `None` erases the key instead.
    #[cfg(target_os = "espidf")]
    fn set_or_erase(handle: nvs_handle_t, key: &str, value: Option<&str>) -> Result<(), i32> {
        let key_buf = Self::c_name(key);
        let ret = match value {
            Some(v) => {
                let mut val = Vec::with_capacity(v.len() + 1);
                val.extend_from_slice(v.as_bytes());
                val.push(0);
                unsafe { nvs_set_str(handle, key_buf.as_ptr().cast(), val.as_ptr().cast()) }
            }
            None => {
                let ret = unsafe { nvs_erase_key(handle, key_buf.as_ptr().cast()) };
                if ret == NOT_FOUND { OK } else { ret }
            }
        };
        if ret != OK {
            return Err(ret);
        }
        let ret = unsafe { nvs_commit(handle) };
        if ret != OK {
            return Err(ret);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn get_owned(handle: nvs_handle_t, key: &str) -> Result<Option<String>, i32> {
        let key_buf = Self::c_name(key);
        let mut size: usize = 0;
        let ret = unsafe {
            nvs_get_str(handle, key_buf.as_ptr().cast(), core::ptr::null_mut(), &mut size)
        };
        if ret == NOT_FOUND {
            return Ok(None);
        }
        if ret != OK {
            return Err(ret);
        }
        let mut buf = vec![0u8; size];
        let ret = unsafe {
            nvs_get_str(handle, key_buf.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
        };
        if ret != OK {
            return Err(ret);
        }
        // Drop the trailing NUL.
        buf.truncate(size.saturating_sub(1));
        String::from_utf8(buf).map(Some).map_err(|_| INVALID_LENGTH)
    }
}

impl StoragePort for NvsAdapter {
    fn read_str(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.get(&composite) {
                Some(value) if value.len() <= buf.len() => {
                    buf[..value.len()].copy_from_slice(value.as_bytes());
                    Ok(value.len())
                }
                Some(_) => Err(StorageError::InvalidValue),
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let key_buf = Self::c_name(key);
                // nvs_get_str writes the NUL terminator too.
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_str(
                        handle,
                        key_buf.as_ptr().cast(),
                        buf.as_mut_ptr().cast(),
                        &mut size,
                    )
                };
                if ret != OK {
                    return Err(ret);
                }
                Ok(size.saturating_sub(1))
            });
            result.map_err(Self::map_err)
        }
    }

    fn write_batch(&mut self, namespace: &str, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let previous: Vec<(String, Option<String>)> = entries
                .iter()
                .map(|(key, _)| {
                    let composite = Self::composite_key(namespace, key);
                    let old = self.store.get(&composite).cloned();
                    (composite, old)
                })
                .collect();

            for (key, value) in entries {
                if let Err(e) = self.sim_write(Self::composite_key(namespace, key), value) {
                    for (composite, old) in previous {
                        match old {
                            Some(v) => self.store.insert(composite, v),
                            None => self.store.remove(&composite),
                        };
                    }
                    return Err(e);
                }
            }
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let mut previous = Vec::with_capacity(entries.len());
                for (key, _) in entries {
                    previous.push(Self::get_owned(handle, key)?);
                }

                for (i, (key, value)) in entries.iter().enumerate() {
                    if let Err(code) = Self::set_or_erase(handle, key, Some(value)) {
                        // Roll back the keys already written.
                        for ((k, _), old) in entries[..i].iter().zip(&previous) {
                            if let Err(rb) = Self::set_or_erase(handle, k, old.as_deref()) {
                                warn!("NvsAdapter: rollback of '{}' failed ({})", k, rb);
                            }
                        }
                        return Err(code);
                    }
                }
                Ok(())
            });
            match result {
                Ok(()) => Ok(()),
                Err(e) => {
                    warn!("NvsAdapter: batch write to '{}' failed ({})", namespace, e);
                    Err(Self::map_err(e))
                }
            }
        }
    }

    fn erase_namespace(&mut self, namespace: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let prefix = format!("{}::", namespace);
            self.store.retain(|k, _| !k.starts_with(&prefix));
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let ret = unsafe { nvs_erase_all(handle) };
                if ret != OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(Self::map_err)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store.contains_key(&Self::composite_key(namespace, key))
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let key_buf = Self::c_name(key);
                let ret = unsafe {
                    nvs_find_key(handle, key_buf.as_ptr().cast(), core::ptr::null_mut())
                };
                Ok(ret == OK)
            });
            result.unwrap_or(false)
        }
    }
}
