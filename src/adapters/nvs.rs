//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] over the single
//! flat `storage` namespace.  Integers use the native NVS `u32` type,
//! floats are 4-byte blobs, strings use the NVS string type.
//!
//! Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;
use log::info;

#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub const NAMESPACE: &str = "storage";

/// NVS key length limit, excluding the terminator.
const MAX_KEY_LEN: usize = 15;

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, PartialEq)]
enum Stored {
    U32(u32),
    Blob(Vec<u8>),
    Str(String),
}

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Stored>>,
}

/// NUL-terminated copy of `key`, rejecting names NVS cannot hold.
fn key_buf(key: &str) -> Result<[u8; MAX_KEY_LEN + 1], StorageError> {
    let kb = key.as_bytes();
    if kb.is_empty() || kb.len() > MAX_KEY_LEN || kb.contains(&0) {
        return Err(StorageError::InvalidKey);
    }
    let mut buf = [0u8; MAX_KEY_LEN + 1];
    buf[..kb.len()].copy_from_slice(kb);
    Ok(buf)
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if same(ret, ESP_ERR_NVS_NO_FREE_PAGES)
                || same(ret, ESP_ERR_NVS_NEW_VERSION_FOUND)
            {
                warn!("NVS: erasing and re-initialising flash partition");
                if !same(unsafe { nvs_flash_erase() }, ESP_OK) {
                    return Err(ConfigError::IoError);
                }
                if !same(unsafe { nvs_flash_init() }, ESP_OK) {
                    return Err(ConfigError::IoError);
                }
            } else if !same(ret, ESP_OK) {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    /// Open the namespace, execute a closure with the handle, then close.
    /// Write closures are followed by a commit.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    {
        let ns = b"storage\0";
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: `ns` is NUL-terminated and `handle` outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) };
        if !same(ret, ESP_OK) {
            return Err(map_err(ret));
        }

        let mut result = f(handle);
        if write && result.is_ok() {
            // SAFETY: handle was opened read-write above.
            let ret = unsafe { nvs_commit(handle) };
            if !same(ret, ESP_OK) {
                result = Err(ret);
            }
        }
        // SAFETY: handle is valid and not used after this point.
        unsafe { nvs_close(handle) };
        result.map_err(map_err)
    }
}

/// Compare an `esp_err_t` with a bindgen constant of either signedness.
#[cfg(target_os = "espidf")]
fn same(e: esp_err_t, code: impl Into<i64>) -> bool {
    i64::from(e) == code.into()
}

#[cfg(target_os = "espidf")]
fn map_err(e: esp_err_t) -> StorageError {
    if same(e, ESP_ERR_NVS_NOT_FOUND) {
        StorageError::NotFound
    } else if same(e, ESP_ERR_NVS_TYPE_MISMATCH) || same(e, ESP_ERR_NVS_INVALID_LENGTH) {
        StorageError::TypeMismatch
    } else if same(e, ESP_ERR_NVS_NOT_ENOUGH_SPACE) {
        StorageError::Full
    } else if same(e, ESP_ERR_NVS_INVALID_NAME) || same(e, ESP_ERR_NVS_KEY_TOO_LONG) {
        StorageError::InvalidKey
    } else {
        StorageError::IoError
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let cfg = SystemConfig::from_store(self);
        info!("NvsAdapter: config loaded from '{}'", NAMESPACE);
        Ok(cfg)
    }

    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.to_store(self)?;
        info!("NvsAdapter: config saved to '{}'", NAMESPACE);
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl StoragePort for NvsAdapter {
    fn get_u32(&self, key: &str) -> Result<u32, StorageError> {
        key_buf(key)?;
        match self.store.borrow().get(key) {
            Some(Stored::U32(v)) => Ok(*v),
            Some(_) => Err(StorageError::TypeMismatch),
            None => Err(StorageError::NotFound),
        }
    }

    fn set_u32(&mut self, key: &str, value: u32) -> Result<(), StorageError> {
        key_buf(key)?;
        self.store.borrow_mut().insert(key.into(), Stored::U32(value));
        Ok(())
    }

    fn get_blob(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        key_buf(key)?;
        match self.store.borrow().get(key) {
            Some(Stored::Blob(data)) if data.len() <= buf.len() => {
                buf[..data.len()].copy_from_slice(data);
                Ok(data.len())
            }
            Some(_) => Err(StorageError::TypeMismatch),
            None => Err(StorageError::NotFound),
        }
    }

    fn set_blob(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        key_buf(key)?;
        self.store.borrow_mut().insert(key.into(), Stored::Blob(data.to_vec()));
        Ok(())
    }

    fn get_str(&self, key: &str) -> Result<String, StorageError> {
        key_buf(key)?;
        match self.store.borrow().get(key) {
            Some(Stored::Str(s)) => Ok(s.clone()),
            Some(_) => Err(StorageError::TypeMismatch),
            None => Err(StorageError::NotFound),
        }
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        key_buf(key)?;
        if value.as_bytes().contains(&0) {
            return Err(StorageError::TypeMismatch);
        }
        self.store.borrow_mut().insert(key.into(), Stored::Str(value.into()));
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        key_buf(key)?;
        self.store.borrow_mut().remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.store.borrow().contains_key(key)
    }
}

#[cfg(target_os = "espidf")]
impl StoragePort for NvsAdapter {
    fn get_u32(&self, key: &str) -> Result<u32, StorageError> {
        let k = key_buf(key)?;
        Self::with_nvs_handle(false, |handle| {
            let mut v: u32 = 0;
            // SAFETY: `k` is NUL-terminated; `v` is a valid out pointer.
            let ret = unsafe { nvs_get_u32(handle, k.as_ptr().cast(), &mut v) };
            if same(ret, ESP_OK) { Ok(v) } else { Err(ret) }
        })
    }

    fn set_u32(&mut self, key: &str, value: u32) -> Result<(), StorageError> {
        let k = key_buf(key)?;
        Self::with_nvs_handle(true, |handle| {
            // SAFETY: `k` is NUL-terminated.
            let ret = unsafe { nvs_set_u32(handle, k.as_ptr().cast(), value) };
            if same(ret, ESP_OK) { Ok(()) } else { Err(ret) }
        })
    }

    fn get_blob(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let k = key_buf(key)?;
        Self::with_nvs_handle(false, |handle| {
            let mut size = buf.len();
            // SAFETY: `buf` is valid for `size` bytes.
            let ret = unsafe {
                nvs_get_blob(handle, k.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
            };
            if same(ret, ESP_OK) { Ok(size) } else { Err(ret) }
        })
    }

    fn set_blob(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let k = key_buf(key)?;
        Self::with_nvs_handle(true, |handle| {
            // SAFETY: `data` is valid for `data.len()` bytes.
            let ret = unsafe {
                nvs_set_blob(handle, k.as_ptr().cast(), data.as_ptr().cast(), data.len())
            };
            if same(ret, ESP_OK) { Ok(()) } else { Err(ret) }
        })
    }

    fn get_str(&self, key: &str) -> Result<String, StorageError> {
        let k = key_buf(key)?;
        let bytes = Self::with_nvs_handle(false, |handle| {
            // First call: get length including the terminator.
            let mut len: usize = 0;
            let ret = unsafe {
                nvs_get_str(handle, k.as_ptr().cast(), core::ptr::null_mut(), &mut len)
            };
            if !same(ret, ESP_OK) {
                return Err(ret);
            }
            let mut buf = vec![0u8; len];
            let ret = unsafe {
                nvs_get_str(handle, k.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut len)
            };
            if !same(ret, ESP_OK) {
                return Err(ret);
            }
            buf.truncate(len.saturating_sub(1));
            Ok(buf)
        })?;
        String::from_utf8(bytes).map_err(|_| StorageError::TypeMismatch)
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let k = key_buf(key)?;
        if value.as_bytes().contains(&0) {
            return Err(StorageError::TypeMismatch);
        }
        let mut v = Vec::with_capacity(value.len() + 1);
        v.extend_from_slice(value.as_bytes());
        v.push(0);
        Self::with_nvs_handle(true, |handle| {
            // SAFETY: both buffers are NUL-terminated.
            let ret = unsafe { nvs_set_str(handle, k.as_ptr().cast(), v.as_ptr().cast()) };
            if same(ret, ESP_OK) { Ok(()) } else { Err(ret) }
        })
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        let k = key_buf(key)?;
        Self::with_nvs_handle(true, |handle| {
            // SAFETY: `k` is NUL-terminated.
            let ret = unsafe { nvs_erase_key(handle, k.as_ptr().cast()) };
            if same(ret, ESP_OK) || same(ret, ESP_ERR_NVS_NOT_FOUND) {
                Ok(())
            } else {
                Err(ret)
            }
        })
    }

    fn exists(&self, key: &str) -> bool {
        let Ok(k) = key_buf(key) else {
            return false;
        };
        Self::with_nvs_handle(false, |handle| {
            // SAFETY: `k` is NUL-terminated; a null type pointer is allowed.
            let ret = unsafe { nvs_find_key(handle, k.as_ptr().cast(), core::ptr::null_mut()) };
            Ok(same(ret, ESP_OK))
        })
        .unwrap_or(false)
    }
}
