//! System configuration parameters
//!
//! Per-channel thresholds and delays for the activity detector, plus the
//! network settings the telemetry and connectivity adapters need.
//! Everything is read once at boot from the flat NVS namespace; any key
//! that is missing or malformed falls back to its compiled-in default.

use serde::{Deserialize, Serialize};

use crate::app::ports::{ConfigError, StorageError, StoragePort};
use crate::channel::ChannelId;
use crate::fsm::mode::DeviceMode;

/// Number of independent appliance channels on the board.
pub const CHANNEL_COUNT: usize = 2;

/// Washer start-confirmation window (milliseconds).
pub const DEFAULT_CONFIRM_WINDOW_MS: u32 = 500;

/// Driver loop period (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 10;

/// Thresholds that decide "load present" for one channel in one mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Current RMS above this counts as load present (amps).
    pub current_on_amps: f32,
    /// Flow rate above this counts as load present. Washer only.
    pub flow_on: u32,
    /// Sustained below-threshold time before the cycle is declared over.
    pub end_delay_ms: u32,
}

impl ThresholdConfig {
    pub const WASHER_DEFAULT: Self = Self {
        current_on_amps: 0.2,
        flow_on: 50,
        end_delay_ms: 100_000,
    };

    pub const DRYER_DEFAULT: Self = Self {
        current_on_amps: 0.5,
        flow_on: 50,
        end_delay_ms: 10_000,
    };
}

/// Configuration owned by a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub washer: ThresholdConfig,
    pub dryer: ThresholdConfig,
    /// Operator label shown in status. Detection runs regardless.
    pub live: bool,
}

impl ChannelConfig {
    /// Threshold set for the given mode.
    pub fn thresholds(&self, mode: DeviceMode) -> &ThresholdConfig {
        match mode {
            DeviceMode::Washer => &self.washer,
            DeviceMode::Dryer => &self.dryer,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            washer: ThresholdConfig::WASHER_DEFAULT,
            dryer: ThresholdConfig::DRYER_DEFAULT,
            live: true,
        }
    }
}

/// Credentials and routing for Wi-Fi and the remote status service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub ap_ssid: String,
    pub ap_passwd: String,
    pub auth_id: String,
    pub auth_passwd: String,
    pub room_no: String,
    pub server_uri: String,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Channels ---
    pub channels: [ChannelConfig; CHANNEL_COUNT],

    // --- Timing ---
    /// Driver loop period (milliseconds)
    pub poll_interval_ms: u32,
    /// Washer start confirmation window (milliseconds)
    pub confirm_window_ms: u32,

    // --- Sensing ---
    /// ADC counts per amp of RMS current. 1.0 reports raw RMS counts.
    pub current_counts_per_amp: f32,

    // --- Network ---
    pub network: NetworkConfig,

    /// Operator-facing machine number printed on each appliance.
    pub device_no: [String; CHANNEL_COUNT],
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            channels: [ChannelConfig::default(); CHANNEL_COUNT],

            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            confirm_window_ms: DEFAULT_CONFIRM_WINDOW_MS,

            current_counts_per_amp: 1.0,

            network: NetworkConfig {
                room_no: "0".into(),
                server_uri: "wss://lotura-prod.xquare.app/device".into(),
                ..Default::default()
            },

            device_no: ["1".into(), "2".into()],
        }
    }
}

impl SystemConfig {
    /// Config for one channel.
    pub fn channel(&self, id: ChannelId) -> &ChannelConfig {
        &self.channels[id.index()]
    }

    /// Build the configuration from the flat key/value store.
    ///
    /// Each key is read independently; absence is not an error. A stored
    /// value outside its valid range is ignored and that key alone keeps
    /// its default.
    pub fn from_store(store: &impl StoragePort) -> Self {
        let mut cfg = Self::default();

        for id in ChannelId::ALL {
            let ch = &mut cfg.channels[id.index()];
            let key = |suffix: &str| keys::channel(id, suffix);
            read_amps(store, &key(keys::CURR_W), &mut ch.washer.current_on_amps);
            read_u32(store, &key(keys::FLOW_W), &mut ch.washer.flow_on, |_| true);
            read_u32(store, &key(keys::END_DELAY_W), &mut ch.washer.end_delay_ms, |v| v > 0);
            read_amps(store, &key(keys::CURR_D), &mut ch.dryer.current_on_amps);
            read_u32(store, &key(keys::END_DELAY_D), &mut ch.dryer.end_delay_ms, |v| v > 0);
            ch.live = store.get_bool(&keys::live(id)).unwrap_or(true);
        }

        let net = &mut cfg.network;
        read_string(store, keys::AP_SSID, &mut net.ap_ssid);
        read_string(store, keys::AP_PASSWD, &mut net.ap_passwd);
        read_string(store, keys::AUTH_ID, &mut net.auth_id);
        read_string(store, keys::AUTH_PASSWD, &mut net.auth_passwd);
        read_string(store, keys::ROOM_NO, &mut net.room_no);
        for id in ChannelId::ALL {
            read_string(store, &keys::channel(id, keys::DEVICE_NO), &mut cfg.device_no[id.index()]);
        }

        cfg
    }

    /// Validate, then write every key back to the store.
    pub fn to_store(&self, store: &mut impl StoragePort) -> Result<(), ConfigError> {
        validate(self)?;

        for id in ChannelId::ALL {
            let ch = self.channel(id);
            store.set_f32(&keys::channel(id, keys::CURR_W), ch.washer.current_on_amps)?;
            store.set_u32(&keys::channel(id, keys::FLOW_W), ch.washer.flow_on)?;
            store.set_u32(&keys::channel(id, keys::END_DELAY_W), ch.washer.end_delay_ms)?;
            store.set_f32(&keys::channel(id, keys::CURR_D), ch.dryer.current_on_amps)?;
            store.set_u32(&keys::channel(id, keys::END_DELAY_D), ch.dryer.end_delay_ms)?;
            store.set_bool(&keys::live(id), ch.live)?;
        }

        let net = &self.network;
        store.set_str(keys::AP_SSID, &net.ap_ssid)?;
        store.set_str(keys::AP_PASSWD, &net.ap_passwd)?;
        store.set_str(keys::AUTH_ID, &net.auth_id)?;
        store.set_str(keys::AUTH_PASSWD, &net.auth_passwd)?;
        store.set_str(keys::ROOM_NO, &net.room_no)?;
        for id in ChannelId::ALL {
            store.set_str(&keys::channel(id, keys::DEVICE_NO), &self.device_no[id.index()])?;
        }
        Ok(())
    }
}

fn read_amps(store: &impl StoragePort, key: &str, out: &mut f32) {
    match store.get_f32(key) {
        Ok(v) if v >= 0.0 => *out = v,
        Ok(v) => log::warn!("config: key '{}' out of range ({}), keeping default", key, v),
        Err(StorageError::NotFound) => {}
        Err(e) => log::warn!("config: key '{}' unreadable ({}), keeping default", key, e),
    }
}

fn read_u32(store: &impl StoragePort, key: &str, out: &mut u32, valid: impl Fn(u32) -> bool) {
    match store.get_u32(key) {
        Ok(v) if valid(v) => *out = v,
        Ok(v) => log::warn!("config: key '{}' out of range ({}), keeping default", key, v),
        Err(StorageError::NotFound) => {}
        Err(e) => log::warn!("config: key '{}' unreadable ({}), keeping default", key, e),
    }
}

fn read_string(store: &impl StoragePort, key: &str, out: &mut String) {
    match store.get_str(key) {
        Ok(v) => *out = v,
        Err(StorageError::NotFound) => {}
        Err(e) => log::warn!("config: key '{}' unreadable ({}), keeping default", key, e),
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Full => Self::StorageFull,
            _ => Self::IoError,
        }
    }
}

/// Range checks applied before anything is persisted.
pub fn validate(cfg: &SystemConfig) -> Result<(), ConfigError> {
    for ch in &cfg.channels {
        for t in [&ch.washer, &ch.dryer] {
            if !t.current_on_amps.is_finite() || t.current_on_amps < 0.0 {
                return Err(ConfigError::ValidationFailed(
                    "current_on_amps must be finite and >= 0",
                ));
            }
            if t.end_delay_ms == 0 {
                return Err(ConfigError::ValidationFailed("end_delay_ms must be > 0"));
            }
        }
    }
    if cfg.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationFailed("poll_interval_ms must be > 0"));
    }
    if cfg.confirm_window_ms < cfg.poll_interval_ms {
        return Err(ConfigError::ValidationFailed(
            "confirm_window_ms must cover at least one poll",
        ));
    }
    if !cfg.current_counts_per_amp.is_finite() || cfg.current_counts_per_amp <= 0.0 {
        return Err(ConfigError::ValidationFailed(
            "current_counts_per_amp must be > 0",
        ));
    }
    Ok(())
}

/// NVS key names. Keys are limited to 15 characters by the IDF.
pub mod keys {
    use crate::channel::ChannelId;

    pub const CURR_W: &str = "CurrW";
    pub const FLOW_W: &str = "FlowW";
    pub const CURR_D: &str = "CurrD";
    pub const END_DELAY_W: &str = "EndDelayW";
    pub const END_DELAY_D: &str = "EndDelayD";
    pub const DEVICE_NO: &str = "DeviceNo";

    pub const AP_SSID: &str = "apSsid";
    pub const AP_PASSWD: &str = "apPasswd";
    pub const AUTH_ID: &str = "authId";
    pub const AUTH_PASSWD: &str = "authPasswd";
    pub const ROOM_NO: &str = "roomNo";

    /// `ch1CurrW`, `ch2EndDelayD`, ...
    pub fn channel(id: ChannelId, suffix: &str) -> String {
        format!("ch{}{}", id.number(), suffix)
    }

    /// `isCh1Live`, `isCh2Live`
    pub fn live(id: ChannelId) -> String {
        format!("isCh{}Live", id.number())
    }
}
