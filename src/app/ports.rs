//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, mode switches, indicator LEDs, telemetry,
//! storage) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the per-channel state machines never
//! touch hardware directly.
//!
//! ## Notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - A failed sensor read is not fatal: [`SensorPort::read_sample`] treats
//!   it as "below threshold" for that tick.

use crate::app::events::ChannelEvent;
use crate::channel::ChannelId;
use crate::config::SystemConfig;
use crate::error::SensorError;
use crate::fsm::context::Sample;
use crate::fsm::mode::DeviceMode;
use crate::fsm::session::LogEvent;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per channel per tick.
pub trait SensorPort {
    /// RMS of the current transformer waveform, in amps.
    fn read_current_rms(&mut self, channel: ChannelId) -> Result<f32, SensorError>;

    /// Inlet flow rate since the previous call. Reading resets the counter.
    fn read_flow_rate(&mut self, channel: ChannelId) -> Result<u32, SensorError>;

    /// Whether the drain valve is open.
    fn read_drain(&mut self, channel: ChannelId) -> Result<bool, SensorError>;

    /// Read every input for one channel.
    ///
    /// Each failed read is logged and replaced by its "below threshold"
    /// value, so one bad input never stalls the channel.
    fn read_sample(&mut self, channel: ChannelId) -> Sample {
        let current_rms = self.read_current_rms(channel).unwrap_or_else(|e| {
            log::warn!("CH{}: current read failed: {}", channel.number(), e);
            0.0
        });
        let flow_rate = self.read_flow_rate(channel).unwrap_or_else(|e| {
            log::warn!("CH{}: flow read failed: {}", channel.number(), e);
            0
        });
        let drain_active = self.read_drain(channel).unwrap_or_else(|e| {
            log::warn!("CH{}: drain read failed: {}", channel.number(), e);
            false
        });
        Sample {
            current_rms,
            flow_rate,
            drain_active,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Mode selector port
// ───────────────────────────────────────────────────────────────

/// Which appliance a channel is wired to. Re-read every tick.
pub trait ModeSelectorPort {
    fn read_mode(&mut self, channel: ChannelId) -> DeviceMode;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Per-channel activity indicator (LED).
pub trait IndicatorPort {
    fn set_indicator(&mut self, channel: ChannelId, active: bool);
}

// ───────────────────────────────────────────────────────────────
// Telemetry sink port (driven adapter: domain → remote service)
// ───────────────────────────────────────────────────────────────

/// The state machines emit [`ChannelEvent`]s through this port.
///
/// Delivery is fire-and-forget: implementations must never block the
/// caller. Queueing, retry and dropping are the adapter's business.
pub trait TelemetrySink {
    fn emit(&mut self, event: &ChannelEvent);

    /// Channel became active (`running == true`) or returned to idle.
    fn notify_status(&mut self, channel: ChannelId, running: bool, mode: DeviceMode) {
        self.emit(&ChannelEvent::StatusChanged {
            channel,
            running,
            mode,
        });
    }

    /// One session log record.
    fn submit_log(&mut self, channel: ChannelId, event: LogEvent) {
        self.emit(&ChannelEvent::Logged { channel, event });
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Missing keys fall back to their defaults.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Typed key-value storage in a single flat namespace.
///
/// Integers are stored as `u32`, floats as raw 4-byte blobs, strings as
/// length-prefixed text. Writes are atomic per key (ESP-IDF NVS
/// guarantees this natively).
pub trait StoragePort {
    fn get_u32(&self, key: &str) -> Result<u32, StorageError>;
    fn set_u32(&mut self, key: &str, value: u32) -> Result<(), StorageError>;

    /// Read a blob. Returns the number of bytes written to `buf`.
    fn get_blob(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;
    fn set_blob(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    fn get_str(&self, key: &str) -> Result<String, StorageError>;
    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, key: &str) -> bool;

    fn get_f32(&self, key: &str) -> Result<f32, StorageError> {
        let mut buf = [0u8; 4];
        let n = self.get_blob(key, &mut buf)?;
        if n != buf.len() {
            return Err(StorageError::TypeMismatch);
        }
        let v = f32::from_le_bytes(buf);
        if v.is_finite() {
            Ok(v)
        } else {
            Err(StorageError::TypeMismatch)
        }
    }

    fn set_f32(&mut self, key: &str, value: f32) -> Result<(), StorageError> {
        self.set_blob(key, &value.to_le_bytes())
    }

    /// Booleans are stored as `u32` 0/1.
    fn get_bool(&self, key: &str) -> Result<bool, StorageError> {
        self.get_u32(key).map(|v| v != 0)
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StorageError> {
        self.set_u32(key, u32::from(value))
    }
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Key exists but holds a different type or size.
    TypeMismatch,
    /// Key name is empty or longer than the backend allows.
    InvalidKey,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::TypeMismatch => write!(f, "type mismatch"),
            Self::InvalidKey => write!(f, "invalid key"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
