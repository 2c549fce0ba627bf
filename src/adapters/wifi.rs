//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the hexagonal boundary for network
//! connectivity.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi` driver.
//! - **all other targets**: simulation with scripted link failures.
//!
//! ## Reconnection policy
//!
//! Starting association and holding a link are separate steps: after
//! `connect` the adapter sits in `Connecting` until the driver reports the
//! link up or [`CONNECT_TIMEOUT_MS`] passes.  A failed or timed-out
//! attempt is followed by up to ten retries, then a five second pause
//! before a fresh round.

use core::fmt;
use log::{error, info, warn};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

impl From<ConnectivityError> for crate::error::CommsError {
    fn from(_: ConnectivityError) -> Self {
        Self::WifiConnectFailed
    }
}

pub trait ConnectivityPort {
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    /// Drive reconnection. Call from the main loop with the monotonic clock.
    fn poll(&mut self, now_ms: u64);
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
    fn rssi(&self) -> Option<i8>;
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    /// Association in flight. `retry` is 0 for the first attempt of a
    /// round; the deadline is armed on the first poll.
    Connecting { retry: u32, deadline_ms: Option<u64> },
    Connected,
    /// Link down; `attempt` retries of this round already spent.
    Reconnecting { attempt: u32 },
    /// Retry round exhausted; idle until `until_ms`.
    Waiting { until_ms: u64 },
}

/// Consecutive attempts per round.
pub const MAX_RETRIES: u32 = 10;
/// Pause between rounds.
pub const RETRY_PAUSE_MS: u64 = 5_000;
/// How long one association may take before it counts as failed.
pub const CONNECT_TIMEOUT_MS: u64 = 10_000;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    last_rssi: Option<i8>,
    #[cfg(target_os = "espidf")]
    driver: esp_idf_svc::wifi::EspWifi<'static>,
    /// Simulation: the next `n` connect attempts fail.
    #[cfg(not(target_os = "espidf"))]
    sim_failures: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: bool,
    /// Simulation: associations start but never complete.
    #[cfg(not(target_os = "espidf"))]
    sim_stalled: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(driver: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            last_rssi: None,
            driver,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            last_rssi: None,
            sim_failures: 0,
            sim_link_up: false,
            sim_stalled: false,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    fn on_connected(&mut self) {
        self.state = WifiState::Connected;
        self.last_rssi = self.platform_rssi();
        info!("WiFi: connected to '{}' (RSSI={:?})", self.ssid, self.last_rssi);
    }

    /// Start association attempt `retry` of the current round.
    fn begin_attempt(&mut self, retry: u32) {
        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connecting {
                    retry,
                    deadline_ms: None,
                };
            }
            Err(e) => {
                warn!("WiFi: attempt {} failed to start: {}", retry, e);
                self.state = WifiState::Reconnecting { attempt: retry };
            }
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let cfg = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        let result = self
            .driver
            .set_configuration(&cfg)
            .and_then(|()| {
                if self.driver.is_started()? {
                    Ok(())
                } else {
                    self.driver.start()
                }
            })
            .and_then(|()| self.driver.connect());
        result.map_err(|e| {
            warn!("WiFi: driver error {:?}", e);
            ConnectivityError::ConnectionFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        if self.sim_failures > 0 {
            self.sim_failures -= 1;
            warn!("WiFi(sim): scripted failure ({} left)", self.sim_failures);
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.sim_link_up = !self.sim_stalled;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.driver.disconnect() {
            warn!("WiFi: disconnect failed {:?}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_link_up = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_link_up
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        let mut ap_info = esp_idf_svc::sys::wifi_ap_record_t::default();
        // SAFETY: `ap_info` is a valid out pointer for the call.
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        (ret == 0).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        self.sim_link_up.then_some(-60)
    }

    // ── Simulation hooks ──────────────────────────────────────

    /// Make the next `n` connect attempts fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next(&mut self, n: u32) {
        self.sim_failures = n;
    }

    /// Drop the simulated link, as if the AP went away.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        self.sim_link_up = false;
    }

    /// Let associations start without ever completing.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_stall(&mut self, stalled: bool) {
        self.sim_stalled = stalled;
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if matches!(self.state, WifiState::Connected | WifiState::Connecting { .. }) {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connecting {
                    retry: 0,
                    deadline_ms: None,
                };
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.state = WifiState::Reconnecting { attempt: 0 };
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        self.last_rssi = None;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }

    fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Connecting { .. } if self.platform_is_connected() => self.on_connected(),
            WifiState::Connecting {
                retry,
                deadline_ms: None,
            } => {
                self.state = WifiState::Connecting {
                    retry,
                    deadline_ms: Some(now_ms + CONNECT_TIMEOUT_MS),
                };
            }
            WifiState::Connecting {
                retry,
                deadline_ms: Some(deadline),
            } if now_ms >= deadline => {
                warn!("WiFi: association timed out after {} ms", CONNECT_TIMEOUT_MS);
                self.platform_disconnect();
                self.state = WifiState::Reconnecting { attempt: retry };
            }
            WifiState::Connected => {
                if self.platform_is_connected() {
                    self.last_rssi = self.platform_rssi();
                } else {
                    warn!("WiFi: connection lost, reconnecting");
                    self.state = WifiState::Reconnecting { attempt: 0 };
                    self.last_rssi = None;
                }
            }
            WifiState::Reconnecting { attempt } if attempt >= MAX_RETRIES => {
                warn!("WiFi: {} attempts failed, pausing {} ms", attempt, RETRY_PAUSE_MS);
                self.state = WifiState::Waiting {
                    until_ms: now_ms + RETRY_PAUSE_MS,
                };
            }
            WifiState::Reconnecting { attempt } => {
                info!("WiFi: reconnect attempt {}/{}", attempt + 1, MAX_RETRIES);
                self.begin_attempt(attempt + 1);
            }
            WifiState::Waiting { until_ms } if now_ms >= until_ms => {
                self.state = WifiState::Reconnecting { attempt: 0 };
            }
            WifiState::Connecting { .. } | WifiState::Waiting { .. } | WifiState::Disconnected => {}
        }
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    fn rssi(&self) -> Option<i8> {
        self.last_rssi
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
