//! Application service: the hexagonal core.
//!
//! [`AppService`] owns both channels.  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!      SensorPort ──▶ ┌───────────────────────┐ ──▶ TelemetrySink
//! ModeSelectorPort ──▶│      AppService       │
//!   IndicatorPort ◀── │  Channel 1 · Channel 2│
//!                     └───────────────────────┘
//! ```

use log::info;

use crate::channel::{Channel, ChannelId};
use crate::config::SystemConfig;

use super::ports::{IndicatorPort, ModeSelectorPort, SensorPort, TelemetrySink};
use super::status::{ChannelStatus, StatusSnapshot};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service drives every channel.
pub struct AppService {
    channels: [Channel; 2],
    config: SystemConfig,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the channels. Call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let channels = ChannelId::ALL.map(|id| {
            Channel::new(id, *config.channel(id), config.confirm_window_ms)
        });
        Self {
            channels,
            config,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter IDLE on every channel.
    pub fn start(&mut self, now_ms: u64) {
        for ch in &mut self.channels {
            ch.start(now_ms);
        }
        for ch in &self.channels {
            let id = ch.id();
            info!(
                "CH{}: machine {} ({})",
                id.number(),
                self.config.device_no[id.index()],
                if ch.config().live { "live" } else { "not live" }
            );
        }
        info!("AppService started");
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one cycle: for each channel, in order, read the mode and
    /// a sample, then advance its state machine.
    ///
    /// `hw` serves the sensor, mode and indicator ports together.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ModeSelectorPort + IndicatorPort),
        sink: &mut impl TelemetrySink,
    ) {
        self.tick_count += 1;

        for ch in &mut self.channels {
            let id = ch.id();
            let mode = hw.read_mode(id);
            let sample = hw.read_sample(id);
            ch.tick(now_ms, mode, sample, hw, sink);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Latest activity, mode, and current for each channel.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            channels: self.channels.each_ref().map(|ch| ChannelStatus {
                channel: ch.id(),
                activity: ch.activity(),
                mode: ch.mode(),
                current_rms: ch.last_current(),
                live: ch.config().live,
            }),
        }
    }

    pub fn channel(&self, id: ChannelId) -> &Channel {
        &self.channels[id.index()]
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
