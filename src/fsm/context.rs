//! Shared mutable context threaded through every FSM handler.
//!
//! `ChannelContext` is the single struct that state handlers read from
//! and write to.  It holds the latest sample, the mode, timing, the open
//! session, and an outbox of side effects.  Handlers never touch ports
//! directly; the owning [`Channel`](crate::channel::Channel) drains the
//! outbox after each tick.

use heapless::Vec;

use crate::channel::ChannelId;
use crate::config::{ChannelConfig, ThresholdConfig};
use crate::fsm::mode::DeviceMode;
use crate::fsm::session::{LogEvent, Session};

// ---------------------------------------------------------------------------
// Sample (read-only to state handlers; written by the sensor port)
// ---------------------------------------------------------------------------

/// One tick's readings for a single channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    /// Current transformer RMS (amps).
    pub current_rms: f32,
    /// Inlet flow rate since the previous tick.
    pub flow_rate: u32,
    /// Drain valve open.
    pub drain_active: bool,
}

// ---------------------------------------------------------------------------
// Outputs (written by state handlers; consumed by the channel)
// ---------------------------------------------------------------------------

/// A side effect requested by a state handler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelOutput {
    Indicator(bool),
    Status(bool),
    Log(LogEvent),
}

/// Worst case per tick is a boundary record, three edges, status and
/// indicator.
pub const OUTBOX_CAPACITY: usize = 8;

// ---------------------------------------------------------------------------
// ChannelContext
// ---------------------------------------------------------------------------

pub struct ChannelContext {
    pub channel: ChannelId,
    pub config: ChannelConfig,
    pub confirm_window_ms: u32,

    // --- Inputs (set before every tick) ---
    pub now_ms: u64,
    pub mode: DeviceMode,
    pub sample: Sample,

    // --- Timing (maintained by the engine) ---
    /// Milliseconds since the current state was entered.
    pub ms_in_state: u64,

    // --- Session state ---
    pub session: Option<Session>,
    /// First below-threshold tick seen while RUNNING.
    pub dip_at_ms: Option<u64>,
    /// Reference instant for the COOLDOWN end delay.
    pub cooldown_since_ms: u64,

    // --- Outputs ---
    pub outbox: Vec<ChannelOutput, OUTBOX_CAPACITY>,
}

impl ChannelContext {
    pub fn new(channel: ChannelId, config: ChannelConfig, confirm_window_ms: u32) -> Self {
        Self {
            channel,
            config,
            confirm_window_ms,
            now_ms: 0,
            mode: DeviceMode::Washer,
            sample: Sample::default(),
            ms_in_state: 0,
            session: None,
            dip_at_ms: None,
            cooldown_since_ms: 0,
            outbox: Vec::new(),
        }
    }

    /// Threshold set for the current mode.
    pub fn thresholds(&self) -> &ThresholdConfig {
        self.config.thresholds(self.mode)
    }

    pub fn trigger_asserted(&self) -> bool {
        self.mode.trigger_asserted(&self.sample, self.thresholds())
    }

    pub fn trigger_cleared(&self) -> bool {
        self.mode.trigger_cleared(&self.sample, self.thresholds())
    }

    /// Queue a side effect for the owning channel.
    pub fn emit(&mut self, out: ChannelOutput) {
        if self.outbox.push(out).is_err() {
            log::warn!("CH{}: outbox full, dropped {:?}", self.channel.number(), out);
        }
    }
}
