//! Bounded, non-blocking telemetry queue.
//!
//! The control loop encodes events into [`Frame`]s and pushes them into
//! a static `embassy-sync` channel.  The uplink thread drains it into a
//! [`Transport`].  When the queue is full the newest frame is dropped;
//! the control loop never waits.
//!
//! ```text
//! ┌──────────────┐   Frame    ┌──────────────┐   text   ┌───────────┐
//! │ Control loop │──────────▶│  TELEMETRY   │────────▶│ Transport │
//! │ (10 ms tick) │  try_send  │  (16 deep)   │  drain   │ (uplink)  │
//! └──────────────┘            └──────────────┘          └───────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::warn;

use super::websocket::Transport;
use super::wire::{self, Frame};
use crate::app::events::ChannelEvent;
use crate::app::ports::TelemetrySink;

/// Queue depth in frames.
pub const TELEMETRY_DEPTH: usize = 16;

pub type TelemetryChannel = Channel<CriticalSectionRawMutex, Frame, TELEMETRY_DEPTH>;

/// Outbound frames: control loop → uplink thread.
pub static TELEMETRY_CHANNEL: TelemetryChannel = Channel::new();

/// Producer side, owned by the control loop.
pub struct TelemetryQueue {
    channel: &'static TelemetryChannel,
    dropped: u32,
}

impl TelemetryQueue {
    pub fn new(channel: &'static TelemetryChannel) -> Self {
        Self { channel, dropped: 0 }
    }

    /// Frames discarded because the queue was full or encoding failed.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl TelemetrySink for TelemetryQueue {
    fn emit(&mut self, event: &ChannelEvent) {
        let frame = match wire::encode(event) {
            Ok(Some(frame)) => frame,
            Ok(None) => return,
            Err(e) => {
                self.dropped = self.dropped.wrapping_add(1);
                warn!("telemetry: encode failed: {}", e);
                return;
            }
        };
        if let Err(TrySendError::Full(frame)) = self.channel.try_send(frame) {
            self.dropped = self.dropped.wrapping_add(1);
            warn!(
                "telemetry: queue full, dropped CH{} frame ({} total)",
                frame.channel.number(),
                self.dropped
            );
        }
    }
}

/// Outcome of one [`drain`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    pub sent: usize,
    pub discarded: usize,
}

/// Send every queued frame.  Frames for a disconnected channel, or that
/// fail to send, are discarded; there is no retry.
pub fn drain<T: Transport>(channel: &TelemetryChannel, transport: &mut T) -> DrainStats {
    let mut stats = DrainStats::default();
    while let Ok(frame) = channel.try_receive() {
        if !transport.is_connected(frame.channel) {
            stats.discarded += 1;
            continue;
        }
        match transport.send_text(frame.channel, frame.text.as_str()) {
            Ok(()) => stats.sent += 1,
            Err(e) => {
                stats.discarded += 1;
                warn!("telemetry: CH{} send failed: {:?}", frame.channel.number(), e);
            }
        }
    }
    stats
}

/// Fan one event out to two sinks.
pub struct Tee<A, B>(pub A, pub B);

impl<A: TelemetrySink, B: TelemetrySink> TelemetrySink for Tee<A, B> {
    fn emit(&mut self, event: &ChannelEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}
