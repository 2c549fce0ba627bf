//! Log-based telemetry sink adapter.
//!
//! Implements [`TelemetrySink`] by writing channel events to the ESP-IDF
//! logger (UART in production).  Used alongside the websocket queue so
//! every remote record also shows up on the serial console.

use log::{debug, info};

use crate::app::events::ChannelEvent;
use crate::app::ports::TelemetrySink;

/// Adapter that logs every [`ChannelEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySink for LogEventSink {
    fn emit(&mut self, event: &ChannelEvent) {
        match event {
            ChannelEvent::StatusChanged {
                channel,
                running,
                mode,
            } => {
                info!(
                    "STATUS | CH{} {} {}",
                    channel.number(),
                    mode.device_type(),
                    if *running { "working" } else { "idle" }
                );
            }
            ChannelEvent::Logged { channel, event } => {
                info!(
                    "LOG    | CH{} #{} {} t={}ms s={}",
                    channel.number(),
                    event.seq,
                    event.kind.tag(),
                    event.relative_ms,
                    u8::from(event.asserted)
                );
            }
            ChannelEvent::StateChanged { channel, from, to } => {
                debug!("STATE  | CH{} {:?} -> {:?}", channel.number(), from, to);
            }
        }
    }
}
