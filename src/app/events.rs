//! Outbound channel events.
//!
//! Each [`Channel`](crate::channel::Channel) emits these through the
//! [`TelemetrySink`](super::ports::TelemetrySink) port.  Adapters on the
//! other side decide what to do with them: log to serial, queue for the
//! websocket uplink, or both.

use crate::channel::ChannelId;
use crate::fsm::StateId;
use crate::fsm::mode::DeviceMode;
use crate::fsm::session::LogEvent;

/// Structured events emitted by the per-channel state machines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelEvent {
    /// The channel became active or returned to idle.
    StatusChanged {
        channel: ChannelId,
        running: bool,
        mode: DeviceMode,
    },

    /// A session log record (START, END, or a sub-signal edge).
    Logged { channel: ChannelId, event: LogEvent },

    /// The state machine moved between states. Diagnostic only.
    StateChanged {
        channel: ChannelId,
        from: StateId,
        to: StateId,
    },
}

impl ChannelEvent {
    pub fn channel(&self) -> ChannelId {
        match self {
            Self::StatusChanged { channel, .. }
            | Self::Logged { channel, .. }
            | Self::StateChanged { channel, .. } => *channel,
        }
    }
}
