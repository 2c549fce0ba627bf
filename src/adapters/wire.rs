//! JSON frames exchanged with the remote status service.
//!
//! ```text
//! status   {"id":101,"device_type":"WASH","state":0}          0 = working, 1 = idle
//! edge     {"title":"Log","id":101,"log":{"3":{"t":1250,"n":"F","s":1}}}
//! boundary {"title":"Log","id":101,"log":{"START":{"local_time":""}}}
//! ```

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::app::events::ChannelEvent;
use crate::channel::ChannelId;
use crate::fsm::session::LogEvent;

/// Upper bound on an encoded frame.
pub const FRAME_CAPACITY: usize = 192;

/// One encoded message bound for a channel's connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub channel: ChannelId,
    pub text: heapless::String<FRAME_CAPACITY>,
}

#[derive(Debug)]
pub enum WireError {
    Json(serde_json::Error),
    TooLong(usize),
}

impl core::fmt::Display for WireError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(e) => write!(f, "json: {}", e),
            Self::TooLong(n) => write!(f, "frame of {} bytes exceeds {}", n, FRAME_CAPACITY),
        }
    }
}

#[derive(Serialize)]
struct StatusFrame {
    id: u16,
    device_type: &'static str,
    state: u8,
}

#[derive(Serialize)]
struct LogFrame<B: Serialize> {
    title: &'static str,
    id: u16,
    log: B,
}

#[derive(Serialize)]
struct Edge {
    t: u64,
    n: &'static str,
    s: u8,
}

#[derive(Serialize)]
struct Boundary {
    local_time: &'static str,
}

/// A JSON object with exactly one entry.
struct Single<'a, V> {
    key: &'a str,
    value: V,
}

impl<V: Serialize> Serialize for Single<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, &self.value)?;
        map.end()
    }
}

fn log_body(id: u16, ev: &LogEvent) -> Result<String, serde_json::Error> {
    if ev.kind.is_boundary() {
        serde_json::to_string(&LogFrame {
            title: "Log",
            id,
            log: Single {
                key: ev.kind.tag(),
                value: Boundary { local_time: "" },
            },
        })
    } else {
        let key = ev.seq.to_string();
        serde_json::to_string(&LogFrame {
            title: "Log",
            id,
            log: Single {
                key: &key,
                value: Edge {
                    t: ev.relative_ms,
                    n: ev.kind.tag(),
                    s: u8::from(ev.asserted),
                },
            },
        })
    }
}

/// Encode an event for the uplink.  Diagnostic events yield `None`.
pub fn encode(event: &ChannelEvent) -> Result<Option<Frame>, WireError> {
    let channel = event.channel();
    let id = channel.hw_id();

    let json = match event {
        ChannelEvent::StatusChanged { running, mode, .. } => serde_json::to_string(&StatusFrame {
            id,
            device_type: mode.device_type(),
            state: if *running { 0 } else { 1 },
        }),
        ChannelEvent::Logged { event, .. } => log_body(id, event),
        ChannelEvent::StateChanged { .. } => return Ok(None),
    }
    .map_err(WireError::Json)?;

    let text = heapless::String::try_from(json.as_str()).map_err(|_| WireError::TooLong(json.len()))?;
    Ok(Some(Frame { channel, text }))
}
