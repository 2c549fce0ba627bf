//! Session log records.
//!
//! A session opens when a channel enters RUNNING from IDLE/CONFIRMING and
//! closes when COOLDOWN expires.  Every record carries a sequence number
//! and a timestamp relative to the session start.
//!
//! Sequence numbers start at 1.  START and END carry the current value
//! without consuming it; each sub-signal edge consumes one, so numbering
//! within a session never decreases.

use crate::fsm::mode::SubSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Start,
    End,
    Current,
    Flow,
    Water,
}

impl LogKind {
    /// Wire tag: `START`, `END`, `C`, `F`, `W`.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::End => "END",
            Self::Current => "C",
            Self::Flow => "F",
            Self::Water => "W",
        }
    }

    /// START and END delimit a session rather than report an edge.
    pub const fn is_boundary(self) -> bool {
        matches!(self, Self::Start | Self::End)
    }
}

/// One session log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEvent {
    pub seq: u32,
    pub kind: LogKind,
    /// Milliseconds since the session started.
    pub relative_ms: u64,
    /// Edge direction for sub-signal records. Always `true` for boundaries.
    pub asserted: bool,
}

/// Last logged level of each sub-signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubFlags {
    pub current: bool,
    pub flow: bool,
    pub water: bool,
}

impl SubFlags {
    pub fn get(&self, signal: SubSignal) -> bool {
        match signal {
            SubSignal::Current => self.current,
            SubSignal::Flow => self.flow,
            SubSignal::Water => self.water,
        }
    }

    pub fn set(&mut self, signal: SubSignal, value: bool) {
        match signal {
            SubSignal::Current => self.current = value,
            SubSignal::Flow => self.flow = value,
            SubSignal::Water => self.water = value,
        }
    }
}

/// An open appliance cycle on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    started_at_ms: u64,
    next_seq: u32,
    flags: SubFlags,
}

impl Session {
    pub fn begin(now_ms: u64) -> Self {
        Self {
            started_at_ms: now_ms,
            next_seq: 1,
            flags: SubFlags::default(),
        }
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    pub fn flags(&self) -> &SubFlags {
        &self.flags
    }

    /// Milliseconds since the session opened. Never negative.
    pub fn relative_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_at_ms)
    }

    pub fn start_record(&self, now_ms: u64) -> LogEvent {
        self.boundary(LogKind::Start, now_ms)
    }

    pub fn end_record(&self, now_ms: u64) -> LogEvent {
        self.boundary(LogKind::End, now_ms)
    }

    /// Update the flag for `signal` from its current level.
    ///
    /// Returns a record only on an edge; a level at its threshold leaves
    /// the flag untouched.
    pub fn track(&mut self, signal: SubSignal, level: Option<bool>, now_ms: u64) -> Option<LogEvent> {
        let above = level?;
        if above == self.flags.get(signal) {
            return None;
        }
        self.flags.set(signal, above);
        Some(self.record(signal.kind(), above, now_ms))
    }

    /// Build a sub-signal record and consume a sequence number.
    fn record(&mut self, kind: LogKind, asserted: bool, now_ms: u64) -> LogEvent {
        let ev = LogEvent {
            seq: self.next_seq,
            kind,
            relative_ms: self.relative_ms(now_ms),
            asserted,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        ev
    }

    fn boundary(&self, kind: LogKind, now_ms: u64) -> LogEvent {
        LogEvent {
            seq: self.next_seq,
            kind,
            relative_ms: self.relative_ms(now_ms),
            asserted: true,
        }
    }
}
