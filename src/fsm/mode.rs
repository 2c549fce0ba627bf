//! Appliance mode and the per-mode detection strategy.
//!
//! A channel is wired either to a washing machine or to a dryer.  The
//! mode decides three things: whether a start must be confirmed, which
//! inputs make up the trigger, and which sub-signals are logged while a
//! session is open.
//!
//! Every comparison is strict on both sides.  A reading exactly at its
//! threshold is neither "above" nor "below", so it never causes a
//! transition or a sub-signal toggle.

use serde::{Deserialize, Serialize};

use crate::config::ThresholdConfig;
use crate::fsm::context::Sample;
use crate::fsm::session::LogKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceMode {
    Washer,
    Dryer,
}

/// A secondary input tracked inside an open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubSignal {
    Current,
    Flow,
    Water,
}

impl SubSignal {
    pub const fn kind(self) -> LogKind {
        match self {
            Self::Current => LogKind::Current,
            Self::Flow => LogKind::Flow,
            Self::Water => LogKind::Water,
        }
    }

    /// `Some(true)` above threshold, `Some(false)` below, `None` exactly at it.
    pub fn level(self, sample: &Sample, t: &ThresholdConfig) -> Option<bool> {
        match self {
            Self::Current => compare(sample.current_rms, t.current_on_amps),
            Self::Flow => from_ordering(sample.flow_rate.cmp(&t.flow_on)),
            Self::Water => Some(sample.drain_active),
        }
    }
}

const WASHER_SIGNALS: [SubSignal; 3] = [SubSignal::Current, SubSignal::Flow, SubSignal::Water];
const DRYER_SIGNALS: [SubSignal; 1] = [SubSignal::Current];

impl DeviceMode {
    /// Washers must hold the trigger for the confirmation window before
    /// a session opens; dryers start immediately.
    pub const fn has_confirm_phase(self) -> bool {
        matches!(self, Self::Washer)
    }

    /// Sub-signals logged while a session is open, in logging order.
    pub const fn tracked(self) -> &'static [SubSignal] {
        match self {
            Self::Washer => &WASHER_SIGNALS,
            Self::Dryer => &DRYER_SIGNALS,
        }
    }

    /// Any tracked input strictly above its threshold.
    pub fn trigger_asserted(self, sample: &Sample, t: &ThresholdConfig) -> bool {
        self.tracked()
            .iter()
            .any(|s| s.level(sample, t) == Some(true))
    }

    /// Every tracked input strictly below its threshold.
    pub fn trigger_cleared(self, sample: &Sample, t: &ThresholdConfig) -> bool {
        self.tracked()
            .iter()
            .all(|s| s.level(sample, t) == Some(false))
    }

    /// Tag used by the remote status service.
    pub const fn device_type(self) -> &'static str {
        match self {
            Self::Washer => "WASH",
            Self::Dryer => "DRY",
        }
    }
}

fn compare(value: f32, threshold: f32) -> Option<bool> {
    value.partial_cmp(&threshold).and_then(from_ordering)
}

fn from_ordering(o: core::cmp::Ordering) -> Option<bool> {
    match o {
        core::cmp::Ordering::Greater => Some(true),
        core::cmp::Ordering::Less => Some(false),
        core::cmp::Ordering::Equal => None,
    }
}
