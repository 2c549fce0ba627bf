//! Read-only status snapshot served to local HTTP clients.

use serde::Serialize;

use crate::channel::{ActivityState, ChannelId};
use crate::config::CHANNEL_COUNT;
use crate::fsm::mode::DeviceMode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStatus {
    pub channel: ChannelId,
    pub activity: ActivityState,
    pub mode: DeviceMode,
    pub current_rms: f32,
    /// Operator label from config; detection runs either way.
    pub live: bool,
}

impl ChannelStatus {
    pub const fn idle(channel: ChannelId) -> Self {
        Self {
            channel,
            activity: ActivityState::Idle,
            mode: DeviceMode::Washer,
            current_rms: 0.0,
            live: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub channels: [ChannelStatus; CHANNEL_COUNT],
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            channels: [
                ChannelStatus::idle(ChannelId::One),
                ChannelStatus::idle(ChannelId::Two),
            ],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetData {
    title: &'static str,
    ch1_status: &'static str,
    ch2_status: &'static str,
    ch1_current: f32,
    ch2_current: f32,
    ch1_live: bool,
    ch2_live: bool,
}

fn label(activity: ActivityState) -> &'static str {
    match activity {
        ActivityState::Running => "Working",
        ActivityState::Idle => "Not Working",
    }
}

impl StatusSnapshot {
    /// `{"title":"GetData","ch1Status":"Working",...,"ch2Current":0.0}`
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let [ch1, ch2] = &self.channels;
        serde_json::to_string(&GetData {
            title: "GetData",
            ch1_status: label(ch1.activity),
            ch2_status: label(ch2.activity),
            ch1_current: finite_or_zero(ch1.current_rms),
            ch2_current: finite_or_zero(ch2.current_rms),
            ch1_live: ch1.live,
            ch2_live: ch2.live,
        })
    }
}

// JSON has no NaN.
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}
