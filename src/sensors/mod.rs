//! Sensor subsystem: per-channel input drivers and the [`ChannelSensors`]
//! bundle the hardware adapter reads each tick.

pub mod current;
pub mod drain;
pub mod flow;
pub mod mode;

use crate::channel::ChannelId;
use current::CurrentSensor;
use drain::DrainSensor;
use flow::FlowSensor;
use mode::ModeSwitch;

/// Every input wired to one appliance channel.
pub struct ChannelSensors {
    pub current: CurrentSensor,
    pub flow: FlowSensor,
    pub drain: DrainSensor,
    pub mode: ModeSwitch,
}

impl ChannelSensors {
    pub fn new(channel: ChannelId, counts_per_amp: f32) -> Self {
        Self {
            current: CurrentSensor::new(channel, counts_per_amp),
            flow: FlowSensor::new(channel),
            drain: DrainSensor::new(channel),
            mode: ModeSwitch::new(channel),
        }
    }

    /// Sensors for both channels, indexed by [`ChannelId::index`].
    pub fn both(counts_per_amp: f32) -> [Self; 2] {
        ChannelId::ALL.map(|id| Self::new(id, counts_per_amp))
    }
}
