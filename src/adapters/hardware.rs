//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns both channels' [`ChannelSensors`] and the indicator LEDs,
//! exposing them through [`SensorPort`], [`ModeSelectorPort`] and
//! [`IndicatorPort`].  This is the only module in the system that touches
//! actual hardware.  On non-espidf targets, the underlying drivers use
//! cfg-gated simulation stubs.

use embedded_hal::digital::OutputPin;

use crate::app::ports::{IndicatorPort, ModeSelectorPort, SensorPort};
use crate::channel::ChannelId;
use crate::drivers::status_led::ChannelLeds;
use crate::error::SensorError;
use crate::fsm::mode::DeviceMode;
use crate::sensors::ChannelSensors;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<P: OutputPin> {
    sensors: [ChannelSensors; 2],
    leds: ChannelLeds<P>,
}

impl<P: OutputPin> HardwareAdapter<P> {
    pub fn new(sensors: [ChannelSensors; 2], leds: ChannelLeds<P>) -> Self {
        Self { sensors, leds }
    }

    pub fn leds(&self) -> &ChannelLeds<P> {
        &self.leds
    }

    fn sensors(&mut self, channel: ChannelId) -> &mut ChannelSensors {
        &mut self.sensors[channel.index()]
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<P: OutputPin> SensorPort for HardwareAdapter<P> {
    fn read_current_rms(&mut self, channel: ChannelId) -> Result<f32, SensorError> {
        self.sensors(channel).current.read_rms()
    }

    fn read_flow_rate(&mut self, channel: ChannelId) -> Result<u32, SensorError> {
        Ok(self.sensors(channel).flow.read())
    }

    fn read_drain(&mut self, channel: ChannelId) -> Result<bool, SensorError> {
        Ok(self.sensors(channel).drain.read())
    }
}

// ── ModeSelectorPort implementation ───────────────────────────

impl<P: OutputPin> ModeSelectorPort for HardwareAdapter<P> {
    fn read_mode(&mut self, channel: ChannelId) -> DeviceMode {
        self.sensors(channel).mode.read()
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<P: OutputPin> IndicatorPort for HardwareAdapter<P> {
    fn set_indicator(&mut self, channel: ChannelId, active: bool) {
        self.leds.set(channel, active);
    }
}
