//! Washer/dryer selector switch, one per channel. LOW selects washer.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

use crate::channel::ChannelId;
use crate::fsm::mode::DeviceMode;
use crate::pins;

/// Simulation: `true` means the switch is in the dryer position.
#[cfg(not(target_os = "espidf"))]
static SIM_DRYER: [AtomicBool; 2] = [AtomicBool::new(false), AtomicBool::new(false)];

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_mode(channel: ChannelId, mode: DeviceMode) {
    SIM_DRYER[channel.index()].store(mode == DeviceMode::Dryer, Ordering::Relaxed);
}

/// Map the raw switch level to a mode.
pub fn mode_from_level(high: bool) -> DeviceMode {
    if high { DeviceMode::Dryer } else { DeviceMode::Washer }
}

pub struct ModeSwitch {
    channel: ChannelId,
    gpio: i32,
}

impl ModeSwitch {
    pub fn new(channel: ChannelId) -> Self {
        let gpio = match channel {
            ChannelId::One => pins::CH1_MODE_GPIO,
            ChannelId::Two => pins::CH2_MODE_GPIO,
        };
        Self { channel, gpio }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    #[cfg(target_os = "espidf")]
    pub fn read(&mut self) -> DeviceMode {
        mode_from_level(crate::drivers::hw_init::gpio_read(self.gpio))
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&mut self) -> DeviceMode {
        mode_from_level(SIM_DRYER[self.channel.index()].load(Ordering::Relaxed))
    }
}
