//! Drain-valve / vibration sense inputs.
//!
//! Digital input per channel, HIGH while the appliance is draining.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads real GPIO levels via hw_init helpers.
//! On host/test: defaults to not draining.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

use crate::channel::ChannelId;
use crate::pins;

#[cfg(not(target_os = "espidf"))]
static SIM_DRAIN: [AtomicBool; 2] = [AtomicBool::new(false), AtomicBool::new(false)];

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_drain(channel: ChannelId, active: bool) {
    SIM_DRAIN[channel.index()].store(active, Ordering::Relaxed);
}

pub struct DrainSensor {
    channel: ChannelId,
    gpio: i32,
}

impl DrainSensor {
    pub fn new(channel: ChannelId) -> Self {
        let gpio = match channel {
            ChannelId::One => pins::CH1_DRAIN_GPIO,
            ChannelId::Two => pins::CH2_DRAIN_GPIO,
        };
        Self { channel, gpio }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    #[cfg(target_os = "espidf")]
    pub fn read(&mut self) -> bool {
        crate::drivers::hw_init::gpio_read(self.gpio)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&mut self) -> bool {
        SIM_DRAIN[self.channel.index()].load(Ordering::Relaxed)
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }
}
