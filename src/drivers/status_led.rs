//! Per-channel activity LEDs.
//!
//! Generic over [`embedded_hal::digital::OutputPin`] so the same driver
//! runs on `esp_idf_hal::gpio::PinDriver` and on a host-side fake pin.
//! Pin errors are logged and otherwise ignored: a dead LED must not stop
//! the monitor.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::channel::ChannelId;

pub struct ChannelLeds<P: OutputPin> {
    pins: [P; 2],
    lit: [bool; 2],
}

impl<P: OutputPin> ChannelLeds<P> {
    /// `ch1` and `ch2` are driven HIGH while their channel is running.
    pub fn new(ch1: P, ch2: P) -> Self {
        let mut leds = Self {
            pins: [ch1, ch2],
            lit: [false; 2],
        };
        for id in ChannelId::ALL {
            leds.set(id, false);
        }
        leds
    }

    pub fn set(&mut self, channel: ChannelId, on: bool) {
        let pin = &mut self.pins[channel.index()];
        let result = if on { pin.set_high() } else { pin.set_low() };
        match result {
            Ok(()) => self.lit[channel.index()] = on,
            Err(e) => warn!("CH{}: LED write failed: {:?}", channel.number(), e),
        }
    }

    pub fn is_lit(&self, channel: ChannelId) -> bool {
        self.lit[channel.index()]
    }
}
