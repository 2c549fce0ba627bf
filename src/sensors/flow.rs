//! Hall-effect inlet flow meter driver.
//!
//! The meter outputs a pulse train at 7.5 Hz per L/min.  A GPIO ISR
//! increments a per-channel atomic counter on each falling edge; `read`
//! swaps it to zero, so every read covers exactly one driver-loop period.
//!
//! ISR callbacks in ESP-IDF cannot capture, hence the `static` counters.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::channel::ChannelId;

/// Pulse frequency per L/min of flow (Hz).
const PULSES_PER_LPM: f32 = 7.5;

static FLOW_PULSE_COUNT: [AtomicU32; 2] = [AtomicU32::new(0), AtomicU32::new(0)];

/// Called from the GPIO ISR with the channel index.
pub fn flow_isr_handler(index: usize) {
    if let Some(counter) = FLOW_PULSE_COUNT.get(index) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Simulation: add `pulses` as if the meter had ticked.
#[cfg(not(target_os = "espidf"))]
pub fn sim_pulses(channel: ChannelId, pulses: u32) {
    FLOW_PULSE_COUNT[channel.index()].fetch_add(pulses, Ordering::Relaxed);
}

/// Convert a pulse count to the flow value compared against the
/// threshold.
pub fn pulses_to_rate(pulses: u32) -> u32 {
    (pulses as f32 * 60.0 / PULSES_PER_LPM) as u32
}

pub struct FlowSensor {
    channel: ChannelId,
}

impl FlowSensor {
    pub fn new(channel: ChannelId) -> Self {
        Self { channel }
    }

    /// Sample and reset the pulse counter.
    pub fn read(&mut self) -> u32 {
        let count = FLOW_PULSE_COUNT[self.channel.index()].swap(0, Ordering::Relaxed);
        pulses_to_rate(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_conversion() {
        assert_eq!(pulses_to_rate(0), 0);
        assert_eq!(pulses_to_rate(1), 8);
        assert_eq!(pulses_to_rate(7), 56);
    }

    #[test]
    fn read_resets_counter() {
        let mut s = FlowSensor::new(ChannelId::One);
        sim_pulses(ChannelId::One, 3);
        flow_isr_handler(0);
        assert_eq!(s.read(), 32);
        assert_eq!(s.read(), 0);
    }

    #[test]
    fn out_of_range_isr_index_is_ignored() {
        flow_isr_handler(7);
    }
}
