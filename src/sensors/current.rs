//! Current-transformer RMS measurement.
//!
//! The CT burden sits on a mid-rail bias, so an idle line reads ~2048
//! counts on the 12-bit ADC.  One measurement takes a burst of raw
//! conversions and returns the RMS deviation from that midpoint, scaled
//! by the configured counts-per-amp factor.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: oneshot ADC1 reads via hw_init.
//! On host/test: scales the value set with [`sim_set_current`].

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

use crate::channel::ChannelId;
use crate::error::SensorError;
use crate::pins;

/// Conversions per measurement. Spans several mains cycles.
pub const SAMPLES_PER_READING: usize = 1480;

#[cfg(not(target_os = "espidf"))]
static SIM_CURRENT: [AtomicU32; 2] = [AtomicU32::new(0), AtomicU32::new(0)];

/// Simulation: fix the RMS deviation the CT produces, in ADC counts.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_current(channel: ChannelId, amps: f32) {
    SIM_CURRENT[channel.index()].store(amps.to_bits(), Ordering::Relaxed);
}

/// RMS deviation of raw samples from `midpoint`, in counts.
pub fn rms_from_samples(samples: impl IntoIterator<Item = u16>, midpoint: f32) -> f32 {
    let (sum_sq, n) = samples.into_iter().fold((0.0f64, 0u32), |(acc, n), raw| {
        let d = f64::from(raw) - f64::from(midpoint);
        (acc + d * d, n + 1)
    });
    if n == 0 {
        return 0.0;
    }
    (sum_sq / f64::from(n)).sqrt() as f32
}

pub struct CurrentSensor {
    channel: ChannelId,
    adc_channel: u32,
    counts_per_amp: f32,
}

impl CurrentSensor {
    pub fn new(channel: ChannelId, counts_per_amp: f32) -> Self {
        let adc_channel = match channel {
            ChannelId::One => pins::CH1_CT_ADC_CHANNEL,
            ChannelId::Two => pins::CH2_CT_ADC_CHANNEL,
        };
        Self {
            channel,
            adc_channel,
            counts_per_amp,
        }
    }

    pub fn adc_channel(&self) -> u32 {
        self.adc_channel
    }

    /// Blocking burst read; returns amps RMS.
    #[cfg(target_os = "espidf")]
    pub fn read_rms(&mut self) -> Result<f32, SensorError> {
        use crate::drivers::hw_init;

        let mut failed = None;
        let samples = (0..SAMPLES_PER_READING).map_while(|_| match hw_init::adc1_read(self.adc_channel) {
            Ok(raw) => Some(raw),
            Err(e) => {
                failed = Some(e);
                None
            }
        });
        let rms = rms_from_samples(samples, pins::CT_ADC_MIDPOINT);
        if let Some(e) = failed {
            return Err(e);
        }
        Ok(rms / self.counts_per_amp)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read_rms(&mut self) -> Result<f32, SensorError> {
        let counts = f32::from_bits(SIM_CURRENT[self.channel.index()].load(Ordering::Relaxed));
        Ok(counts / self.counts_per_amp)
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }
}
