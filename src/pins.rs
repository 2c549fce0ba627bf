//! GPIO / peripheral pin assignments for the two-channel monitor board.
//!
//! Every driver references this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Indicator LEDs
// ---------------------------------------------------------------------------

/// Channel 1 activity LED (HIGH = running).
pub const CH1_LED_GPIO: i32 = 18;
/// Channel 2 activity LED (HIGH = running).
pub const CH2_LED_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// Digital inputs
// ---------------------------------------------------------------------------

/// Drain-valve sense, HIGH = draining.
pub const CH1_DRAIN_GPIO: i32 = 23;
pub const CH2_DRAIN_GPIO: i32 = 25;

/// Water-inlet flow meter pulse outputs, counted on the falling edge.
pub const CH1_FLOW_GPIO: i32 = 27;
pub const CH2_FLOW_GPIO: i32 = 26;

/// Mode selector switches. LOW = washer, HIGH = dryer.
pub const CH1_MODE_GPIO: i32 = 33;
pub const CH2_MODE_GPIO: i32 = 32;

// ---------------------------------------------------------------------------
// Current transformers (ADC1, 12-bit, 11 dB attenuation)
// ---------------------------------------------------------------------------

/// GPIO 35, ADC1 channel 7.
pub const CH1_CT_ADC_CHANNEL: u32 = 7;
/// GPIO 34, ADC1 channel 6.
pub const CH2_CT_ADC_CHANNEL: u32 = 6;

/// Attenuation for both CT inputs (11 dB → 0 – 3.1 V range).
pub const CT_ADC_ATTEN: u32 = 3;

/// Mid-rail bias of the CT burden circuit in ADC counts.
pub const CT_ADC_MIDPOINT: f32 = 2048.0;
