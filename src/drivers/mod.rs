//! Hardware initialisation and output drivers.

pub mod hw_init;
pub mod status_led;
