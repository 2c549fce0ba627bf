//! Laundrymon firmware library.
//!
//! Exposes the channel state machines, ports and adapters for
//! integration testing. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod channel;
pub mod config;
pub mod error;
pub mod fsm;
pub mod pins;

// Hardware-facing modules carry their own simulation backends.
pub mod adapters;
pub mod drivers;
pub mod sensors;
