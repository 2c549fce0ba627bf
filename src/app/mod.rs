//! Application core: pure domain logic, zero I/O.
//!
//! Drives both channel state machines once per tick and exposes the
//! status snapshot.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
pub mod status;
