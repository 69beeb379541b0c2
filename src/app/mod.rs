//! Application core: pure domain logic, zero I/O.
//!
//! Business rules for the connectivity manager: credential persistence,
//! retry and fallback policy, broker session upkeep, and control-message
//! handling.  All interaction with the radio, flash and timers happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod credentials;
pub mod events;
pub mod ports;
pub mod service;
