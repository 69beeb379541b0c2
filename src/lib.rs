//! WiFi + MQTT connectivity manager library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod events;
pub mod fsm;

pub mod error;
pub mod pins;

// The ESP-IDF backends are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
