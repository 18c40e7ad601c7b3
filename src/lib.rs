//! BeaconLink firmware library.
//!
//! A single-purpose ESP32 controller that discovers an MQTT broker over
//! mDNS and publishes a periodic heartbeat to it. Exposes the pure-logic
//! modules for integration testing and external inspection. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod cadence;
pub mod config;
pub mod error;
pub mod fsm;
pub mod health;

// Platform ring. Real implementations are guarded by cfg attributes
// inside; all other targets get deterministic simulation adapters.
pub mod adapters;
