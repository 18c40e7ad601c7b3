//! Platform adapters.
//!
//! Real ESP-IDF implementations are guarded by
//! `#[cfg(target_os = "espidf")]`; every adapter also carries a
//! deterministic simulation path so the whole control loop runs on the
//! host under test.

pub mod device_id;
pub mod log_sink;
pub mod mdns;
pub mod memory;
pub mod mqtt;
pub mod rtc;
pub mod wifi;
