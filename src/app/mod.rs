//! Application core — hexagonal service, ports, events.

pub mod events;
pub mod heartbeat;
pub mod ports;
pub mod service;
