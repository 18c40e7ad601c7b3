//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production). The configuration debug
//! flag gates everything: with debug off the sink emits nothing at all,
//! trading observability for memory and CPU — the production preset
//! relies on heartbeats at the broker as its only sign of life.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink {
    enabled: bool,
}

impl LogEventSink {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        if !self.enabled {
            return;
        }
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::DiscoveryMiss => {
                info!("MDNS  | no broker found this cycle");
            }
            AppEvent::BrokerResolved { host, port } => {
                info!("MDNS  | resolved broker {}:{}", host, port);
            }
            AppEvent::BrokerConnected => {
                info!("MQTT  | connected");
            }
            AppEvent::ConnectFailed => {
                info!("MQTT  | connect failed, re-discovering");
            }
            AppEvent::HeartbeatPublished { topic } => {
                info!("MQTT  | heartbeat -> {}", topic);
            }
            AppEvent::PublishFailed => {
                info!("MQTT  | publish failed, re-discovering");
            }
            AppEvent::ClockSynced => {
                info!("RTC   | clock synchronized");
            }
            AppEvent::LowMemory {
                free_bytes,
                threshold,
            } => {
                info!("MEM   | low: {}B free (floor {}B)", free_bytes, threshold);
            }
            AppEvent::MemoryRecovered { free_bytes } => {
                info!("MEM   | recovered: {}B free", free_bytes);
            }
        }
    }
}
