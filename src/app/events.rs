//! Outbound application events.
//!
//! The [`DeviceService`](super::service::DeviceService) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on
//! the other side decide what to do with them — on this device that is
//! the serial log, gated by the configuration debug flag.

use crate::fsm::StateId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A search cycle completed without an answer.
    DiscoveryMiss,

    /// A search cycle resolved a broker endpoint.
    BrokerResolved {
        host: heapless::String<48>,
        port: u16,
    },

    /// The broker connection is up.
    BrokerConnected,

    /// The connect attempt against the resolved endpoint failed.
    ConnectFailed,

    /// One heartbeat was accepted by the transport.
    HeartbeatPublished {
        topic: heapless::String<32>,
    },

    /// The transport dropped a heartbeat; the endpoint is discarded.
    PublishFailed,

    /// Wall-clock sync succeeded for the first time.
    ClockSynced,

    /// Free heap fell below the configured floor. Advisory only.
    LowMemory { free_bytes: u32, threshold: u32 },

    /// Free heap recovered above the floor.
    MemoryRecovered { free_bytes: u32 },
}
