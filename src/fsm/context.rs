//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: cadence due-flags and link outcomes in, link commands out.
//! The service fills in the inputs before each tick and applies the
//! requested command through the port traits after it, so the handlers
//! themselves never touch the network.

use crate::config::DeviceConfig;

// ---------------------------------------------------------------------------
// Resolved broker endpoint
// ---------------------------------------------------------------------------

/// A broker endpoint produced by one successful mDNS search.
///
/// Transient: replaced wholesale on each new resolution and discarded on
/// any fallback to discovery. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBroker {
    /// Host address as reported by the responder.
    pub host: heapless::String<48>,
    /// Service port from the SRV answer.
    pub port: u16,
    /// Monotonic time of resolution (ms since boot).
    pub resolved_at_ms: u64,
}

impl ResolvedBroker {
    pub fn new(host: &str, port: u16, resolved_at_ms: u64) -> Self {
        let mut h = heapless::String::new();
        let _ = h.push_str(host);
        Self {
            host: h,
            port,
            resolved_at_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Connection state
// ---------------------------------------------------------------------------

/// Broker connection status, owned by the broker adapter; the context
/// holds a read-only mirror updated by the service each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// The transport dropped mid-operation; only `connect` or
    /// `disconnect` leave this state.
    Failed,
}

// ---------------------------------------------------------------------------
// Link commands and outcomes
// ---------------------------------------------------------------------------

/// The single network action a state handler may request per tick.
/// Applied by the service after `Fsm::tick` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkCommand {
    #[default]
    None,
    /// Issue one mDNS search cycle.
    Search,
    /// Connect to the cached `ResolvedBroker`.
    Connect,
    /// Build and publish one heartbeat.
    Publish,
    /// Tear down any broker session.
    Disconnect,
}

/// Result of the previous tick's command, fed back to the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkOutcome {
    /// No command was applied last tick.
    #[default]
    None,
    /// A search produced an endpoint (now cached in `broker`).
    Resolved,
    /// A search completed without an answer — retried next cadence.
    SearchMiss,
    ConnectOk,
    ConnectFailed,
    PublishOk,
    PublishFailed,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,

    // -- Cadence inputs (set by the service before each tick) --
    /// The search cadence has elapsed.
    pub search_due: bool,
    /// The publish cadence has elapsed.
    pub publish_due: bool,

    // -- Link state --
    /// Endpoint from the most recent successful search, if any.
    pub broker: Option<ResolvedBroker>,
    /// Mirror of the broker adapter's connection state.
    pub connection: ConnectionState,
    /// Result of the previous tick's command.
    pub outcome: LinkOutcome,

    // -- Output --
    /// Network action requested by the current tick's handler.
    pub command: LinkCommand,

    // -- Configuration --
    pub config: DeviceConfig,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            search_due: false,
            publish_due: false,
            broker: None,
            connection: ConnectionState::Disconnected,
            outcome: LinkOutcome::None,
            command: LinkCommand::None,
            config,
        }
    }
}
