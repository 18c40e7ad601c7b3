//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DeviceService (domain)
//! ```
//!
//! Driven adapters (mDNS resolver, MQTT client, RTC, heap monitor, log
//! sink) implement these traits. The
//! [`DeviceService`](super::service::DeviceService) consumes them via
//! generics, so the domain core never touches the ESP-IDF stack directly
//! and the whole control loop runs on the host under test.
//!
//! Every network-facing operation behind these traits carries a bounded
//! internal timeout: one unresponsive peer must never stall the
//! cooperative loop.

use crate::error::{BrokerError, DiscoveryError};
use crate::fsm::context::{ConnectionState, ResolvedBroker};

/// Capacity of the formatted time string ("HH:MM:SS" plus slack for the
/// configured placeholder).
pub const TIME_STR_CAP: usize = 16;

/// Capacity of a composed heartbeat payload.
pub const HEARTBEAT_CAP: usize = 128;

// ───────────────────────────────────────────────────────────────
// Discovery port (driven adapter: mDNS → domain)
// ───────────────────────────────────────────────────────────────

/// The service-discovery query triple plus network parameters, borrowed
/// from the device configuration for the lifetime of one search.
#[derive(Debug, Clone, Copy)]
pub struct ServiceQuery<'a> {
    /// Service type without the underscore prefix ("mqtt", "mosquitto").
    pub service_type: &'a str,
    /// Protocol without the underscore prefix ("tcp").
    pub protocol: &'a str,
    /// Search domain ("local").
    pub domain: &'a str,
    /// Port queries are sent from.
    pub local_port: u16,
    /// Standard responder port queries are sent to.
    pub mdns_port: u16,
}

/// One-shot service discovery.
///
/// `search` sends a single query and waits (bounded) for answers:
/// - `Ok(Some(_))` — the first answer received wins; no ranking.
/// - `Ok(None)` — no answer before the timeout, or a malformed/partial
///   answer (a miss, never a hard error), or the call was rate-limited.
/// - `Err(_)` — transport-level failure only.
///
/// Implementations enforce the rate limit themselves: two calls within
/// less than the configured search interval must not put two queries on
/// the wire — the second returns `Ok(None)` without sending.
pub trait DiscoveryPort {
    fn search(
        &mut self,
        query: &ServiceQuery<'_>,
        now_ms: u64,
    ) -> Result<Option<ResolvedBroker>, DiscoveryError>;
}

// ───────────────────────────────────────────────────────────────
// Broker port (driven adapter: domain → MQTT)
// ───────────────────────────────────────────────────────────────

/// Connection-oriented publish channel to the resolved broker.
///
/// Contract:
/// - `connect` is idempotent: connecting to the endpoint it is already
///   connected to is a no-op returning `Connected`; a different endpoint
///   disconnects first.
/// - `publish` requires `Connected` and fails immediately with
///   [`BrokerError::NotConnected`] otherwise — reconnection policy
///   belongs to the controller, never the adapter.
/// - A transport failure during `publish` drops the payload and parks
///   the state in `Failed` (at-most-once delivery, no local queueing).
pub trait BrokerPort {
    fn connect(&mut self, endpoint: &ResolvedBroker, client_id: &str) -> ConnectionState;
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), BrokerError>;
    fn disconnect(&mut self);
    fn state(&self) -> ConnectionState;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: RTC/SNTP → domain)
// ───────────────────────────────────────────────────────────────

/// Wall-clock synchronisation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStatus {
    Unsynchronized,
    /// Carries the monotonic ms at which sync first succeeded.
    Synchronized { synced_at_ms: u64 },
}

/// Real-time clock access.
///
/// `time_string` must never return an empty string: a formatted
/// timestamp when synchronized, the configured placeholder verbatim
/// otherwise. The heartbeat must be producible before time sync.
pub trait ClockPort {
    /// One sync attempt (bounded). Returns whether the clock is now
    /// synchronized. Once it has succeeded the caller stops invoking it.
    fn try_sync(&mut self, now_ms: u64) -> bool;

    fn status(&self) -> ClockStatus;

    /// Formatted current time, or `default` verbatim when unsynchronized.
    fn time_string(&self, default: &str) -> heapless::String<TIME_STR_CAP>;
}

// ───────────────────────────────────────────────────────────────
// Memory port (driven adapter: heap metric → domain)
// ───────────────────────────────────────────────────────────────

/// Free-heap metric, sampled on the monitoring cadence.
pub trait MemoryPort {
    fn free_bytes(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go — on this device
/// the only sink is the (debug-gated) serial log; prolonged failure is
/// observable solely as missing heartbeats at the broker.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
