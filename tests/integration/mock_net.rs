//! Mock network and platform adapters for integration tests.
//!
//! Each mock records every call so tests can assert on the full command
//! history without touching real sockets or the ESP-IDF stack.

use std::cell::Cell;
use std::collections::VecDeque;

use beaconlink::app::events::AppEvent;
use beaconlink::app::ports::{
    BrokerPort, ClockPort, ClockStatus, DiscoveryPort, EventSink, MemoryPort, ServiceQuery,
    TIME_STR_CAP,
};
use beaconlink::error::{BrokerError, DiscoveryError};
use beaconlink::fsm::context::{ConnectionState, ResolvedBroker};

// ── MockResolver ──────────────────────────────────────────────

/// Scripted discovery: each `search` pops the next queued response.
/// An empty queue answers with a miss.
pub struct MockResolver {
    responses: VecDeque<Result<Option<ResolvedBroker>, DiscoveryError>>,
    pub searches: Vec<u64>,
}

#[allow(dead_code)]
impl MockResolver {
    pub fn new() -> Self {
        Self {
            responses: VecDeque::new(),
            searches: Vec::new(),
        }
    }

    pub fn push_hit(&mut self, host: &str, port: u16) {
        self.responses
            .push_back(Ok(Some(ResolvedBroker::new(host, port, 0))));
    }

    pub fn push_miss(&mut self) {
        self.responses.push_back(Ok(None));
    }

    pub fn push_error(&mut self, err: DiscoveryError) {
        self.responses.push_back(Err(err));
    }

    pub fn search_count(&self) -> usize {
        self.searches.len()
    }
}

impl Default for MockResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryPort for MockResolver {
    fn search(
        &mut self,
        _query: &ServiceQuery<'_>,
        now_ms: u64,
    ) -> Result<Option<ResolvedBroker>, DiscoveryError> {
        self.searches.push(now_ms);
        self.responses.pop_front().unwrap_or(Ok(None))
    }
}

// ── MockBroker ────────────────────────────────────────────────

/// Recording broker channel with scriptable connect/publish failures.
pub struct MockBroker {
    state: ConnectionState,
    fail_connects: u32,
    fail_publishes: u32,
    pub connect_calls: Vec<(ResolvedBroker, String)>,
    pub publishes: Vec<(String, String)>,
    pub disconnects: u32,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            fail_connects: 0,
            fail_publishes: 0,
            connect_calls: Vec::new(),
            publishes: Vec::new(),
            disconnects: 0,
        }
    }

    /// Fail this many connect attempts before succeeding.
    pub fn fail_connects(&mut self, count: u32) {
        self.fail_connects = count;
    }

    /// Fail this many publish attempts (transport drop, state → Failed).
    pub fn fail_publishes(&mut self, count: u32) {
        self.fail_publishes = count;
    }

    pub fn last_publish(&self) -> Option<&(String, String)> {
        self.publishes.last()
    }
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerPort for MockBroker {
    fn connect(&mut self, endpoint: &ResolvedBroker, client_id: &str) -> ConnectionState {
        self.connect_calls
            .push((endpoint.clone(), client_id.to_string()));
        self.state = if self.fail_connects > 0 {
            self.fail_connects -= 1;
            ConnectionState::Failed
        } else {
            ConnectionState::Connected
        };
        self.state
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), BrokerError> {
        if self.state != ConnectionState::Connected {
            return Err(BrokerError::NotConnected);
        }
        if self.fail_publishes > 0 {
            self.fail_publishes -= 1;
            self.state = ConnectionState::Failed;
            return Err(BrokerError::PublishFailed);
        }
        self.publishes.push((topic.to_string(), payload.to_string()));
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.state = ConnectionState::Disconnected;
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Clock that syncs on demand and reports a fixed formatted time.
pub struct MockClock {
    will_sync: bool,
    status: ClockStatus,
    pub sync_attempts: u32,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self {
            will_sync: false,
            status: ClockStatus::Unsynchronized,
            sync_attempts: 0,
        }
    }

    pub fn set_will_sync(&mut self, will_sync: bool) {
        self.will_sync = will_sync;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for MockClock {
    fn try_sync(&mut self, now_ms: u64) -> bool {
        self.sync_attempts += 1;
        if self.will_sync {
            self.status = ClockStatus::Synchronized {
                synced_at_ms: now_ms,
            };
        }
        matches!(self.status, ClockStatus::Synchronized { .. })
    }

    fn status(&self) -> ClockStatus {
        self.status
    }

    fn time_string(&self, default: &str) -> heapless::String<TIME_STR_CAP> {
        let mut out = heapless::String::new();
        match self.status {
            ClockStatus::Synchronized { .. } => {
                let _ = out.push_str("12:34:56");
            }
            ClockStatus::Unsynchronized => {
                let _ = out.push_str(default);
            }
        }
        out
    }
}

// ── MockMemory ────────────────────────────────────────────────

/// Settable free-heap value. `Cell` because the port samples through a
/// shared reference each tick.
pub struct MockMemory {
    free: Cell<u32>,
}

#[allow(dead_code)]
impl MockMemory {
    pub fn new(free_bytes: u32) -> Self {
        Self {
            free: Cell::new(free_bytes),
        }
    }

    pub fn set_free_bytes(&self, bytes: u32) {
        self.free.set(bytes);
    }
}

impl MemoryPort for MockMemory {
    fn free_bytes(&self) -> u32 {
        self.free.get()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Captures every emitted event for assertion.
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
