//! Boot-to-first-heartbeat timeline against mock adapters.
//!
//! Drives `DeviceService::tick` with explicit monotonic timestamps and
//! verifies the cadence arithmetic end to end: first search one full
//! interval after boot, first heartbeat one full publish interval after
//! the connection comes up, never earlier.

use crate::mock_net::{MockBroker, MockClock, MockMemory, MockResolver, RecordingSink};

use beaconlink::app::events::AppEvent;
use beaconlink::app::service::DeviceService;
use beaconlink::config::{DeviceConfig, Preset};
use beaconlink::fsm::StateId;

const TICK_MS: u64 = 100;

struct Harness {
    service: DeviceService,
    resolver: MockResolver,
    broker: MockBroker,
    clock: MockClock,
    mem: MockMemory,
    sink: RecordingSink,
}

impl Harness {
    fn new() -> Self {
        let config = DeviceConfig::preset(Preset::Development);
        let mut service = DeviceService::new(config, "10.0.0.7");
        let mut sink = RecordingSink::new();
        service.start(0, &mut sink);
        Self {
            service,
            resolver: MockResolver::new(),
            broker: MockBroker::new(),
            clock: MockClock::new(),
            mem: MockMemory::new(64 * 1024),
            sink,
        }
    }

    fn tick(&mut self, now_ms: u64) {
        self.service.tick(
            now_ms,
            &mut self.resolver,
            &mut self.broker,
            &mut self.clock,
            &self.mem,
            &mut self.sink,
        );
    }

    /// Tick on the loop period from `from_ms` (exclusive) to `to_ms`
    /// (inclusive).
    fn run_until(&mut self, from_ms: u64, to_ms: u64) {
        let mut now = from_ms + TICK_MS;
        while now <= to_ms {
            self.tick(now);
            now += TICK_MS;
        }
    }
}

#[test]
fn first_search_waits_one_full_interval() {
    let mut h = Harness::new();
    h.resolver.push_hit("192.168.1.50", 1883);

    // Up to (but not including) the 30 s mark nothing goes on the wire.
    h.run_until(0, 29_900);
    assert_eq!(h.resolver.search_count(), 0, "search fired early");
    assert_eq!(h.service.state(), StateId::Discovering);

    h.tick(30_000);
    assert_eq!(h.resolver.search_count(), 1);
    assert_eq!(h.resolver.searches[0], 30_000);
}

#[test]
fn resolve_connect_then_heartbeat_one_publish_interval_later() {
    let mut h = Harness::new();
    h.resolver.push_hit("192.168.1.50", 1883);

    // Search hits at t=30 s; the connect lands on the following tick
    // and the connection is confirmed one tick after that.
    h.run_until(0, 30_200);
    assert_eq!(h.service.state(), StateId::Operational);
    assert_eq!(h.broker.connect_calls.len(), 1);

    let (endpoint, client_id) = &h.broker.connect_calls[0];
    assert_eq!(endpoint.host.as_str(), "192.168.1.50");
    assert_eq!(endpoint.port, 1883);
    assert_eq!(client_id, "Arduino10.0.0.7");

    // The heartbeat cadence is re-anchored at connect time: nothing is
    // published for one full interval after the link comes up.
    h.run_until(30_200, 90_000);
    assert!(h.broker.publishes.is_empty(), "published before the interval");

    h.run_until(90_000, 90_300);
    assert_eq!(h.broker.publishes.len(), 1);

    let (topic, payload) = h.broker.last_publish().unwrap();
    assert_eq!(topic, "/arduino");
    assert!(payload.contains("10.0.0.7"), "payload missing device address: {payload}");
}

#[test]
fn heartbeat_uses_placeholder_time_until_clock_syncs() {
    let mut h = Harness::new();
    h.resolver.push_hit("192.168.1.50", 1883);

    // Clock never syncs in this run.
    h.run_until(0, 90_300);
    let (_, payload) = h.broker.last_publish().unwrap();
    assert!(
        payload.contains("--:--:--"),
        "expected placeholder time, got: {payload}"
    );
}

#[test]
fn heartbeat_carries_formatted_time_after_sync() {
    let mut h = Harness::new();
    h.resolver.push_hit("192.168.1.50", 1883);
    h.clock.set_will_sync(true);

    h.run_until(0, 90_300);
    assert!(h.sink.contains(&AppEvent::ClockSynced));

    let (_, payload) = h.broker.last_publish().unwrap();
    assert!(payload.contains("12:34:56"), "payload missing time: {payload}");
    assert!(!payload.contains("--:--:--"));
}

#[test]
fn clock_sync_is_attempted_once_after_success() {
    let mut h = Harness::new();
    h.clock.set_will_sync(true);

    // First tick syncs; the cadence must go quiet afterwards.
    h.run_until(0, 60_000);
    assert_eq!(h.clock.sync_attempts, 1);
    assert_eq!(h.sink.count(|e| *e == AppEvent::ClockSynced), 1);
}

#[test]
fn clock_sync_retries_on_its_own_cadence_until_success() {
    let mut h = Harness::new();

    // 5 s retry interval in the development preset: attempts at t=0.1 s
    // (boot, immediately due), 5.1 s, 10.1 s, ...
    h.run_until(0, 12_000);
    assert_eq!(h.clock.sync_attempts, 3);
}

#[test]
fn publishing_continues_on_cadence_while_operational() {
    let mut h = Harness::new();
    h.resolver.push_hit("192.168.1.50", 1883);

    h.run_until(0, 270_000);
    // Connected at ~30.2 s; heartbeats at ~90.2, ~150.2, ~210.2, ~270.2 s
    // minus the tail not yet reached.
    assert_eq!(h.broker.publishes.len(), 3);
    assert_eq!(h.service.state(), StateId::Operational);

    // The search cadence stays parked while the link is up.
    assert_eq!(h.resolver.search_count(), 1);
}
