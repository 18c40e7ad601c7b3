//! Failure-path tests: every broker-side fault must fall back to
//! discovery, discard the cached endpoint, and recover through a fresh
//! resolution. The responder is the only source of truth for where the
//! broker lives.

use crate::mock_net::{MockBroker, MockClock, MockMemory, MockResolver, RecordingSink};

use beaconlink::app::events::AppEvent;
use beaconlink::app::ports::BrokerPort;
use beaconlink::app::service::DeviceService;
use beaconlink::config::{DeviceConfig, Preset};
use beaconlink::error::DiscoveryError;
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

    fn run_until(&mut self, from_ms: u64, to_ms: u64) {
        let mut now = from_ms + TICK_MS;
        while now <= to_ms {
            self.tick(now);
            now += TICK_MS;
        }
    }

    /// Drive the happy path to Operational (resolved at 30 s, link up by
    /// 30.2 s).
    fn bring_up(&mut self) {
        self.resolver.push_hit("192.168.1.50", 1883);
        self.run_until(0, 30_200);
        assert_eq!(self.service.state(), StateId::Operational);
    }
}

#[test]
fn repeated_misses_keep_searching_without_touching_the_broker() {
    let mut h = Harness::new();
    h.resolver.push_miss();
    h.resolver.push_miss();
    h.resolver.push_miss();

    // Three full search intervals, every one a miss.
    h.run_until(0, 95_000);

    assert_eq!(h.service.state(), StateId::Discovering);
    assert_eq!(h.resolver.search_count(), 3);
    assert_eq!(h.sink.count(|e| *e == AppEvent::DiscoveryMiss), 3);
    assert!(h.broker.connect_calls.is_empty(), "connected without an endpoint");
    assert!(h.broker.publishes.is_empty());
}

#[test]
fn discovery_transport_error_is_treated_as_a_miss() {
    let mut h = Harness::new();
    h.resolver.push_error(DiscoveryError::QuerySendFailed);
    h.resolver.push_hit("192.168.1.50", 1883);

    h.run_until(0, 30_100);
    assert_eq!(h.service.state(), StateId::Discovering);
    assert_eq!(h.sink.count(|e| *e == AppEvent::DiscoveryMiss), 1);

    // Next cadence recovers normally.
    h.run_until(30_100, 60_300);
    assert_eq!(h.service.state(), StateId::Operational);
}

#[test]
fn connect_failure_falls_back_to_discovery() {
    let mut h = Harness::new();
    h.resolver.push_hit("192.168.1.50", 1883);
    h.broker.fail_connects(1);

    h.run_until(0, 30_300);
    assert_eq!(h.service.state(), StateId::Discovering);
    assert!(h.sink.contains(&AppEvent::ConnectFailed));
    assert!(h.sink.contains(&AppEvent::StateChanged {
        from: StateId::Connecting,
        to: StateId::Discovering,
    }));
}

#[test]
fn connect_failure_requires_a_fresh_resolution() {
    let mut h = Harness::new();
    h.resolver.push_hit("192.168.1.50", 1883);
    h.broker.fail_connects(1);
    // The broker moved between searches.
    h.resolver.push_hit("192.168.1.99", 1883);

    h.run_until(0, 60_300);
    assert_eq!(h.service.state(), StateId::Operational);
    assert_eq!(h.broker.connect_calls.len(), 2);
    assert_eq!(h.broker.connect_calls[1].0.host.as_str(), "192.168.1.99");
}

#[test]
fn publish_failure_discards_endpoint_and_rediscovers() {
    let mut h = Harness::new();
    h.bring_up();
    h.broker.fail_publishes(1);

    // First heartbeat attempt at ~90.2 s fails on the wire.
    h.run_until(30_200, 90_300);
    assert!(h.sink.contains(&AppEvent::PublishFailed));
    assert_eq!(h.service.state(), StateId::Discovering);
    assert!(h.sink.contains(&AppEvent::StateChanged {
        from: StateId::Operational,
        to: StateId::Discovering,
    }));

    // The stale session is torn down on re-entry into discovery.
    assert_eq!(h.broker.disconnects, 1);

    // Recovery goes through the responder again; the dropped heartbeat
    // is not retransmitted.
    h.resolver.push_hit("192.168.1.50", 1883);
    h.run_until(90_300, 180_500);
    assert_eq!(h.service.state(), StateId::Operational);
    assert_eq!(h.broker.connect_calls.len(), 2);
    assert_eq!(h.broker.publishes.len(), 1, "dropped heartbeat must not be retried");
}

#[test]
fn connection_loss_detected_between_publishes() {
    let mut h = Harness::new();
    h.bring_up();

    // The transport dies silently; the adapter notices and parks in
    // Disconnected before the next heartbeat is due.
    h.broker.disconnect();
    h.tick(40_000);

    assert_eq!(h.service.state(), StateId::Discovering);
    assert!(h.broker.publishes.is_empty());
}
