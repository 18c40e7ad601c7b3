//! Service-level behavior: startup, event emission, identity, and the
//! advisory memory supervisor.

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

    fn run_until(&mut self, from_ms: u64, to_ms: u64) {
        let mut now = from_ms + TICK_MS;
        while now <= to_ms {
            self.tick(now);
            now += TICK_MS;
        }
    }
}

#[test]
fn startup_emits_started_and_leaves_idle_on_first_tick() {
    let mut h = Harness::new();
    assert_eq!(h.sink.events.first(), Some(&AppEvent::Started(StateId::Idle)));
    assert_eq!(h.service.state(), StateId::Idle);

    h.tick(TICK_MS);
    assert_eq!(h.service.state(), StateId::Discovering);
    assert!(h.sink.contains(&AppEvent::StateChanged {
        from: StateId::Idle,
        to: StateId::Discovering,
    }));
}

#[test]
fn client_id_is_prefix_plus_address() {
    let config = DeviceConfig::preset(Preset::Development);
    let service = DeviceService::new(config, "192.168.0.42");
    assert_eq!(service.client_id(), "Arduino192.168.0.42");
}

#[test]
fn two_devices_get_distinct_client_ids() {
    let a = DeviceService::new(DeviceConfig::preset(Preset::Development), "192.168.0.10");
    let b = DeviceService::new(DeviceConfig::preset(Preset::Development), "192.168.0.11");
    assert_ne!(a.client_id(), b.client_id());
}

#[test]
fn broker_resolution_emits_endpoint_details() {
    let mut h = Harness::new();
    h.resolver.push_hit("192.168.1.50", 2883);

    h.run_until(0, 30_100);
    let resolved = h
        .sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::BrokerResolved { host, port } => Some((host.as_str().to_string(), *port)),
            _ => None,
        })
        .expect("no BrokerResolved event");
    assert_eq!(resolved, ("192.168.1.50".to_string(), 2883));
}

#[test]
fn low_memory_is_advisory_and_edge_triggered() {
    let mut h = Harness::new();
    h.resolver.push_hit("192.168.1.50", 1883);
    h.run_until(0, 30_200);
    assert_eq!(h.service.state(), StateId::Operational);

    // Free heap drops below the 1 KiB floor before the next monitoring
    // sample (60 s cadence, last sampled at t=0.1 s). Two further
    // samples land in this window, both below the floor.
    h.mem.set_free_bytes(512);
    h.run_until(30_200, 150_000);

    assert_eq!(
        h.sink.count(|e| matches!(e, AppEvent::LowMemory { .. })),
        1,
        "breach must be reported exactly once, not per sample"
    );
    assert!(h.sink.contains(&AppEvent::LowMemory {
        free_bytes: 512,
        threshold: 1024,
    }));

    // Advisory only: the link stayed up and the heartbeat at ~90.2 s
    // went out regardless.
    assert_eq!(h.service.state(), StateId::Operational);
    assert_eq!(h.broker.publishes.len(), 1);
    assert_eq!(h.broker.disconnects, 0);
}

#[test]
fn memory_recovery_is_reported_once() {
    let mut h = Harness::new();
    h.mem.set_free_bytes(512);
    h.run_until(0, 70_000); // samples at 0.1 s (low) and 60.1 s (low)

    h.mem.set_free_bytes(32 * 1024);
    h.run_until(70_000, 200_000);

    assert_eq!(h.sink.count(|e| matches!(e, AppEvent::LowMemory { .. })), 1);
    assert_eq!(
        h.sink.count(|e| matches!(e, AppEvent::MemoryRecovered { .. })),
        1
    );
}

#[test]
fn production_preset_stretches_every_cadence() {
    let config = DeviceConfig::preset(Preset::Production);
    let mut service = DeviceService::new(config, "10.0.0.7");
    let mut sink = RecordingSink::new();
    service.start(0, &mut sink);

    let mut h = Harness {
        service,
        resolver: MockResolver::new(),
        broker: MockBroker::new(),
        clock: MockClock::new(),
        mem: MockMemory::new(64 * 1024),
        sink,
    };
    h.resolver.push_hit("192.168.1.50", 1883);

    // Nothing on the wire before the 60 s production search interval.
    h.run_until(0, 59_900);
    assert_eq!(h.resolver.search_count(), 0);

    h.run_until(59_900, 60_300);
    assert_eq!(h.resolver.search_count(), 1);
    assert_eq!(h.service.state(), StateId::Operational);

    // First heartbeat lands one 5-minute interval after connect.
    h.run_until(60_300, 360_100);
    assert!(h.broker.publishes.is_empty());
    h.run_until(360_100, 360_400);
    assert_eq!(h.broker.publishes.len(), 1);
}
