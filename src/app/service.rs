//! Device service — the hexagonal core.
//!
//! [`DeviceService`] owns the FSM, the four cadence timers, the clock
//! bookkeeping, and the health monitor. It exposes a clean,
//! hardware-agnostic API; all I/O flows through port traits injected at
//! call sites, making the entire controller testable with mock adapters.
//!
//! ```text
//!  DiscoveryPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!  BrokerPort    ◀── │     DeviceService       │
//!  ClockPort     ──▶ │  FSM · Cadences · Health│
//!  MemoryPort    ──▶ └────────────────────────┘
//! ```
//!
//! Per tick: run the clock and monitoring cadences, refresh the due
//! flags, tick the FSM, then apply the single link command the state
//! handler requested and record its outcome for the next tick. One
//! logical thread, no locking; every port call returns quickly.

use log::warn;

use crate::adapters::device_id;
use crate::cadence::Cadence;
use crate::config::DeviceConfig;
use crate::fsm::context::{FsmContext, LinkCommand, LinkOutcome};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::health::{HealthMonitor, HealthStatus};

use super::events::AppEvent;
use super::heartbeat;
use super::ports::{BrokerPort, ClockPort, DiscoveryPort, EventSink, MemoryPort, ServiceQuery};
use crate::fsm::context::ConnectionState;

// ───────────────────────────────────────────────────────────────
// DeviceService
// ───────────────────────────────────────────────────────────────

/// The orchestrator for the discovery-and-resilient-publish loop.
pub struct DeviceService {
    fsm: Fsm,
    ctx: FsmContext,

    search_cadence: Cadence,
    publish_cadence: Cadence,
    rtc_cadence: Cadence,
    monitoring_cadence: Cadence,

    health: HealthMonitor,
    /// Latched on the first successful sync; the RTC cadence stops
    /// firing afterwards (no drift correction on this device).
    clock_synced: bool,

    /// The device's own network address, baked into the client ID and
    /// every heartbeat.
    device_addr: heapless::String<48>,
    client_id: device_id::ClientIdString,
}

impl DeviceService {
    /// Construct the service from configuration and the device address
    /// obtained from the network join.
    pub fn new(config: DeviceConfig, device_addr: &str) -> Self {
        let client_id = device_id::client_id(&config.mqtt_client_prefix, device_addr);
        let health = HealthMonitor::new(config.low_memory_threshold);

        let search_cadence = Cadence::fixed(config.search_interval_ms);
        let publish_cadence = Cadence::fixed(config.publish_interval_ms);
        let rtc_cadence = Cadence::fixed(config.rtc_sync_interval_ms);
        let monitoring_cadence = Cadence::fixed(config.monitoring_interval_ms);

        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Idle);

        let mut addr = heapless::String::new();
        let _ = addr.push_str(device_addr);

        Self {
            fsm,
            ctx,
            search_cadence,
            publish_cadence,
            rtc_cadence,
            monitoring_cadence,
            health,
            clock_synced: false,
            device_addr: addr,
            client_id,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM and anchor the search cadence at `now_ms`, so the
    /// first search fires one full interval after boot (the network
    /// stack gets time to settle). RTC sync and monitoring stay due
    /// immediately.
    pub fn start(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        self.search_cadence.fire(now_ms);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
    }

    /// The controller's current state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Whether the wall clock has synced at least once.
    pub fn clock_synced(&self) -> bool {
        self.clock_synced
    }

    /// The derived MQTT client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    pub fn tick(
        &mut self,
        now_ms: u64,
        resolver: &mut impl DiscoveryPort,
        broker: &mut impl BrokerPort,
        clock: &mut impl ClockPort,
        mem: &impl MemoryPort,
        sink: &mut impl EventSink,
    ) {
        // 1. Clock sync cadence — independent of the link state machine,
        //    stops permanently after the first success.
        if !self.clock_synced && self.rtc_cadence.due(now_ms) {
            self.rtc_cadence.fire(now_ms);
            if clock.try_sync(now_ms) {
                self.clock_synced = true;
                sink.emit(&AppEvent::ClockSynced);
            }
        }

        // 2. Monitoring cadence — advisory only; never touches the link.
        if self.monitoring_cadence.due(now_ms) {
            self.monitoring_cadence.fire(now_ms);
            let free = mem.free_bytes();
            match self.health.sample_edge(free) {
                Some(HealthStatus::Low) => sink.emit(&AppEvent::LowMemory {
                    free_bytes: free,
                    threshold: self.ctx.config.low_memory_threshold,
                }),
                Some(HealthStatus::Ok) => {
                    sink.emit(&AppEvent::MemoryRecovered { free_bytes: free });
                }
                None => {}
            }
        }

        // 3. Refresh the blackboard inputs.
        self.ctx.search_due = self.search_cadence.due(now_ms);
        self.ctx.publish_due = self.publish_cadence.due(now_ms);
        self.ctx.connection = broker.state();
        self.ctx.command = LinkCommand::None;

        // 4. FSM tick (pure state logic).
        let prev_state = self.fsm.current_state();
        self.fsm.tick(&mut self.ctx);
        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
            if new_state == StateId::Operational {
                // Heartbeats start one full interval after the link
                // comes up, not in a burst at connect time.
                self.publish_cadence.fire(now_ms);
            }
        }

        // 5. Apply the requested link command and record the outcome.
        self.ctx.outcome = self.apply_command(now_ms, resolver, broker, clock, sink);
    }

    // ── Command application ───────────────────────────────────

    fn apply_command(
        &mut self,
        now_ms: u64,
        resolver: &mut impl DiscoveryPort,
        broker: &mut impl BrokerPort,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> LinkOutcome {
        match self.ctx.command {
            LinkCommand::None => LinkOutcome::None,

            LinkCommand::Search => {
                self.search_cadence.fire(now_ms);
                let query = ServiceQuery {
                    service_type: &self.ctx.config.mdns_service_type,
                    protocol: &self.ctx.config.mdns_protocol,
                    domain: &self.ctx.config.mdns_domain,
                    local_port: self.ctx.config.local_udp_port,
                    mdns_port: self.ctx.config.mdns_port,
                };
                match resolver.search(&query, now_ms) {
                    Ok(Some(endpoint)) => {
                        sink.emit(&AppEvent::BrokerResolved {
                            host: endpoint.host.clone(),
                            port: endpoint.port,
                        });
                        self.ctx.broker = Some(endpoint);
                        LinkOutcome::Resolved
                    }
                    Ok(None) => {
                        sink.emit(&AppEvent::DiscoveryMiss);
                        LinkOutcome::SearchMiss
                    }
                    Err(e) => {
                        // Transport trouble is handled exactly like a
                        // miss: retried on the next cadence.
                        warn!("discovery transport error: {e}");
                        sink.emit(&AppEvent::DiscoveryMiss);
                        LinkOutcome::SearchMiss
                    }
                }
            }

            LinkCommand::Connect => {
                let Some(endpoint) = self.ctx.broker.clone() else {
                    return LinkOutcome::ConnectFailed;
                };
                let state = broker.connect(&endpoint, &self.client_id);
                self.ctx.connection = state;
                if state == ConnectionState::Connected {
                    sink.emit(&AppEvent::BrokerConnected);
                    LinkOutcome::ConnectOk
                } else {
                    sink.emit(&AppEvent::ConnectFailed);
                    LinkOutcome::ConnectFailed
                }
            }

            LinkCommand::Publish => {
                self.publish_cadence.fire(now_ms);
                let time = clock.time_string(&self.ctx.config.default_time_string);
                let payload = heartbeat::compose(
                    &self.ctx.config.heartbeat_template,
                    &self.device_addr,
                    &time,
                );
                match broker.publish(&self.ctx.config.mqtt_topic, &payload) {
                    Ok(()) => {
                        sink.emit(&AppEvent::HeartbeatPublished {
                            topic: self.ctx.config.mqtt_topic.clone(),
                        });
                        LinkOutcome::PublishOk
                    }
                    Err(e) => {
                        warn!("publish failed: {e}");
                        self.ctx.connection = broker.state();
                        sink.emit(&AppEvent::PublishFailed);
                        LinkOutcome::PublishFailed
                    }
                }
            }

            LinkCommand::Disconnect => {
                broker.disconnect();
                self.ctx.connection = broker.state();
                LinkOutcome::None
            }
        }
    }
}
