//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers — no closures, no
//! dynamic dispatch, no heap.  This is the classic embedded C FSM pattern
//! expressed in safe Rust.
//!
//! ```text
//!  IDLE ──[startup]──▶ DISCOVERING ──[broker resolved]──▶ CONNECTING
//!                          ▲  ▲                                │
//!                          │  └────────[connect failed]────────┤
//!                          │                                   ▼
//!                          └───[publish failed]────────── OPERATIONAL
//! ```
//!
//! The single retry policy of this device: every failure re-enters
//! DISCOVERING. mDNS is the source of truth for the broker location, so
//! a failed connect or publish invalidates the cached endpoint rather
//! than being retried against it.

use super::context::{ConnectionState, FsmContext, LinkCommand, LinkOutcome};
use super::{StateDescriptor, StateId};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: None,
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1 — Discovering
        StateDescriptor {
            id: StateId::Discovering,
            name: "Discovering",
            on_enter: Some(discovering_enter),
            on_exit: None,
            on_update: discovering_update,
        },
        // Index 2 — Connecting
        StateDescriptor {
            id: StateId::Connecting,
            name: "Connecting",
            on_enter: Some(connecting_enter),
            on_exit: None,
            on_update: connecting_update,
        },
        // Index 3 — Operational
        StateDescriptor {
            id: StateId::Operational,
            name: "Operational",
            on_enter: Some(operational_enter),
            on_exit: None,
            on_update: operational_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state — startup only
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update(_ctx: &mut FsmContext) -> Option<StateId> {
    // Nothing to wait for: discovery starts on the first tick.
    Some(StateId::Discovering)
}

// ═══════════════════════════════════════════════════════════════════════════
//  DISCOVERING state — searching for the broker over mDNS
// ═══════════════════════════════════════════════════════════════════════════

fn discovering_enter(ctx: &mut FsmContext) {
    // Any cached endpoint is stale by definition when we land here.
    ctx.broker = None;
    ctx.outcome = LinkOutcome::None;

    // Tear down a half-open session before searching again.
    if ctx.connection != ConnectionState::Disconnected {
        ctx.command = LinkCommand::Disconnect;
    }

    info!(
        "DISCOVERING: searching for _{}._{}.{}",
        ctx.config.mdns_service_type, ctx.config.mdns_protocol, ctx.config.mdns_domain
    );
}

fn discovering_update(ctx: &mut FsmContext) -> Option<StateId> {
    match ctx.outcome {
        LinkOutcome::Resolved => {
            debug_assert!(ctx.broker.is_some(), "Resolved outcome without endpoint");
            return Some(StateId::Connecting);
        }
        LinkOutcome::SearchMiss => {
            info!("DISCOVERING: no answer this cycle, retrying on cadence");
        }
        _ => {}
    }

    if ctx.search_due {
        ctx.command = LinkCommand::Search;
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTING state — one connect attempt against the resolved endpoint
// ═══════════════════════════════════════════════════════════════════════════

fn connecting_enter(ctx: &mut FsmContext) {
    if let Some(broker) = &ctx.broker {
        info!("CONNECTING: broker at {}:{}", broker.host, broker.port);
    }
    ctx.command = LinkCommand::Connect;
}

fn connecting_update(ctx: &mut FsmContext) -> Option<StateId> {
    match ctx.outcome {
        LinkOutcome::ConnectOk => Some(StateId::Operational),
        LinkOutcome::ConnectFailed => {
            // The advertised endpoint may have moved; resolve afresh
            // instead of hammering a possibly-dead address.
            warn!("CONNECTING: endpoint unreachable, re-entering discovery");
            Some(StateId::Discovering)
        }
        _ => {
            // Connect is synchronous with a bounded internal timeout, so
            // an outcome arrives one tick after the request. If it was
            // swallowed (adapter restart), re-request rather than hang.
            if ctx.ticks_in_state > 1 && ctx.command == LinkCommand::None {
                ctx.command = LinkCommand::Connect;
            }
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  OPERATIONAL state — heartbeat publishing on cadence
// ═══════════════════════════════════════════════════════════════════════════

fn operational_enter(ctx: &mut FsmContext) {
    info!(
        "OPERATIONAL: publishing to {} every {}ms",
        ctx.config.mqtt_topic, ctx.config.publish_interval_ms
    );
}

fn operational_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Any publish failure is treated as connection loss.
    if ctx.outcome == LinkOutcome::PublishFailed {
        warn!("OPERATIONAL: publish failed, falling back to discovery");
        return Some(StateId::Discovering);
    }

    // The adapter may also report a dropped transport between publishes.
    if matches!(
        ctx.connection,
        ConnectionState::Failed | ConnectionState::Disconnected
    ) {
        warn!("OPERATIONAL: connection lost, falling back to discovery");
        return Some(StateId::Discovering);
    }

    if ctx.publish_due {
        ctx.command = LinkCommand::Publish;
    }
    None
}
