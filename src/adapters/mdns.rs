//! mDNS service-discovery adapter.
//!
//! Implements [`DiscoveryPort`]: one outbound PTR/SRV query per search
//! cycle, first answer wins, bounded wait. Uses the `esp-idf-svc` mDNS
//! wrapper on ESP-IDF and a scripted response queue on simulation
//! targets (which also counts wire queries, so tests can pin the
//! rate-limiting behaviour).
//!
//! A malformed or incomplete answer is a miss, never an error: the
//! search simply comes back empty and the controller retries on its
//! cadence.

use log::{info, warn};

use crate::app::ports::{DiscoveryPort, ServiceQuery};
use crate::error::DiscoveryError;
use crate::fsm::context::ResolvedBroker;

/// Bounded wait for answers within a single search call. Short enough
/// that a silent network cannot starve the cooperative loop.
const SEARCH_TIMEOUT_MS: u32 = 3_000;

#[cfg(target_os = "espidf")]
const MAX_ANSWERS: usize = 4;

/// mDNS resolver adapter.
pub struct MdnsResolver {
    /// Minimum spacing between wire queries; calls inside the window
    /// return a miss without sending anything.
    min_query_interval_ms: u32,
    last_query_ms: Option<u64>,
    #[cfg(target_os = "espidf")]
    initialized: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_responses: heapless::Deque<Option<ResolvedBroker>, 8>,
    #[cfg(not(target_os = "espidf"))]
    sim_queries_sent: u32,
}

impl MdnsResolver {
    /// `min_query_interval_ms` is normally the configured search
    /// interval — the adapter enforces it even if the caller polls
    /// faster.
    pub fn new(min_query_interval_ms: u32) -> Self {
        Self {
            min_query_interval_ms,
            last_query_ms: None,
            #[cfg(target_os = "espidf")]
            initialized: false,
            #[cfg(not(target_os = "espidf"))]
            sim_responses: heapless::Deque::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_queries_sent: 0,
        }
    }

    /// Simulation control: queue the result of the next wire query.
    #[cfg(not(target_os = "espidf"))]
    pub fn push_response(&mut self, response: Option<ResolvedBroker>) {
        let _ = self.sim_responses.push_back(response);
    }

    /// Simulation observation: how many queries actually hit the wire.
    #[cfg(not(target_os = "espidf"))]
    pub fn queries_sent(&self) -> u32 {
        self.sim_queries_sent
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_search(
        &mut self,
        query: &ServiceQuery<'_>,
        now_ms: u64,
    ) -> Result<Option<ResolvedBroker>, DiscoveryError> {
        use esp_idf_svc::sys::*;

        unsafe {
            if !self.initialized {
                let ret = mdns_init();
                if ret != ESP_OK as i32 {
                    warn!("mDNS: mdns_init failed ({})", ret);
                    return Err(DiscoveryError::InitFailed);
                }
                self.initialized = true;
            }

            // The component expects underscore-prefixed, null-terminated
            // service names: "_mqtt", "_tcp".
            let mut svc = [0u8; 24];
            let mut proto = [0u8; 12];
            write_mdns_name(&mut svc, query.service_type);
            write_mdns_name(&mut proto, query.protocol);

            let mut results: *mut mdns_result_t = core::ptr::null_mut();
            let ret = mdns_query_ptr(
                svc.as_ptr() as *const _,
                proto.as_ptr() as *const _,
                SEARCH_TIMEOUT_MS,
                MAX_ANSWERS,
                &mut results,
            );
            if ret != ESP_OK as i32 {
                warn!("mDNS: query failed ({})", ret);
                return Err(DiscoveryError::QuerySendFailed);
            }
            if results.is_null() {
                return Ok(None);
            }

            // First answer wins; no ranking across multiple responders.
            let first = &*results;
            let resolved = first_usable_answer(first, now_ms);
            mdns_query_results_free(results);
            Ok(resolved)
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_search(
        &mut self,
        query: &ServiceQuery<'_>,
        _now_ms: u64,
    ) -> Result<Option<ResolvedBroker>, DiscoveryError> {
        self.sim_queries_sent += 1;
        info!(
            "mDNS(sim): query #{} for _{}._{}.{} from :{} to :{}",
            self.sim_queries_sent,
            query.service_type,
            query.protocol,
            query.domain,
            query.local_port,
            query.mdns_port
        );
        Ok(self.sim_responses.pop_front().flatten())
    }
}

impl DiscoveryPort for MdnsResolver {
    fn search(
        &mut self,
        query: &ServiceQuery<'_>,
        now_ms: u64,
    ) -> Result<Option<ResolvedBroker>, DiscoveryError> {
        if let Some(last) = self.last_query_ms {
            if now_ms.saturating_sub(last) < u64::from(self.min_query_interval_ms) {
                // Inside the rate-limit window: no wire traffic.
                return Ok(None);
            }
        }
        self.last_query_ms = Some(now_ms);
        self.platform_search(query, now_ms)
    }
}

/// Copy `name` into `buf` with the mDNS underscore prefix and a
/// terminating NUL, truncating oversized names.
#[cfg(target_os = "espidf")]
fn write_mdns_name(buf: &mut [u8], name: &str) {
    buf[0] = b'_';
    let bytes = name.as_bytes();
    let len = bytes.len().min(buf.len() - 2);
    buf[1..=len].copy_from_slice(&bytes[..len]);
    buf[len + 1] = 0;
}

/// Extract host:port from a query answer, or `None` when the answer is
/// incomplete (no SRV port or no address record) — treated as a miss.
#[cfg(target_os = "espidf")]
unsafe fn first_usable_answer(
    result: &esp_idf_svc::sys::mdns_result_t,
    now_ms: u64,
) -> Option<ResolvedBroker> {
    use core::fmt::Write;

    if result.port == 0 || result.addr.is_null() {
        return None;
    }
    let addr = unsafe { &*result.addr };

    let mut host = heapless::String::<48>::new();
    // IPv4 answers only; the broker link is plain TCP.
    let ip = unsafe { addr.addr.u_addr.ip4.addr };
    let octets = ip.to_le_bytes();
    let _ = write!(
        host,
        "{}.{}.{}.{}",
        octets[0], octets[1], octets[2], octets[3]
    );

    Some(ResolvedBroker::new(&host, result.port, now_ms))
}
