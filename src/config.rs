//! Device configuration parameters.
//!
//! One schema, two named presets. The development preset is chatty and
//! fast-cycling for bench work; the production preset is silent and
//! conserves bandwidth. Every field can still be overridden after
//! construction, so tests and provisioning tooling are not locked to
//! either preset.

use serde::{Deserialize, Serialize};

/// Named configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Bench profile: verbose serial output, frequent cycles.
    Development,
    /// Field profile: silent, infrequent, generic service type.
    Production,
}

/// Core device configuration, loaded once at startup and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    // --- MQTT ---
    /// Topic the heartbeat is published to.
    pub mqtt_topic: heapless::String<32>,
    /// Broker TCP port used when the mDNS answer carries none.
    pub mqtt_port: u16,
    /// Client identifier prefix; the device IP is appended at runtime.
    pub mqtt_client_prefix: heapless::String<16>,

    // --- mDNS service discovery ---
    /// Service type to search for ("mqtt", "mosquitto").
    pub mdns_service_type: heapless::String<16>,
    /// Service protocol ("tcp").
    pub mdns_protocol: heapless::String<8>,
    /// Search domain ("local").
    pub mdns_domain: heapless::String<8>,
    /// Local UDP port queries are sent from.
    pub local_udp_port: u16,
    /// Standard mDNS responder port.
    pub mdns_port: u16,

    // --- Timing (milliseconds) ---
    /// mDNS search cadence.
    pub search_interval_ms: u32,
    /// Heartbeat publish cadence.
    pub publish_interval_ms: u32,
    /// RTC sync attempt cadence (until first success).
    pub rtc_sync_interval_ms: u32,
    /// Free-memory monitoring cadence.
    pub monitoring_interval_ms: u32,

    // --- Messages ---
    /// Heartbeat template; `{addr}` and `{time}` are substituted.
    pub heartbeat_template: heapless::String<64>,
    /// Timestamp placeholder used while the clock is unsynchronized.
    pub default_time_string: heapless::String<16>,

    // --- Monitoring ---
    /// Free-heap floor (bytes) below which LowMemory is reported.
    pub low_memory_threshold: u32,

    // --- Debug ---
    /// Gates all diagnostic output through the event sink.
    pub debug: bool,
}

fn s<const N: usize>(v: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    let _ = out.push_str(v);
    out
}

impl DeviceConfig {
    /// Build the configuration for a named preset.
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Development => Self {
                mqtt_topic: s("/arduino"),
                mqtt_port: 1883,
                mqtt_client_prefix: s("Arduino"),
                mdns_service_type: s("mosquitto"),
                mdns_protocol: s("tcp"),
                mdns_domain: s("local"),
                local_udp_port: 5354,
                mdns_port: 5353,
                search_interval_ms: 30_000,
                publish_interval_ms: 60_000,
                rtc_sync_interval_ms: 5_000,
                monitoring_interval_ms: 60_000,
                heartbeat_template: s("{addr} vous dit bonjour. Il est {time}"),
                default_time_string: s("--:--:--"),
                low_memory_threshold: 1024,
                debug: true,
            },
            Preset::Production => Self {
                // Generic service type for maximum broker compatibility.
                mdns_service_type: s("mqtt"),
                search_interval_ms: 60_000,
                publish_interval_ms: 300_000,
                rtc_sync_interval_ms: 10_000,
                monitoring_interval_ms: 3_600_000,
                heartbeat_template: s("Device {addr} online at {time}"),
                default_time_string: s("N/A"),
                debug: false,
                ..Self::preset(Preset::Development)
            },
        }
    }

    /// The preset selected at compile time (`production` cargo feature).
    pub fn active() -> Self {
        if cfg!(feature = "production") {
            Self::preset(Preset::Production)
        } else {
            Self::preset(Preset::Development)
        }
    }

    /// Range-check every field. Called once at startup; an invalid config
    /// is a build/provisioning bug, not a runtime condition.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.mqtt_topic.is_empty() {
            return Err("mqtt_topic must not be empty");
        }
        if self.mqtt_client_prefix.is_empty() {
            return Err("mqtt_client_prefix must not be empty");
        }
        if self.mdns_service_type.is_empty()
            || self.mdns_protocol.is_empty()
            || self.mdns_domain.is_empty()
        {
            return Err("mDNS service triple must not be empty");
        }
        if self.mqtt_port == 0 || self.local_udp_port == 0 || self.mdns_port == 0 {
            return Err("ports must be in 1-65535");
        }
        if self.search_interval_ms == 0
            || self.publish_interval_ms == 0
            || self.rtc_sync_interval_ms == 0
            || self.monitoring_interval_ms == 0
        {
            return Err("intervals must be non-zero");
        }
        if self.heartbeat_template.is_empty() {
            return Err("heartbeat_template must not be empty");
        }
        Ok(())
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::preset(Preset::Development)
    }
}
