//! BeaconLink Firmware — Main Entry Point
//!
//! Hexagonal architecture with a cooperative single-threaded loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                   │
//! │                                                            │
//! │  WifiAdapter      MdnsResolver     MqttBrokerAdapter       │
//! │  (Connectivity)   (DiscoveryPort)  (BrokerPort)            │
//! │  RtcAdapter       HeapMonitor      LogEventSink            │
//! │  (ClockPort)      (MemoryPort)     (EventSink)             │
//! │                                                            │
//! │  ─────────────── Port Trait Boundary ──────────────────    │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │           DeviceService (pure logic)                 │  │
//! │  │  FSM · Cadences · Health                             │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{info, warn};

use beaconlink::adapters::device_id;
use beaconlink::adapters::log_sink::LogEventSink;
use beaconlink::adapters::mdns::MdnsResolver;
use beaconlink::adapters::memory::HeapMonitorAdapter;
use beaconlink::adapters::mqtt::MqttBrokerAdapter;
use beaconlink::adapters::rtc::RtcAdapter;
use beaconlink::adapters::wifi::{ConnectivityPort, WifiAdapter};
use beaconlink::app::service::DeviceService;
use beaconlink::config::DeviceConfig;

/// Loop period. Everything slower than this (search, publish, RTC sync,
/// monitoring) is paced by the cadence timers inside the service.
const TICK_INTERVAL_MS: u32 = 100;

/// Milliseconds since boot, from the high-resolution timer.
fn now_ms() -> u64 {
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1_000) as u64
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  BeaconLink v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = DeviceConfig::active();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    info!(
        "Config: topic='{}' search={}ms publish={}ms debug={}",
        config.mqtt_topic, config.search_interval_ms, config.publish_interval_ms, config.debug
    );

    // ── 3. Device identity ────────────────────────────────────
    let mac = device_id::read_mac();
    let dev_hostname = device_id::hostname(&mac);
    info!("Device hostname: {}", dev_hostname);

    // ── 4. WiFi station ───────────────────────────────────────
    let peripherals = esp_idf_svc::hal::prelude::Peripherals::take()?;
    let sysloop = esp_idf_svc::eventloop::EspSystemEventLoop::take()?;
    let nvs = esp_idf_svc::nvs::EspDefaultNvsPartition::take()?;

    let driver = esp_idf_svc::wifi::BlockingWifi::wrap(
        esp_idf_svc::wifi::EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;
    let mut wifi = WifiAdapter::new(driver);

    let ssid = option_env!("BEACONLINK_WIFI_SSID").unwrap_or("beaconlink");
    let password = option_env!("BEACONLINK_WIFI_PASSWORD").unwrap_or("");
    wifi.set_credentials(ssid, password)
        .map_err(|e| anyhow::anyhow!("WiFi credentials rejected: {e}"))?;

    if let Err(e) = wifi.connect() {
        // Not fatal: poll() retries with backoff below.
        warn!("Initial WiFi join failed ({e}), retrying in the loop");
    }
    while !wifi.is_connected() {
        wifi.poll(now_ms());
        std::thread::sleep(std::time::Duration::from_millis(u64::from(TICK_INTERVAL_MS)));
    }
    let device_addr = wifi
        .ip_addr()
        .context("connected but no station IP")?;
    info!("WiFi up, station IP {}", device_addr);

    // ── 5. Construct adapters ─────────────────────────────────
    // The resolver's rate limit matches the search cadence, so a
    // re-entry into discovery can never flood the network.
    let mut resolver = MdnsResolver::new(config.search_interval_ms);
    let mut broker = MqttBrokerAdapter::new();
    let mut clock = RtcAdapter::new();
    let mem = HeapMonitorAdapter::new();
    let mut sink = LogEventSink::new(config.debug);

    // ── 6. Construct the service ──────────────────────────────
    let mut service = DeviceService::new(config, &device_addr);
    info!("MQTT client ID: {}", service.client_id());
    service.start(now_ms(), &mut sink);

    info!("System ready. Entering control loop.");

    // ── 7. Control loop ───────────────────────────────────────
    loop {
        let now = now_ms();

        // Drive WiFi reconnection first; while the link is down there
        // is no point searching or publishing, so the service holds.
        wifi.poll(now);
        if wifi.is_connected() {
            service.tick(now, &mut resolver, &mut broker, &mut clock, &mem, &mut sink);
        }

        std::thread::sleep(std::time::Duration::from_millis(u64::from(TICK_INTERVAL_MS)));
    }
}
