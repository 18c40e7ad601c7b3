//! MQTT broker connection adapter.
//!
//! Implements [`BrokerPort`] over the ESP-IDF MQTT client on target
//! (`esp-idf-svc` `experimental` feature) and a scripted simulation on
//! the host. QoS 0 only — a dropped payload is dropped, matching the
//! at-most-once contract; the controller's re-discovery policy is the
//! recovery path, so the adapter never reconnects on its own.

use log::{info, warn};

use crate::app::ports::BrokerPort;
use crate::error::BrokerError;
use crate::fsm::context::{ConnectionState, ResolvedBroker};

/// Broker connection adapter.
pub struct MqttBrokerAdapter {
    state: ConnectionState,
    /// The endpoint of the live session, used for connect idempotency.
    endpoint: Option<ResolvedBroker>,
    #[cfg(target_os = "espidf")]
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    /// Simulation: fail this many connect attempts before succeeding.
    #[cfg(not(target_os = "espidf"))]
    sim_connect_failures: u32,
    /// Simulation: fail the next publish, then succeed again.
    #[cfg(not(target_os = "espidf"))]
    sim_fail_next_publish: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_connect_calls: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_publish_count: u32,
}

impl Default for MqttBrokerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MqttBrokerAdapter {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            endpoint: None,
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            sim_connect_failures: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_fail_next_publish: false,
            #[cfg(not(target_os = "espidf"))]
            sim_connect_calls: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_publish_count: 0,
        }
    }

    // ── Simulation controls ───────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    pub fn fail_connects(&mut self, count: u32) {
        self.sim_connect_failures = count;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn fail_next_publish(&mut self) {
        self.sim_fail_next_publish = true;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn publish_count(&self) -> u32 {
        self.sim_publish_count
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn connect_calls(&self) -> u32 {
        self.sim_connect_calls
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, endpoint: &ResolvedBroker, client_id: &str) -> bool {
        use core::fmt::Write;
        use esp_idf_svc::mqtt::client::{EspMqttClient, MqttClientConfiguration};

        let mut url = heapless::String::<80>::new();
        let _ = write!(url, "mqtt://{}:{}", endpoint.host, endpoint.port);

        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            ..Default::default()
        };

        // The ESP-IDF client enforces its own bounded network timeout,
        // so a dead endpoint fails the handshake rather than hanging.
        match EspMqttClient::new_cb(&url, &conf, |_| {}) {
            Ok(client) => {
                self.client = Some(client);
                true
            }
            Err(e) => {
                warn!("MQTT: connect to {} failed: {}", url, e);
                false
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, endpoint: &ResolvedBroker, client_id: &str) -> bool {
        self.sim_connect_calls += 1;
        info!(
            "MQTT(sim): connect #{} to {}:{} as {}",
            self.sim_connect_calls, endpoint.host, endpoint.port, client_id
        );
        if self.sim_connect_failures > 0 {
            self.sim_connect_failures -= 1;
            return false;
        }
        true
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &str) -> bool {
        use esp_idf_svc::mqtt::client::QoS;

        let Some(client) = self.client.as_mut() else {
            return false;
        };
        // enqueue() is non-blocking; QoS 0 means the payload is gone if
        // the transport drops it.
        client
            .enqueue(topic, QoS::AtMostOnce, false, payload.as_bytes())
            .is_ok()
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &str) -> bool {
        if self.sim_fail_next_publish {
            self.sim_fail_next_publish = false;
            return false;
        }
        self.sim_publish_count += 1;
        info!("MQTT(sim): publish #{} {} <- {}", self.sim_publish_count, topic, payload);
        true
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        // Dropping the client tears down the session.
        self.client = None;
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("MQTT(sim): disconnected");
    }
}

impl BrokerPort for MqttBrokerAdapter {
    fn connect(&mut self, endpoint: &ResolvedBroker, client_id: &str) -> ConnectionState {
        // Idempotent: already connected to this endpoint is a no-op.
        if self.state == ConnectionState::Connected && self.endpoint.as_ref() == Some(endpoint) {
            return ConnectionState::Connected;
        }
        // Switching endpoints tears the old session down first.
        if self.state == ConnectionState::Connected {
            self.disconnect();
        }

        self.state = ConnectionState::Connecting;
        if self.platform_connect(endpoint, client_id) {
            self.endpoint = Some(endpoint.clone());
            self.state = ConnectionState::Connected;
        } else {
            self.endpoint = None;
            self.state = ConnectionState::Failed;
        }
        self.state
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), BrokerError> {
        if self.state != ConnectionState::Connected {
            return Err(BrokerError::NotConnected);
        }
        if self.platform_publish(topic, payload) {
            Ok(())
        } else {
            // Payload is dropped; only connect/disconnect leave Failed.
            self.state = ConnectionState::Failed;
            Err(BrokerError::PublishFailed)
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.endpoint = None;
        self.state = ConnectionState::Disconnected;
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}
