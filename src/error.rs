//! Unified error types for the BeaconLink firmware.
//!
//! Follows embedded best practice: a single `Error` enum that every subsystem
//! can convert into, keeping the top-level control loop's error handling
//! uniform. All variants are `Copy` so they can be cheaply threaded through
//! the state machine without allocation.
//!
//! Two conditions from the failure taxonomy are deliberately *not* errors:
//! a discovery miss is an `Ok(None)` search result, and an unsynchronized
//! clock is a degraded-but-normal state. Nothing here is fatal — the device
//! keeps attempting recovery indefinitely.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The discovery subsystem failed at the transport level.
    Discovery(DiscoveryError),
    /// A broker connection or publish operation failed.
    Broker(BrokerError),
    /// Network join (WiFi station) failed.
    Connectivity(ConnectivityError),
    /// Configuration is invalid.
    Config(&'static str),
    /// Peripheral or subsystem initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery(e) => write!(f, "discovery: {e}"),
            Self::Broker(e) => write!(f, "broker: {e}"),
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Transport-level discovery failures. "No broker found this cycle" is not
/// among them: a miss is reported as an empty search result and retried on
/// the next cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The mDNS stack could not be initialised.
    InitFailed,
    /// The outbound query could not be sent.
    QuerySendFailed,
    /// The underlying socket reported an error while awaiting answers.
    SocketError,
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => write!(f, "mDNS init failed"),
            Self::QuerySendFailed => write!(f, "query send failed"),
            Self::SocketError => write!(f, "socket error"),
        }
    }
}

impl From<DiscoveryError> for Error {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Broker errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerError {
    /// `publish` was called without a live connection. The payload is
    /// dropped immediately; reconnection policy belongs to the controller.
    NotConnected,
    /// The TCP/MQTT connect handshake failed or timed out.
    ConnectFailed,
    /// The transport dropped the payload mid-publish.
    PublishFailed,
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::PublishFailed => write!(f, "publish failed"),
        }
    }
}

impl From<BrokerError> for Error {
    fn from(e: BrokerError) -> Self {
        Self::Broker(e)
    }
}

// ---------------------------------------------------------------------------
// Connectivity errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    /// No credentials are configured.
    NoCredentials,
    /// SSID failed validation (1-32 printable ASCII bytes).
    InvalidSsid,
    /// Password failed validation (8-64 bytes for WPA2, or empty for open).
    InvalidPassword,
    /// The join attempt failed; the adapter will back off and retry.
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid"),
            Self::InvalidPassword => write!(f, "password invalid"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
