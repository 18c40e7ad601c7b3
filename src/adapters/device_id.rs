//! Device identity.
//!
//! The MQTT client identifier is the configured prefix with the device's
//! own network address appended (`Arduino192.168.1.42`). Deterministic
//! per address and needs no coordination: two devices can only collide
//! if they hold the same IP, which the network already forbids.
//!
//! The WiFi hostname is derived from the factory MAC instead, since it
//! must exist before DHCP has assigned an address.

/// Fixed-size client ID: prefix (≤16) + IPv4/IPv6 address text.
pub type ClientIdString = heapless::String<64>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Derive the MQTT client identifier from the configured prefix and the
/// device's network address. Same inputs, same identifier, across
/// restarts.
pub fn client_id(prefix: &str, device_addr: &str) -> ClientIdString {
    let mut id = ClientIdString::new();
    let _ = id.push_str(prefix);
    let _ = id.push_str(device_addr);
    id
}

/// Derive the WiFi hostname from the last 3 MAC bytes.
/// Format: `beaconlink-xxyyzz` (lowercase).
pub fn hostname(mac: &MacAddress) -> heapless::String<24> {
    let mut name = heapless::String::<24>::new();
    use core::fmt::Write;
    let _ = write!(name, "beaconlink-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}
