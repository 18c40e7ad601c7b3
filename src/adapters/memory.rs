//! Free-heap metric adapter.
//!
//! - **`target_os = "espidf"`** — wraps `esp_get_free_heap_size()`.
//! - **all other targets** — a settable value for host-side tests.

use crate::app::ports::MemoryPort;

/// Heap monitor for the ESP32 platform.
pub struct HeapMonitorAdapter {
    #[cfg(not(target_os = "espidf"))]
    sim_free_bytes: u32,
}

impl Default for HeapMonitorAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapMonitorAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim_free_bytes: 64 * 1024,
        }
    }

    /// Simulation control: set the value the next sample will report.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_free_bytes(&mut self, bytes: u32) {
        self.sim_free_bytes = bytes;
    }
}

impl MemoryPort for HeapMonitorAdapter {
    #[cfg(target_os = "espidf")]
    fn free_bytes(&self) -> u32 {
        unsafe { esp_idf_svc::sys::esp_get_free_heap_size() }
    }

    #[cfg(not(target_os = "espidf"))]
    fn free_bytes(&self) -> u32 {
        self.sim_free_bytes
    }
}
