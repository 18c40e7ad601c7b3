//! Real-time clock adapter.
//!
//! - **`target_os = "espidf"`** — starts SNTP on the first sync attempt
//!   and then checks the system wall clock via `gettimeofday`, rejecting
//!   obviously-unsynced values (pre-2020). Formats `HH:MM:SS` through
//!   `localtime_r`.
//! - **all other targets** — a manually drivable clock for host tests.
//!
//! Once synchronized the clock is assumed correct for the device's
//! operating lifetime; the service stops calling [`try_sync`] after the
//! first success and no drift correction is modelled.
//!
//! [`try_sync`]: crate::app::ports::ClockPort::try_sync

use crate::app::ports::{ClockPort, ClockStatus, TIME_STR_CAP};

/// Reject wall-clock values before 2020-01-01 as "not yet synced".
#[cfg(target_os = "espidf")]
const EPOCH_2020: i64 = 1_577_836_800;

/// RTC adapter for the ESP32 platform.
pub struct RtcAdapter {
    status: ClockStatus,
    #[cfg(target_os = "espidf")]
    sntp: Option<esp_idf_svc::sntp::EspSntp<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim_will_sync: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_hms: (u8, u8, u8),
}

impl Default for RtcAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl RtcAdapter {
    pub fn new() -> Self {
        Self {
            status: ClockStatus::Unsynchronized,
            #[cfg(target_os = "espidf")]
            sntp: None,
            #[cfg(not(target_os = "espidf"))]
            sim_will_sync: false,
            #[cfg(not(target_os = "espidf"))]
            sim_hms: (0, 0, 0),
        }
    }

    /// Simulation control: make the next `try_sync` succeed.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_will_sync(&mut self, will_sync: bool) {
        self.sim_will_sync = will_sync;
    }

    /// Simulation control: the time reported once synchronized.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_time(&mut self, hour: u8, minute: u8, second: u8) {
        self.sim_hms = (hour, minute, second);
    }

    #[cfg(target_os = "espidf")]
    fn wall_clock_hms(&self) -> Option<(u8, u8, u8)> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        if i64::from(tv.tv_sec) < EPOCH_2020 {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        Some((tm.tm_hour as u8, tm.tm_min as u8, tm.tm_sec as u8))
    }
}

impl ClockPort for RtcAdapter {
    #[cfg(target_os = "espidf")]
    fn try_sync(&mut self, now_ms: u64) -> bool {
        if matches!(self.status, ClockStatus::Synchronized { .. }) {
            return true;
        }
        // SNTP runs in the background once started; each attempt just
        // checks whether it has landed a valid time yet.
        if self.sntp.is_none() {
            match esp_idf_svc::sntp::EspSntp::new_default() {
                Ok(sntp) => self.sntp = Some(sntp),
                Err(e) => {
                    log::warn!("SNTP init failed: {e}");
                    return false;
                }
            }
        }
        if self.wall_clock_hms().is_some() {
            self.status = ClockStatus::Synchronized { synced_at_ms: now_ms };
            return true;
        }
        false
    }

    #[cfg(not(target_os = "espidf"))]
    fn try_sync(&mut self, now_ms: u64) -> bool {
        if matches!(self.status, ClockStatus::Synchronized { .. }) {
            return true;
        }
        if self.sim_will_sync {
            self.status = ClockStatus::Synchronized { synced_at_ms: now_ms };
            return true;
        }
        false
    }

    fn status(&self) -> ClockStatus {
        self.status
    }

    fn time_string(&self, default: &str) -> heapless::String<TIME_STR_CAP> {
        let mut out = heapless::String::new();

        if matches!(self.status, ClockStatus::Synchronized { .. }) {
            #[cfg(target_os = "espidf")]
            let hms = self.wall_clock_hms();
            #[cfg(not(target_os = "espidf"))]
            let hms = Some(self.sim_hms);

            if let Some((h, m, s)) = hms {
                use core::fmt::Write;
                let _ = write!(out, "{h:02}:{m:02}:{s:02}");
                return out;
            }
        }

        let _ = out.push_str(default);
        out
    }
}
