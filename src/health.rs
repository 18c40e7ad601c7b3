//! Low-memory supervisor.
//!
//! Samples the free-heap metric on the (slow) monitoring cadence and
//! compares it against the configured floor. Purely advisory: the result
//! is reported through the event sink and never alters connection state
//! or publishing. Edge-triggered so the hour-scale production cadence
//! cannot flood the log with repeats of the same condition.

/// Result of one monitoring sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Ok,
    /// Free heap is below the configured threshold.
    Low,
}

/// Tracks the free-memory condition across samples.
pub struct HealthMonitor {
    threshold_bytes: u32,
    last_status: HealthStatus,
}

impl HealthMonitor {
    pub fn new(threshold_bytes: u32) -> Self {
        Self {
            threshold_bytes,
            last_status: HealthStatus::Ok,
        }
    }

    /// Classify a free-heap reading.
    pub fn sample(&mut self, free_bytes: u32) -> HealthStatus {
        let status = if free_bytes < self.threshold_bytes {
            HealthStatus::Low
        } else {
            HealthStatus::Ok
        };
        self.last_status = status;
        status
    }

    /// Like [`sample`](Self::sample), but only reports `Low` on the
    /// Ok→Low transition. Re-arms once memory recovers.
    pub fn sample_edge(&mut self, free_bytes: u32) -> Option<HealthStatus> {
        let prev = self.last_status;
        let status = self.sample(free_bytes);
        (status != prev).then_some(status)
    }

    pub fn status(&self) -> HealthStatus {
        self.last_status
    }
}
