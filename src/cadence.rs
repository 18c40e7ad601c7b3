//! Fixed-interval cadence timers.
//!
//! The four periodic activities (search, publish, RTC sync, monitoring)
//! each own a [`Cadence`] and are polled from the single control loop —
//! no hardware timers, no ISRs. A cadence that is not polled simply does
//! not fire; there is no catch-up for missed intervals.
//!
//! The retry spacing is deliberately pluggable: the state machine only
//! sees a [`RetryPolicy`], so swapping the fixed interval for exponential
//! backoff would not touch any transition logic.

/// How long to wait before the next attempt, given how many consecutive
/// attempts have already failed.
pub trait RetryPolicy {
    /// Delay before attempt `attempt` (0-based), in milliseconds.
    fn delay_ms(&self, attempt: u32) -> u32;
}

/// Constant spacing between attempts — the policy every interval in the
/// device configuration maps to.
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    pub interval_ms: u32,
}

impl FixedInterval {
    pub const fn new(interval_ms: u32) -> Self {
        Self { interval_ms }
    }
}

impl RetryPolicy for FixedInterval {
    fn delay_ms(&self, _attempt: u32) -> u32 {
        self.interval_ms
    }
}

/// A poll-driven periodic timer.
///
/// `due()` answers "has the interval elapsed since the last fire", and
/// `fire()` stamps the fire time. Keeping the two separate lets the
/// caller check without consuming (the FSM decides, the service fires).
#[derive(Debug, Clone)]
pub struct Cadence<P: RetryPolicy = FixedInterval> {
    policy: P,
    /// Time of the last fire, `None` until the first one.
    last_fired_ms: Option<u64>,
    /// Consecutive attempts since the last `reset()`.
    attempts: u32,
}

impl<P: RetryPolicy> Cadence<P> {
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            last_fired_ms: None,
            attempts: 0,
        }
    }

    /// Whether the cadence should fire at `now_ms`. A cadence that has
    /// never fired is due immediately.
    pub fn due(&self, now_ms: u64) -> bool {
        match self.last_fired_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= u64::from(self.policy.delay_ms(self.attempts)),
        }
    }

    /// Record a fire at `now_ms` and bump the attempt counter.
    pub fn fire(&mut self, now_ms: u64) {
        self.last_fired_ms = Some(now_ms);
        self.attempts = self.attempts.saturating_add(1);
    }

    /// Clear the attempt counter (e.g. after a success) without touching
    /// the fire timestamp — the next `due()` still honours the interval.
    pub fn reset_attempts(&mut self) {
        self.attempts = 0;
    }

    /// Forget all history; the cadence becomes due immediately.
    pub fn rearm(&mut self) {
        self.last_fired_ms = None;
        self.attempts = 0;
    }
}

impl Cadence<FixedInterval> {
    /// Convenience constructor for the common fixed-interval case.
    pub fn fixed(interval_ms: u32) -> Self {
        Self::new(FixedInterval::new(interval_ms))
    }
}
