//! Liveness monitor
//!
//! There is no "window closed" signal between browser contexts. A window is
//! alive for as long as it keeps refreshing its descriptor; one that has
//! not refreshed within the liveness deadline is dead and any surviving
//! window may evict it.

/// Tick schedule and expiry predicate.
#[derive(Clone, Debug)]
pub struct LivenessMonitor {
    tick_interval_ms: u64,
    deadline_ms: u64,
    last_tick_ms: Option<u64>,
}

impl LivenessMonitor {
    /// Create an unarmed monitor. `deadline_ms` is normally a multiple of
    /// the interval.
    pub fn new(tick_interval_ms: u64, deadline_ms: u64) -> Self {
        Self {
            tick_interval_ms,
            deadline_ms,
            last_tick_ms: None,
        }
    }

    /// Start the schedule; the next tick is due one interval after `now`.
    pub fn arm(&mut self, now: u64) {
        self.last_tick_ms = Some(now);
    }

    /// Stop the schedule. Nothing is due until re-armed.
    pub fn disarm(&mut self) {
        self.last_tick_ms = None;
    }

    pub fn is_armed(&self) -> bool {
        self.last_tick_ms.is_some()
    }

    /// Whether a tick is due at `now`. Never due while unarmed.
    pub fn is_due(&self, now: u64) -> bool {
        match self.last_tick_ms {
            Some(last) => now.saturating_sub(last) >= self.tick_interval_ms,
            None => false,
        }
    }

    pub fn record_tick(&mut self, now: u64) {
        self.last_tick_ms = Some(now);
    }

    /// Whether a descriptor last refreshed at `last_seen` is dead at `now`.
    ///
    /// A stamp in the future (clock skew between windows) is never expired.
    pub fn is_expired(&self, last_seen: u64, now: u64) -> bool {
        now.saturating_sub(last_seen) > self.deadline_ms
    }
}
