use crate::config::RepairConfig;
use serde::{Deserialize, Serialize};

/// Timer for periodic repairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicSchedule {
    pub enabled: bool,
    pub interval_ms: u64,
    pub only_when_closed: bool,
    pub next_fire_at: u64,
}

impl PeriodicSchedule {
    pub fn new(config: &RepairConfig, start_ms: u64) -> Self {
        let interval_ms = config.interval_ms();
        Self {
            enabled: config.periodic_enabled,
            interval_ms,
            only_when_closed: config.periodic_only_when_closed,
            next_fire_at: start_ms.saturating_add(interval_ms),
        }
    }

    /// Returns true when the schedule fires at `now`.
    ///
    /// A fire always advances `next_fire_at` by one interval, whether or not
    /// the caller goes on to start a run. If the host stalled for longer than
    /// an interval the deadline is resynced to `now + interval` instead of
    /// firing once per missed interval.
    pub fn poll(&mut self, now: u64) -> bool {
        if !self.enabled || now < self.next_fire_at {
            return false;
        }

        self.next_fire_at = self.next_fire_at.saturating_add(self.interval_ms);
        if self.next_fire_at <= now {
            self.next_fire_at = now.saturating_add(self.interval_ms);
        }
        true
    }
}
