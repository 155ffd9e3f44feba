//! Rebalance clock shared by the coarse and fine stages.

use chrono::{NaiveDateTime, TimeDelta};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceClock {
    next_rebalance: NaiveDateTime,
    interval: TimeDelta,
}

impl RebalanceClock {
    /// An interval too large for `TimeDelta` saturates to the maximum span.
    pub fn new(start: NaiveDateTime, interval_days: i64) -> Self {
        RebalanceClock {
            next_rebalance: start,
            interval: TimeDelta::try_days(interval_days).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn next_rebalance(&self) -> NaiveDateTime {
        self.next_rebalance
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.next_rebalance
    }

    /// Schedules the next rebalance one interval after `now`. Past the end of
    /// the representable calendar the clock never comes due again.
    pub fn advance(&mut self, now: NaiveDateTime) {
        self.next_rebalance = now.checked_add_signed(self.interval).unwrap_or_else(|| {
            warn!(%now, "next rebalance falls outside the calendar; no further rebalances");
            NaiveDateTime::MAX
        });
    }
}
