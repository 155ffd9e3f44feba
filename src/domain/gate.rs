//! Rebalance gate.
//!
//! Holds the pending target set between a membership change and the first
//! data tick that can carry it out. While PENDING, each tick checks every
//! active symbol for a bar:
//!
//! - during warm-up, any missing symbol aborts the tick (no prune, no commit)
//! - after warm-up, missing symbols are left out of this commit only
//!
//! A successful commit clears the targets and resets the warm-up counter, so
//! there is at most one commit per PENDING episode.

use crate::domain::targets::{PortfolioTarget, equal_weight};
use crate::domain::universe::DataSlice;
use crate::ports::broker_port::BrokerPort;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Pending,
}

/// Counts incomplete ticks tolerated in the current PENDING episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WarmupCounter {
    ticks: u32,
}

impl WarmupCounter {
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Consumes one grace tick if any remain.
    pub fn tolerate(&mut self, grace: u32) -> bool {
        if self.ticks < grace {
            self.ticks += 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.ticks = 0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Idle,
    /// Warm-up tick with missing data; retry next tick.
    Waiting { missing: Vec<String> },
    Committed {
        targets: Vec<PortfolioTarget>,
        pruned: Vec<String>,
    },
    /// Nothing left to commit or the broker refused; still PENDING.
    Deferred,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceGate {
    pending: Vec<PortfolioTarget>,
    warmup: WarmupCounter,
    grace_ticks: u32,
}

impl RebalanceGate {
    pub fn new(grace_ticks: u32) -> Self {
        RebalanceGate {
            pending: Vec::new(),
            warmup: WarmupCounter::default(),
            grace_ticks,
        }
    }

    pub fn state(&self) -> GateState {
        if self.pending.is_empty() {
            GateState::Idle
        } else {
            GateState::Pending
        }
    }

    pub fn pending_targets(&self) -> &[PortfolioTarget] {
        &self.pending
    }

    pub fn warmup(&self) -> WarmupCounter {
        self.warmup
    }

    /// Replaces the pending target set. Entering PENDING from IDLE restarts
    /// the warm-up window; an empty set returns the gate to IDLE.
    pub fn arm(&mut self, targets: Vec<PortfolioTarget>) {
        if self.state() == GateState::Idle {
            self.warmup.reset();
        }
        self.pending = targets;
    }

    pub fn on_tick(
        &mut self,
        active: &BTreeSet<String>,
        slice: &DataSlice,
        broker: &mut dyn BrokerPort,
    ) -> TickOutcome {
        if self.state() == GateState::Idle {
            return TickOutcome::Idle;
        }

        let (ready, missing): (Vec<&String>, Vec<&String>) =
            active.iter().partition(|s| slice.contains(s));
        let missing: Vec<String> = missing.into_iter().cloned().collect();

        if !missing.is_empty() && self.warmup.tolerate(self.grace_ticks) {
            debug!(
                missing = ?missing,
                warmup_tick = self.warmup.ticks(),
                "waiting for data before rebalancing"
            );
            return TickOutcome::Waiting { missing };
        }

        if ready.is_empty() {
            warn!(active = active.len(), "no active security has data; rebalance deferred");
            return TickOutcome::Deferred;
        }

        let targets = equal_weight(ready);
        if let Err(e) = broker.commit_targets(&targets) {
            warn!(error = %e, "target commit failed; rebalance deferred");
            return TickOutcome::Deferred;
        }

        if !missing.is_empty() {
            info!(pruned = ?missing, "pruned securities without data from rebalance");
        }
        info!(holdings = targets.len(), "rebalanced portfolio");

        self.pending.clear();
        self.warmup.reset();
        TickOutcome::Committed {
            targets,
            pruned: missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::FundscreenError;

    #[derive(Default)]
    struct CommitLog {
        commits: Vec<Vec<PortfolioTarget>>,
        reject: bool,
    }

    impl BrokerPort for CommitLog {
        fn commit_targets(&mut self, targets: &[PortfolioTarget]) -> Result<(), FundscreenError> {
            if self.reject {
                return Err(FundscreenError::Broker {
                    action: "commit targets".into(),
                    reason: "rejected".into(),
                });
            }
            self.commits.push(targets.to_vec());
            Ok(())
        }

        fn liquidate(&mut self, _symbol: &str) -> Result<(), FundscreenError> {
            Ok(())
        }

        fn is_invested(&self, _symbol: &str) -> bool {
            false
        }
    }

    fn set(symbols: &[&str]) -> BTreeSet<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    fn armed(active: &BTreeSet<String>) -> RebalanceGate {
        let mut gate = RebalanceGate::new(2);
        gate.arm(equal_weight(active.iter()));
        gate
    }

    #[test]
    fn warmup_counter_grace() {
        let mut w = WarmupCounter::default();
        assert!(w.tolerate(2));
        assert!(w.tolerate(2));
        assert!(!w.tolerate(2));
        assert_eq!(w.ticks(), 2);
        w.reset();
        assert_eq!(w.ticks(), 0);
        assert!(!w.tolerate(0));
    }

    #[test]
    fn idle_gate_ignores_ticks() {
        let mut gate = RebalanceGate::new(2);
        let mut broker = CommitLog::default();
        let out = gate.on_tick(&set(&["A"]), &DataSlice::new(["A"]), &mut broker);
        assert_eq!(out, TickOutcome::Idle);
        assert!(broker.commits.is_empty());
    }

    #[test]
    fn complete_data_commits_immediately() {
        let active = set(&["A", "B"]);
        let mut gate = armed(&active);
        let mut broker = CommitLog::default();

        let out = gate.on_tick(&active, &DataSlice::new(["A", "B"]), &mut broker);

        assert!(matches!(out, TickOutcome::Committed { ref pruned, .. } if pruned.is_empty()));
        assert_eq!(broker.commits.len(), 1);
        assert_eq!(gate.state(), GateState::Idle);
        assert_eq!(gate.warmup().ticks(), 0);
    }

    #[test]
    fn two_grace_ticks_then_prune() {
        let active = set(&["A", "B", "C"]);
        let mut gate = armed(&active);
        let mut broker = CommitLog::default();
        let slice = DataSlice::new(["A", "B"]);

        let first = gate.on_tick(&active, &slice, &mut broker);
        assert_eq!(first, TickOutcome::Waiting { missing: vec!["C".into()] });
        let second = gate.on_tick(&active, &slice, &mut broker);
        assert_eq!(second, TickOutcome::Waiting { missing: vec!["C".into()] });
        assert!(broker.commits.is_empty());

        let third = gate.on_tick(&active, &slice, &mut broker);
        match third {
            TickOutcome::Committed { targets, pruned } => {
                assert_eq!(pruned, vec!["C".to_string()]);
                assert_eq!(targets.len(), 2);
                assert!(targets.iter().all(|t| (t.weight - 0.5).abs() < 1e-12));
            }
            other => panic!("expected commit, got {other:?}"),
        }
        assert_eq!(broker.commits.len(), 1);
    }

    #[test]
    fn commits_at_most_once_per_episode() {
        let active = set(&["A"]);
        let mut gate = armed(&active);
        let mut broker = CommitLog::default();
        let slice = DataSlice::new(["A"]);

        gate.on_tick(&active, &slice, &mut broker);
        gate.on_tick(&active, &slice, &mut broker);
        gate.on_tick(&active, &slice, &mut broker);

        assert_eq!(broker.commits.len(), 1);
    }

    #[test]
    fn rearming_while_pending_keeps_warmup_progress() {
        let active = set(&["A", "B"]);
        let mut gate = armed(&active);
        let mut broker = CommitLog::default();

        gate.on_tick(&active, &DataSlice::new(["A"]), &mut broker);
        assert_eq!(gate.warmup().ticks(), 1);

        gate.arm(equal_weight(active.iter()));
        assert_eq!(gate.warmup().ticks(), 1);
    }

    #[test]
    fn arming_with_empty_targets_goes_idle() {
        let mut gate = armed(&set(&["A"]));
        assert_eq!(gate.state(), GateState::Pending);
        gate.arm(Vec::new());
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn nothing_ready_after_warmup_defers() {
        let active = set(&["A"]);
        let mut gate = RebalanceGate::new(0);
        gate.arm(equal_weight(active.iter()));
        let mut broker = CommitLog::default();

        let out = gate.on_tick(&active, &DataSlice::default(), &mut broker);

        assert_eq!(out, TickOutcome::Deferred);
        assert_eq!(gate.state(), GateState::Pending);
        assert!(broker.commits.is_empty());
    }

    #[test]
    fn rejected_commit_stays_pending() {
        let active = set(&["A"]);
        let mut gate = armed(&active);
        let mut broker = CommitLog { reject: true, ..Default::default() };

        let out = gate.on_tick(&active, &DataSlice::new(["A"]), &mut broker);

        assert_eq!(out, TickOutcome::Deferred);
        assert_eq!(gate.state(), GateState::Pending);
    }
}
