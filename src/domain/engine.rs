//! Selection engine: the four host callbacks over one owned state.
//!
//! The host calls these strictly one after another. Change notifications for
//! a rebalance are expected before the data ticks that act on them; if that
//! order is broken the gate works from stale membership.

use crate::domain::clock::RebalanceClock;
use crate::domain::coarse::select_coarse;
use crate::domain::config::SelectionConfig;
use crate::domain::fine::select_fine;
use crate::domain::gate::{GateState, RebalanceGate, TickOutcome};
use crate::domain::reconciler::{Reconciliation, reconcile};
use crate::domain::security::{Candidate, FineCandidate};
use crate::domain::targets::PortfolioTarget;
use crate::domain::universe::{DataSlice, SecurityChanges, UniverseSelection};
use crate::ports::broker_port::BrokerPort;
use crate::ports::history_port::HistoryPort;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct SelectionEngine {
    config: SelectionConfig,
    active: BTreeSet<String>,
    clock: RebalanceClock,
    gate: RebalanceGate,
}

impl SelectionEngine {
    pub fn new(config: SelectionConfig, start: NaiveDateTime) -> Self {
        let clock = RebalanceClock::new(start, config.rebalance.rebalance_days);
        let gate = RebalanceGate::new(config.rebalance.warmup_ticks);
        SelectionEngine {
            config,
            active: BTreeSet::new(),
            clock,
            gate,
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn active(&self) -> &BTreeSet<String> {
        &self.active
    }

    pub fn next_rebalance(&self) -> NaiveDateTime {
        self.clock.next_rebalance()
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn pending_targets(&self) -> &[PortfolioTarget] {
        self.gate.pending_targets()
    }

    pub fn on_coarse(&self, candidates: &[Candidate], now: NaiveDateTime) -> UniverseSelection {
        select_coarse(candidates, now, &self.clock, &self.config)
    }

    pub fn on_fine(
        &mut self,
        candidates: &[FineCandidate],
        now: NaiveDateTime,
        history: &dyn HistoryPort,
    ) -> UniverseSelection {
        select_fine(
            candidates,
            now,
            &mut self.clock,
            &self.config.universe,
            history,
        )
    }

    pub fn on_securities_changed(
        &mut self,
        changes: &SecurityChanges,
        broker: &mut dyn BrokerPort,
    ) -> Reconciliation {
        let outcome = reconcile(&mut self.active, changes, broker);
        self.gate.arm(outcome.targets.clone());
        outcome
    }

    pub fn on_data(&mut self, slice: &DataSlice, broker: &mut dyn BrokerPort) -> TickOutcome {
        self.gate.on_tick(&self.active, slice, broker)
    }
}
