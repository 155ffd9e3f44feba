//! Membership reconciler.
//!
//! Applies a host change notification to the active universe, liquidates
//! removed positions that are still held, and rebuilds the equal-weight
//! target set. New positions are never opened here: data for freshly added
//! symbols may not have arrived yet, so entry is left to the rebalance gate.

use crate::domain::targets::{PortfolioTarget, equal_weight};
use crate::domain::universe::SecurityChanges;
use crate::ports::broker_port::BrokerPort;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation {
    /// Rebuilt over the whole active universe.
    pub targets: Vec<PortfolioTarget>,
    pub liquidated: Vec<String>,
    /// Removals for symbols that were not active.
    pub anomalies: Vec<String>,
}

pub fn reconcile(
    active: &mut BTreeSet<String>,
    changes: &SecurityChanges,
    broker: &mut dyn BrokerPort,
) -> Reconciliation {
    let mut outcome = Reconciliation::default();

    for removed in &changes.removed {
        if !active.remove(&removed.symbol) {
            warn!(symbol = %removed.symbol, "removed security was not in the active universe");
            outcome.anomalies.push(removed.symbol.clone());
        }
        if removed.invested {
            match broker.liquidate(&removed.symbol) {
                Ok(()) => {
                    info!(symbol = %removed.symbol, "liquidated removed security");
                    outcome.liquidated.push(removed.symbol.clone());
                }
                Err(e) => warn!(symbol = %removed.symbol, error = %e, "liquidation failed"),
            }
        }
    }

    for added in &changes.added {
        if !active.insert(added.clone()) {
            debug!(symbol = %added, "added security already active");
        }
    }

    outcome.targets = equal_weight(active.iter());
    debug!(
        active = active.len(),
        removed = changes.removed.len(),
        added = changes.added.len(),
        "universe reconciled"
    );
    outcome
}
