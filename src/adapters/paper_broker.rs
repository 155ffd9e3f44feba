//! In-memory broker for offline replays.
//!
//! Tracks target weights only; fills, cash and slippage are not modelled.

use crate::domain::error::FundscreenError;
use crate::domain::targets::PortfolioTarget;
use crate::ports::broker_port::BrokerPort;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct PaperBroker {
    holdings: BTreeMap<String, f64>,
    commits: usize,
    liquidations: usize,
}

impl PaperBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holdings(&self) -> &BTreeMap<String, f64> {
        &self.holdings
    }

    pub fn weight(&self, symbol: &str) -> f64 {
        self.holdings.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn liquidation_count(&self) -> usize {
        self.liquidations
    }
}

impl BrokerPort for PaperBroker {
    /// Listed symbols move to their target weight; unlisted holdings are
    /// left alone.
    fn commit_targets(&mut self, targets: &[PortfolioTarget]) -> Result<(), FundscreenError> {
        for target in targets {
            if !target.weight.is_finite() || target.weight < 0.0 {
                return Err(FundscreenError::Broker {
                    action: format!("set holdings for {}", target.symbol),
                    reason: format!("invalid weight {}", target.weight),
                });
            }
        }
        for target in targets {
            if target.weight == 0.0 {
                self.holdings.remove(&target.symbol);
            } else {
                self.holdings.insert(target.symbol.clone(), target.weight);
            }
        }
        self.commits += 1;
        Ok(())
    }

    fn liquidate(&mut self, symbol: &str) -> Result<(), FundscreenError> {
        self.holdings.remove(symbol);
        self.liquidations += 1;
        Ok(())
    }

    fn is_invested(&self, symbol: &str) -> bool {
        self.holdings.contains_key(symbol)
    }
}
