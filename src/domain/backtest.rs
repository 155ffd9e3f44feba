//! Offline replay host.
//!
//! Drives a [`SelectionEngine`] over a calendar the way a live platform
//! would: coarse then fine selection, a membership diff reported back as a
//! change notification, then one data tick per day.

use crate::domain::engine::SelectionEngine;
use crate::domain::error::FundscreenError;
use crate::domain::gate::TickOutcome;
use crate::domain::targets::PortfolioTarget;
use crate::domain::universe::{UniverseSelection, diff_universe};
use crate::ports::broker_port::BrokerPort;
use crate::ports::data_port::DataPort;
use crate::ports::history_port::HistoryPort;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeSet;
use tracing::info;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
}

impl BacktestConfig {
    pub fn start_time(&self) -> NaiveDateTime {
        self.start_date.and_time(NaiveTime::MIN)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRecord {
    pub date: NaiveDate,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiquidationRecord {
    pub date: NaiveDate,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceRecord {
    pub date: NaiveDate,
    pub targets: Vec<PortfolioTarget>,
    pub pruned: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BacktestResult {
    pub days: usize,
    pub selections: Vec<SelectionRecord>,
    pub liquidations: Vec<LiquidationRecord>,
    pub rebalances: Vec<RebalanceRecord>,
    pub final_universe: Vec<String>,
}

pub fn run_backtest(
    engine: &mut SelectionEngine,
    data: &dyn DataPort,
    history: &dyn HistoryPort,
    broker: &mut dyn BrokerPort,
    config: &BacktestConfig,
) -> Result<BacktestResult, FundscreenError> {
    let calendar = data.trading_days(config.start_date, config.end_date)?;
    let mut host_universe: BTreeSet<String> = BTreeSet::new();
    let mut result = BacktestResult::default();

    for date in calendar {
        let now = date.and_time(NaiveTime::MIN);
        result.days += 1;

        let coarse = data.coarse_candidates(date)?;
        if let UniverseSelection::Symbols(coarse_symbols) = engine.on_coarse(&coarse, now) {
            let fine = data.fine_candidates(date, &coarse_symbols)?;
            if let UniverseSelection::Symbols(selected) = engine.on_fine(&fine, now, history) {
                let changes = diff_universe(&host_universe, &selected, broker);
                host_universe = selected.iter().cloned().collect();
                result.selections.push(SelectionRecord {
                    date,
                    symbols: selected,
                });

                if !changes.is_empty() {
                    let outcome = engine.on_securities_changed(&changes, broker);
                    result
                        .liquidations
                        .extend(outcome.liquidated.into_iter().map(|symbol| LiquidationRecord {
                            date,
                            symbol,
                        }));
                }
            }
        }

        let slice = data.data_slice(date)?;
        if let TickOutcome::Committed { targets, pruned } = engine.on_data(&slice, broker) {
            result.rebalances.push(RebalanceRecord {
                date,
                targets,
                pruned,
            });
        }
    }

    result.final_universe = engine.active().iter().cloned().collect();
    info!(
        days = result.days,
        selections = result.selections.len(),
        rebalances = result.rebalances.len(),
        liquidations = result.liquidations.len(),
        "replay finished"
    );
    Ok(result)
}
