//! Fine universe filter and ranker.
//!
//! Stages, in order:
//! 1. revenue growth: one-year and three-month growth defined and above floor
//! 2. valuation: P/E defined and strictly inside (min, max)
//! 3. leverage: debt-to-equity defined and strictly below ceiling
//! 4. trend: price above the mean close of the history window
//! 5. momentum: price above window low * (1 + threshold)
//! 6. rank by market cap, truncate to basket size
//!
//! Every pass that gets past the gate advances the rebalance clock, even one
//! that ends with no survivors. A failed history request empties stages 4-6
//! for that pass only.

use crate::domain::clock::RebalanceClock;
use crate::domain::config::{RankDirection, UniverseConfig};
use crate::domain::security::{FineCandidate, defined};
use crate::domain::universe::UniverseSelection;
use crate::ports::history_port::HistoryPort;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Mean and minimum close over a history window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendStats {
    pub sma: f64,
    pub low: f64,
}

impl TrendStats {
    /// `None` for an empty window.
    pub fn from_closes(closes: &[f64]) -> Option<Self> {
        if closes.is_empty() {
            return None;
        }
        let sma = closes.iter().sum::<f64>() / closes.len() as f64;
        let low = closes.iter().copied().fold(f64::INFINITY, f64::min);
        Some(TrendStats { sma, low })
    }

    pub fn above_sma(&self, price: f64) -> bool {
        price > self.sma
    }

    pub fn clears_low(&self, price: f64, threshold: f64) -> bool {
        price > self.low * (1.0 + threshold)
    }
}

pub fn select_fine(
    candidates: &[FineCandidate],
    now: NaiveDateTime,
    clock: &mut RebalanceClock,
    config: &UniverseConfig,
    history: &dyn HistoryPort,
) -> UniverseSelection {
    if !clock.is_due(now) || candidates.is_empty() {
        return UniverseSelection::Unchanged;
    }

    let screened = fundamental_filter(candidates, config);
    let trending = trend_filter(screened, now, config, history);
    let ranked = rank(trending, config.rank_direction, config.num_stocks);

    let symbols: Vec<String> = ranked.iter().map(|c| c.symbol.clone()).collect();
    info!(%now, selected = symbols.len(), symbols = ?symbols, "fine selection complete");

    clock.advance(now);
    UniverseSelection::Symbols(symbols)
}

/// Growth, valuation and leverage stages.
pub fn fundamental_filter<'a>(
    candidates: &'a [FineCandidate],
    config: &UniverseConfig,
) -> Vec<&'a FineCandidate> {
    let growth: Vec<&FineCandidate> = candidates
        .iter()
        .filter(|c| {
            defined(c.revenue_growth_1y).is_some_and(|g| g > config.revenue_growth_year)
                && defined(c.revenue_growth_3m).is_some_and(|g| g > config.revenue_growth_quarter)
        })
        .collect();
    debug!(count = growth.len(), "after revenue growth filter");

    let valuation: Vec<&FineCandidate> = growth
        .into_iter()
        .filter(|c| {
            defined(c.pe_ratio)
                .is_some_and(|pe| config.pe_ratio_min < pe && pe < config.pe_ratio_max)
        })
        .collect();
    debug!(count = valuation.len(), "after P/E ratio filter");

    let leverage: Vec<&FineCandidate> = valuation
        .into_iter()
        .filter(|c| defined(c.debt_to_equity).is_some_and(|de| de < config.max_debt_to_equity))
        .collect();
    debug!(count = leverage.len(), "after debt to equity filter");

    leverage
}

/// SMA and year-low stages. History is requested once for all candidates.
pub fn trend_filter<'a>(
    candidates: Vec<&'a FineCandidate>,
    now: NaiveDateTime,
    config: &UniverseConfig,
    history: &dyn HistoryPort,
) -> Vec<&'a FineCandidate> {
    if candidates.is_empty() {
        return candidates;
    }

    let symbols: Vec<String> = candidates.iter().map(|c| c.symbol.clone()).collect();
    let closes: HashMap<String, Vec<f64>> =
        match history.history(&symbols, config.history_bars, config.history_resolution, now) {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, requested = symbols.len(), "history request failed; skipping trend stages");
                return Vec::new();
            }
        };

    let with_stats: Vec<(&FineCandidate, TrendStats)> = candidates
        .into_iter()
        .filter_map(|c| {
            let stats = closes
                .get(&c.symbol)
                .and_then(|series| TrendStats::from_closes(series));
            if stats.is_none() {
                debug!(symbol = %c.symbol, "no history returned");
            }
            stats.map(|s| (c, s))
        })
        .collect();

    let above_sma: Vec<(&FineCandidate, TrendStats)> = with_stats
        .into_iter()
        .filter(|(c, stats)| stats.above_sma(c.price))
        .collect();
    debug!(count = above_sma.len(), "after SMA filter");

    let above_low: Vec<&FineCandidate> = above_sma
        .into_iter()
        .filter(|(c, stats)| stats.clears_low(c.price, config.year_low_threshold))
        .map(|(c, _)| c)
        .collect();
    debug!(count = above_low.len(), "after 52-week low filter");

    above_low
}

/// Stable sort by market cap, then keep the first `limit`.
pub fn rank(
    mut candidates: Vec<&FineCandidate>,
    direction: RankDirection,
    limit: usize,
) -> Vec<&FineCandidate> {
    match direction {
        RankDirection::Ascending => {
            candidates.sort_by(|a, b| a.market_cap.total_cmp(&b.market_cap));
        }
        RankDirection::Descending => {
            candidates.sort_by(|a, b| b.market_cap.total_cmp(&a.market_cap));
        }
    }
    candidates.truncate(limit);
    candidates
}
