//! Coarse universe filter.
//!
//! Screens the broad candidate stream on market cap, dollar volume,
//! turnover, price and fundamental-data availability. All comparisons are
//! strict. Runs only when the rebalance clock is due and never advances it.

use crate::domain::clock::RebalanceClock;
use crate::domain::config::{SelectionConfig, UniverseConfig};
use crate::domain::security::Candidate;
use crate::domain::universe::UniverseSelection;
use chrono::NaiveDateTime;
use std::collections::HashSet;
use tracing::{debug, info};

pub fn select_coarse(
    candidates: &[Candidate],
    now: NaiveDateTime,
    clock: &RebalanceClock,
    config: &SelectionConfig,
) -> UniverseSelection {
    if !clock.is_due(now) || candidates.is_empty() {
        return UniverseSelection::Unchanged;
    }

    let scoped: Vec<&Candidate> = match &config.test_symbol {
        Some(symbol) => candidates.iter().filter(|c| &c.symbol == symbol).collect(),
        None => candidates.iter().collect(),
    };

    let survivors = coarse_filter(scoped, &config.universe);
    info!(%now, selected = survivors.len(), "coarse selection complete");
    UniverseSelection::Symbols(survivors)
}

/// Applies the five coarse predicates and collapses duplicate symbols.
pub fn coarse_filter<'a, I>(candidates: I, config: &UniverseConfig) -> Vec<String>
where
    I: IntoIterator<Item = &'a Candidate>,
{
    let stage: Vec<&Candidate> = candidates.into_iter().collect();
    debug!(count = stage.len(), "initial universe");

    let stage: Vec<&Candidate> = stage
        .into_iter()
        .filter(|c| c.market_cap > config.market_cap_floor)
        .collect();
    debug!(count = stage.len(), "after market cap filter");

    let stage: Vec<&Candidate> = stage
        .into_iter()
        .filter(|c| c.dollar_volume > config.volume_floor)
        .collect();
    debug!(count = stage.len(), "after dollar volume filter");

    let stage: Vec<&Candidate> = stage
        .into_iter()
        .filter(|c| c.turnover() > config.turnover_floor)
        .collect();
    debug!(count = stage.len(), "after turnover filter");

    let stage: Vec<&Candidate> = stage
        .into_iter()
        .filter(|c| c.price > config.min_price)
        .collect();
    debug!(count = stage.len(), "after price filter");

    let stage: Vec<&Candidate> = stage
        .into_iter()
        .filter(|c| c.has_fundamental_data)
        .collect();
    debug!(count = stage.len(), "after fundamental data filter");

    let mut seen = HashSet::new();
    stage
        .into_iter()
        .filter(|c| seen.insert(c.symbol.as_str()))
        .map(|c| c.symbol.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn passing(symbol: &str) -> Candidate {
        Candidate {
            symbol: symbol.into(),
            market_cap: 2e9,
            dollar_volume: 5e7,
            price: 50.0,
            has_fundamental_data: true,
        }
    }

    fn config() -> SelectionConfig {
        SelectionConfig::default()
    }

    #[test]
    fn unchanged_before_rebalance_is_due() {
        let clock = RebalanceClock::new(at(2023, 2, 1), 30);
        let result = select_coarse(&[passing("A")], at(2023, 1, 15), &clock, &config());
        assert_eq!(result, UniverseSelection::Unchanged);
    }

    #[test]
    fn unchanged_on_empty_stream() {
        let clock = RebalanceClock::new(at(2023, 1, 1), 30);
        let result = select_coarse(&[], at(2023, 1, 1), &clock, &config());
        assert_eq!(result, UniverseSelection::Unchanged);
    }

    #[test]
    fn keeps_candidates_passing_every_predicate() {
        let clock = RebalanceClock::new(at(2023, 1, 1), 30);
        let result = select_coarse(&[passing("A"), passing("B")], at(2023, 1, 1), &clock, &config());
        assert_eq!(result, UniverseSelection::Symbols(vec!["A".into(), "B".into()]));
    }

    #[test]
    fn market_cap_at_floor_is_excluded() {
        let cfg = UniverseConfig::default();
        let at_floor = Candidate {
            market_cap: cfg.market_cap_floor,
            ..passing("FLOOR")
        };
        assert!(coarse_filter(&[at_floor], &cfg).is_empty());
    }

    #[test]
    fn each_predicate_excludes() {
        let cfg = UniverseConfig::default();
        let low_volume = Candidate { dollar_volume: 1e6, ..passing("VOL") };
        let low_price = Candidate { price: 10.0, ..passing("PX") };
        let no_fundamentals = Candidate { has_fundamental_data: false, ..passing("FUND") };
        let low_turnover = Candidate {
            market_cap: 1e15,
            dollar_volume: 2e6,
            ..passing("TURN")
        };

        let out = coarse_filter(
            &[low_volume, low_price, no_fundamentals, low_turnover, passing("OK")],
            &cfg,
        );
        assert_eq!(out, vec!["OK".to_string()]);
    }

    #[test]
    fn duplicates_collapse_to_one() {
        let cfg = UniverseConfig::default();
        let out = coarse_filter(&[passing("A"), passing("B"), passing("A")], &cfg);
        assert_eq!(out, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn duplicate_failing_copy_does_not_hide_passing_copy() {
        let cfg = UniverseConfig::default();
        let failing = Candidate { price: 1.0, ..passing("A") };
        let out = coarse_filter(&[failing, passing("A")], &cfg);
        assert_eq!(out, vec!["A".to_string()]);
    }

    #[test]
    fn test_symbol_restricts_stream() {
        let clock = RebalanceClock::new(at(2023, 1, 1), 30);
        let cfg = SelectionConfig {
            test_symbol: Some("MSFT".into()),
            ..config()
        };
        let result = select_coarse(
            &[passing("AAPL"), passing("MSFT")],
            at(2023, 1, 1),
            &clock,
            &cfg,
        );
        assert_eq!(result, UniverseSelection::Symbols(vec!["MSFT".into()]));
    }
}
