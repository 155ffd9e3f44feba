#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use fundscreen::domain::config::Resolution;
use fundscreen::domain::error::FundscreenError;
use fundscreen::domain::security::{Candidate, FineCandidate};
use fundscreen::domain::targets::PortfolioTarget;
use fundscreen::domain::universe::DataSlice;
use fundscreen::ports::broker_port::BrokerPort;
use fundscreen::ports::data_port::DataPort;
use fundscreen::ports::history_port::HistoryPort;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(0, 0, 0).unwrap()
}

/// Coarse candidate that clears every default floor.
pub fn liquid(symbol: &str) -> Candidate {
    Candidate {
        symbol: symbol.to_string(),
        market_cap: 2e9,
        dollar_volume: 5e7,
        price: 50.0,
        has_fundamental_data: true,
    }
}

/// Fine candidate that clears every default fundamental floor.
pub fn healthy(symbol: &str, market_cap: f64) -> FineCandidate {
    FineCandidate {
        symbol: symbol.to_string(),
        market_cap,
        price: 100.0,
        revenue_growth_1y: Some(0.3),
        revenue_growth_3m: Some(0.05),
        pe_ratio: Some(25.0),
        debt_to_equity: Some(0.5),
    }
}

/// Scripted close series per symbol, with a call log and an optional failure.
pub struct MockHistoryPort {
    pub series: HashMap<String, Vec<f64>>,
    pub default_series: Option<Vec<f64>>,
    pub fail: bool,
    pub calls: Cell<usize>,
    pub requested: RefCell<Vec<Vec<String>>>,
}

impl MockHistoryPort {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            default_series: None,
            fail: false,
            calls: Cell::new(0),
            requested: RefCell::new(Vec::new()),
        }
    }

    /// Mean 60, low 40: a price of 100 passes both trend stages.
    pub fn rising() -> Self {
        Self::new().with_default(vec![40.0, 60.0, 80.0])
    }

    pub fn with_series(mut self, symbol: &str, closes: Vec<f64>) -> Self {
        self.series.insert(symbol.to_string(), closes);
        self
    }

    pub fn with_default(mut self, closes: Vec<f64>) -> Self {
        self.default_series = Some(closes);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

impl HistoryPort for MockHistoryPort {
    fn history(
        &self,
        symbols: &[String],
        bar_count: usize,
        _resolution: Resolution,
        _end: NaiveDateTime,
    ) -> Result<HashMap<String, Vec<f64>>, FundscreenError> {
        self.calls.set(self.calls.get() + 1);
        self.requested.borrow_mut().push(symbols.to_vec());
        if self.fail {
            return Err(FundscreenError::History {
                reason: "history service unavailable".into(),
            });
        }
        let mut out = HashMap::new();
        for symbol in symbols {
            let series = self
                .series
                .get(symbol)
                .or(self.default_series.as_ref())
                .cloned();
            if let Some(mut closes) = series {
                if closes.len() > bar_count {
                    closes.drain(..closes.len() - bar_count);
                }
                out.insert(symbol.clone(), closes);
            }
        }
        Ok(out)
    }
}

/// Broker that records every call and tracks an invested set.
#[derive(Default)]
pub struct RecordingBroker {
    pub commits: Vec<Vec<PortfolioTarget>>,
    pub liquidations: Vec<String>,
    pub invested: BTreeSet<String>,
    pub reject_commits: bool,
    pub reject_liquidations: bool,
}

impl RecordingBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holding(mut self, symbol: &str) -> Self {
        self.invested.insert(symbol.to_string());
        self
    }
}

impl BrokerPort for RecordingBroker {
    fn commit_targets(&mut self, targets: &[PortfolioTarget]) -> Result<(), FundscreenError> {
        if self.reject_commits {
            return Err(FundscreenError::Broker {
                action: "commit targets".into(),
                reason: "rejected".into(),
            });
        }
        self.commits.push(targets.to_vec());
        for t in targets {
            self.invested.insert(t.symbol.clone());
        }
        Ok(())
    }

    fn liquidate(&mut self, symbol: &str) -> Result<(), FundscreenError> {
        if self.reject_liquidations {
            return Err(FundscreenError::Broker {
                action: format!("liquidate {symbol}"),
                reason: "rejected".into(),
            });
        }
        self.liquidations.push(symbol.to_string());
        self.invested.remove(symbol);
        Ok(())
    }

    fn is_invested(&self, symbol: &str) -> bool {
        self.invested.contains(symbol)
    }
}

/// In-memory replay data keyed by date.
#[derive(Default)]
pub struct MockDataPort {
    pub coarse: BTreeMap<NaiveDate, Vec<Candidate>>,
    pub fine: BTreeMap<NaiveDate, Vec<FineCandidate>>,
    pub slices: BTreeMap<NaiveDate, Vec<String>>,
    pub days: Vec<NaiveDate>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same coarse and fine universe and full data coverage on every day.
    pub fn steady(days: Vec<NaiveDate>, fine: Vec<FineCandidate>) -> Self {
        let mut port = Self::new();
        let symbols: Vec<String> = fine.iter().map(|f| f.symbol.clone()).collect();
        for d in &days {
            port.coarse
                .insert(*d, symbols.iter().map(|s| liquid(s)).collect());
            port.fine.insert(*d, fine.clone());
            port.slices.insert(*d, symbols.clone());
        }
        port.days = days;
        port
    }
}

impl DataPort for MockDataPort {
    fn coarse_candidates(&self, date: NaiveDate) -> Result<Vec<Candidate>, FundscreenError> {
        Ok(self.coarse.get(&date).cloned().unwrap_or_default())
    }

    fn fine_candidates(
        &self,
        date: NaiveDate,
        symbols: &[String],
    ) -> Result<Vec<FineCandidate>, FundscreenError> {
        Ok(self
            .fine
            .get(&date)
            .map(|rows| {
                rows.iter()
                    .filter(|f| symbols.contains(&f.symbol))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn data_slice(&self, date: NaiveDate) -> Result<DataSlice, FundscreenError> {
        Ok(DataSlice::new(
            self.slices.get(&date).cloned().unwrap_or_default(),
        ))
    }

    fn trading_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, FundscreenError> {
        Ok(self
            .days
            .iter()
            .copied()
            .filter(|d| *d >= start && *d <= end)
            .collect())
    }
}
