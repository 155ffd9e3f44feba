//! CSV directory data adapter.
//!
//! Layout:
//!
//! ```text
//! <base>/fundamentals.csv   date,symbol,market_cap,dollar_volume,price,has_fundamental_data,
//!                           revenue_growth_1y,revenue_growth_3m,pe_ratio,debt_to_equity
//! <base>/prices/<SYMBOL>.csv  date,open,high,low,close,volume
//! ```
//!
//! Empty ratio cells in `fundamentals.csv` are read as missing values.
//! Everything is loaded once up front.

use crate::domain::config::Resolution;
use crate::domain::error::FundscreenError;
use crate::domain::ohlcv::{OhlcvBar, closes};
use crate::domain::security::{Candidate, FineCandidate};
use crate::domain::universe::DataSlice;
use crate::ports::data_port::DataPort;
use crate::ports::history_port::HistoryPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
struct FundamentalRow {
    symbol: String,
    market_cap: f64,
    dollar_volume: f64,
    price: f64,
    has_fundamental_data: bool,
    revenue_growth_1y: Option<f64>,
    revenue_growth_3m: Option<f64>,
    pe_ratio: Option<f64>,
    debt_to_equity: Option<f64>,
}

impl FundamentalRow {
    fn candidate(&self) -> Candidate {
        Candidate {
            symbol: self.symbol.clone(),
            market_cap: self.market_cap,
            dollar_volume: self.dollar_volume,
            price: self.price,
            has_fundamental_data: self.has_fundamental_data,
        }
    }

    fn fine_candidate(&self) -> FineCandidate {
        FineCandidate {
            symbol: self.symbol.clone(),
            market_cap: self.market_cap,
            price: self.price,
            revenue_growth_1y: self.revenue_growth_1y,
            revenue_growth_3m: self.revenue_growth_3m,
            pe_ratio: self.pe_ratio,
            debt_to_equity: self.debt_to_equity,
        }
    }
}

pub struct CsvAdapter {
    base_path: PathBuf,
    fundamentals: BTreeMap<NaiveDate, Vec<FundamentalRow>>,
    bars: HashMap<String, Vec<OhlcvBar>>,
}

impl CsvAdapter {
    pub fn load<P: AsRef<Path>>(base_path: P) -> Result<Self, FundscreenError> {
        let base_path = base_path.as_ref().to_path_buf();
        let fundamentals = read_fundamentals(&base_path.join("fundamentals.csv"))?;
        let bars = read_price_dir(&base_path.join("prices"))?;
        debug!(
            path = %base_path.display(),
            dates = fundamentals.len(),
            symbols = bars.len(),
            "loaded csv data"
        );
        Ok(Self {
            base_path,
            fundamentals,
            bars,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

fn data_err(reason: String) -> FundscreenError {
    FundscreenError::Data { reason }
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, FundscreenError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| data_err(format!("missing {name} column")))
}

fn parse_date(value: &str) -> Result<NaiveDate, FundscreenError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| data_err(format!("invalid date '{value}': {e}")))
}

fn parse_f64(value: &str, name: &str) -> Result<f64, FundscreenError> {
    value
        .parse()
        .map_err(|e| data_err(format!("invalid {name} value '{value}': {e}")))
}

fn parse_optional(value: &str, name: &str) -> Result<Option<f64>, FundscreenError> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    parse_f64(value, name).map(Some)
}

fn parse_flag(value: &str) -> Result<bool, FundscreenError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(data_err(format!("invalid has_fundamental_data value '{other}'"))),
    }
}

fn read_fundamentals(path: &Path) -> Result<BTreeMap<NaiveDate, Vec<FundamentalRow>>, FundscreenError> {
    let content = fs::read_to_string(path)
        .map_err(|e| data_err(format!("failed to read {}: {}", path.display(), e)))?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut by_date: BTreeMap<NaiveDate, Vec<FundamentalRow>> = BTreeMap::new();

    for result in rdr.records() {
        let record = result.map_err(|e| data_err(format!("CSV parse error: {}", e)))?;

        let date = parse_date(field(&record, 0, "date")?)?;
        let symbol = field(&record, 1, "symbol")?.to_uppercase();
        if symbol.is_empty() {
            return Err(data_err(format!("empty symbol on {date}")));
        }

        let row = FundamentalRow {
            symbol,
            market_cap: parse_f64(field(&record, 2, "market_cap")?, "market_cap")?,
            dollar_volume: parse_f64(field(&record, 3, "dollar_volume")?, "dollar_volume")?,
            price: parse_f64(field(&record, 4, "price")?, "price")?,
            has_fundamental_data: parse_flag(field(&record, 5, "has_fundamental_data")?)?,
            revenue_growth_1y: parse_optional(field(&record, 6, "revenue_growth_1y")?, "revenue_growth_1y")?,
            revenue_growth_3m: parse_optional(field(&record, 7, "revenue_growth_3m")?, "revenue_growth_3m")?,
            pe_ratio: parse_optional(field(&record, 8, "pe_ratio")?, "pe_ratio")?,
            debt_to_equity: parse_optional(field(&record, 9, "debt_to_equity")?, "debt_to_equity")?,
        };
        by_date.entry(date).or_default().push(row);
    }

    Ok(by_date)
}

fn read_price_dir(dir: &Path) -> Result<HashMap<String, Vec<OhlcvBar>>, FundscreenError> {
    let mut bars = HashMap::new();
    if !dir.exists() {
        return Ok(bars);
    }

    let entries = fs::read_dir(dir)
        .map_err(|e| data_err(format!("failed to read directory {}: {}", dir.display(), e)))?;

    for entry in entries {
        let entry = entry.map_err(|e| data_err(format!("directory entry error: {}", e)))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let symbol = stem.to_uppercase();
        let series = read_bars(&path, &symbol)?;
        bars.insert(symbol, series);
    }

    Ok(bars)
}

fn read_bars(path: &Path, symbol: &str) -> Result<Vec<OhlcvBar>, FundscreenError> {
    let content = fs::read_to_string(path)
        .map_err(|e| data_err(format!("failed to read {}: {}", path.display(), e)))?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| data_err(format!("CSV parse error: {}", e)))?;
        let volume_str = field(&record, 5, "volume")?;
        bars.push(OhlcvBar {
            symbol: symbol.to_string(),
            date: parse_date(field(&record, 0, "date")?)?,
            open: parse_f64(field(&record, 1, "open")?, "open")?,
            high: parse_f64(field(&record, 2, "high")?, "high")?,
            low: parse_f64(field(&record, 3, "low")?, "low")?,
            close: parse_f64(field(&record, 4, "close")?, "close")?,
            volume: volume_str
                .parse()
                .map_err(|e| data_err(format!("invalid volume value '{volume_str}': {e}")))?,
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

impl DataPort for CsvAdapter {
    fn coarse_candidates(&self, date: NaiveDate) -> Result<Vec<Candidate>, FundscreenError> {
        Ok(self
            .fundamentals
            .get(&date)
            .map(|rows| rows.iter().map(FundamentalRow::candidate).collect())
            .unwrap_or_default())
    }

    fn fine_candidates(
        &self,
        date: NaiveDate,
        symbols: &[String],
    ) -> Result<Vec<FineCandidate>, FundscreenError> {
        let wanted: HashSet<&str> = symbols.iter().map(String::as_str).collect();
        Ok(self
            .fundamentals
            .get(&date)
            .map(|rows| {
                rows.iter()
                    .filter(|r| wanted.contains(r.symbol.as_str()))
                    .map(FundamentalRow::fine_candidate)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn data_slice(&self, date: NaiveDate) -> Result<DataSlice, FundscreenError> {
        Ok(DataSlice::new(
            self.bars
                .iter()
                .filter(|(_, series)| series.binary_search_by_key(&date, |b| b.date).is_ok())
                .map(|(symbol, _)| symbol.clone()),
        ))
    }

    fn trading_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, FundscreenError> {
        if start > end {
            return Ok(Vec::new());
        }
        let mut days: BTreeSet<NaiveDate> = self.fundamentals.range(start..=end).map(|(d, _)| *d).collect();
        days.extend(
            self.bars
                .values()
                .flat_map(|series| series.iter().map(|b| b.date))
                .filter(|d| *d >= start && *d <= end),
        );
        Ok(days.into_iter().collect())
    }
}

impl HistoryPort for CsvAdapter {
    fn history(
        &self,
        symbols: &[String],
        bar_count: usize,
        resolution: Resolution,
        end: NaiveDateTime,
    ) -> Result<HashMap<String, Vec<f64>>, FundscreenError> {
        if resolution != Resolution::Daily {
            return Err(FundscreenError::History {
                reason: format!("csv data has daily bars only, {resolution} requested"),
            });
        }

        let cutoff = end.date();
        let mut out = HashMap::new();
        for symbol in symbols {
            let Some(series) = self.bars.get(symbol) else {
                continue;
            };
            let before = series.partition_point(|b| b.date < cutoff);
            let window = &series[before.saturating_sub(bar_count)..before];
            if !window.is_empty() {
                out.insert(symbol.clone(), closes(window));
            }
        }
        Ok(out)
    }
}
