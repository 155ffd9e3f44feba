//! Selection tunables. Immutable once loaded; runtime state lives in
//! [`crate::domain::engine::SelectionEngine`].

use std::fmt;
use std::str::FromStr;

/// Bar resolution for history requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Minute,
    Hour,
    Daily,
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minute" => Ok(Resolution::Minute),
            "hour" => Ok(Resolution::Hour),
            "daily" | "day" => Ok(Resolution::Daily),
            other => Err(format!("unknown resolution '{other}' (expected minute, hour or daily)")),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resolution::Minute => "minute",
            Resolution::Hour => "hour",
            Resolution::Daily => "daily",
        };
        f.write_str(name)
    }
}

/// Market-cap sort order for the final ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDirection {
    Ascending,
    Descending,
}

impl RankDirection {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            RankDirection::Descending
        } else {
            RankDirection::Ascending
        }
    }
}

/// Filter thresholds for the coarse and fine stages.
#[derive(Debug, Clone, PartialEq)]
pub struct UniverseConfig {
    pub market_cap_floor: f64,
    pub volume_floor: f64,
    pub turnover_floor: f64,
    pub min_price: f64,
    pub revenue_growth_year: f64,
    pub revenue_growth_quarter: f64,
    pub pe_ratio_min: f64,
    pub pe_ratio_max: f64,
    pub year_low_threshold: f64,
    pub max_debt_to_equity: f64,
    pub num_stocks: usize,
    pub history_bars: usize,
    pub history_resolution: Resolution,
    pub rank_direction: RankDirection,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        UniverseConfig {
            market_cap_floor: 5e8,
            volume_floor: 1e6,
            turnover_floor: 1e-6,
            min_price: 10.0,
            revenue_growth_year: 0.1,
            revenue_growth_quarter: 0.025,
            pe_ratio_min: 10.0,
            pe_ratio_max: 200.0,
            year_low_threshold: 0.5,
            max_debt_to_equity: 1.5,
            num_stocks: 100,
            history_bars: 252,
            history_resolution: Resolution::Daily,
            rank_direction: RankDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceConfig {
    pub rebalance_days: i64,
    /// Ticks with incomplete data tolerated before pruning.
    pub warmup_ticks: u32,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        RebalanceConfig {
            rebalance_days: 30,
            warmup_ticks: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionConfig {
    pub universe: UniverseConfig,
    pub rebalance: RebalanceConfig,
    /// Restricts the coarse stream to a single symbol when set.
    pub test_symbol: Option<String>,
}
