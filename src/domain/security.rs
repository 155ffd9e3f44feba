//! Per-security records offered by the host at each selection stage.

/// Coarse-stage record: cheap price/volume/size fields for the broad universe.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub symbol: String,
    pub market_cap: f64,
    pub dollar_volume: f64,
    pub price: f64,
    pub has_fundamental_data: bool,
}

impl Candidate {
    /// dollar_volume / market_cap
    pub fn turnover(&self) -> f64 {
        self.dollar_volume / self.market_cap
    }
}

/// Fine-stage record: fundamentals for a coarse survivor.
///
/// Every ratio is optional. A missing ratio fails whichever filter needs it;
/// it is never read as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct FineCandidate {
    pub symbol: String,
    pub market_cap: f64,
    pub price: f64,
    pub revenue_growth_1y: Option<f64>,
    pub revenue_growth_3m: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

/// A ratio counts as present only if it exists and is not NaN.
pub fn defined(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}
