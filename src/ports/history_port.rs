//! Historical close-price query port.

use crate::domain::config::Resolution;
use crate::domain::error::FundscreenError;
use chrono::NaiveDateTime;
use std::collections::HashMap;

pub trait HistoryPort {
    /// Up to `bar_count` closing prices per symbol, oldest first, for bars
    /// ending before `end`. Symbols without history may be absent from the map.
    fn history(
        &self,
        symbols: &[String],
        bar_count: usize,
        resolution: Resolution,
        end: NaiveDateTime,
    ) -> Result<HashMap<String, Vec<f64>>, FundscreenError>;
}
