//! Replay data port: the candidate streams, data ticks and calendar a host
//! would normally push into the engine.

use crate::domain::error::FundscreenError;
use crate::domain::security::{Candidate, FineCandidate};
use crate::domain::universe::DataSlice;
use chrono::NaiveDate;

pub trait DataPort {
    fn coarse_candidates(&self, date: NaiveDate) -> Result<Vec<Candidate>, FundscreenError>;

    /// Fundamentals for `date`, restricted to `symbols`.
    fn fine_candidates(
        &self,
        date: NaiveDate,
        symbols: &[String],
    ) -> Result<Vec<FineCandidate>, FundscreenError>;

    fn data_slice(&self, date: NaiveDate) -> Result<DataSlice, FundscreenError>;

    /// Sorted dates in `[start, end]` with any universe or price data.
    fn trading_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, FundscreenError>;
}
