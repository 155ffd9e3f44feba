//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::FundscreenError;

/// Port for writing replay reports.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), FundscreenError>;
}
