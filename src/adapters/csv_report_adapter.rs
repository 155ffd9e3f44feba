//! CSV rebalance log writer: one row per committed target.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::FundscreenError;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), FundscreenError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(|e| FundscreenError::Data {
            reason: format!("failed to open {output_path}: {e}"),
        })?;

        wtr.write_record(["date", "symbol", "weight"])
            .map_err(csv_err)?;
        for rebalance in &result.rebalances {
            let date = rebalance.date.format("%Y-%m-%d").to_string();
            for target in &rebalance.targets {
                wtr.write_record([date.as_str(), target.symbol.as_str(), &format!("{:.6}", target.weight)])
                    .map_err(csv_err)?;
            }
        }
        wtr.flush()?;
        Ok(())
    }
}

fn csv_err(e: csv::Error) -> FundscreenError {
    FundscreenError::Data {
        reason: format!("CSV write error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::RebalanceRecord;
    use crate::domain::targets::PortfolioTarget;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn writes_one_row_per_target() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("rebalances.csv");
        let result = BacktestResult {
            rebalances: vec![RebalanceRecord {
                date: NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
                targets: vec![
                    PortfolioTarget { symbol: "A".into(), weight: 0.5 },
                    PortfolioTarget { symbol: "B".into(), weight: 0.5 },
                ],
                pruned: vec!["C".into()],
            }],
            ..Default::default()
        };

        CsvReportAdapter.write(&result, out.to_str().unwrap()).unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            content,
            "date,symbol,weight\n2023-01-03,A,0.500000\n2023-01-03,B,0.500000\n"
        );
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let result = BacktestResult::default();
        let err = CsvReportAdapter
            .write(&result, "/nonexistent/dir/out.csv")
            .unwrap_err();
        assert!(matches!(err, FundscreenError::Data { .. }));
    }
}
