//! Order placement port.

use crate::domain::error::FundscreenError;
use crate::domain::targets::PortfolioTarget;

pub trait BrokerPort {
    /// Sets holdings for every listed symbol in one call.
    fn commit_targets(&mut self, targets: &[PortfolioTarget]) -> Result<(), FundscreenError>;

    fn liquidate(&mut self, symbol: &str) -> Result<(), FundscreenError>;

    fn is_invested(&self, symbol: &str) -> bool;
}
