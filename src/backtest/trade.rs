//! Simulated trade records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::risk::RiskMetrics;
use crate::strategy::StrategyKind;

/// Why a simulated position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// Price crossed the stop level.
    StopLoss,
    /// Price reached the profit target.
    ProfitTarget,
    /// Still unprofitable at half the holding period.
    TimeExit,
    /// Held to the end of the expiration window.
    Expiration,
    /// History ran out before the window did.
    EndOfData,
}

/// One completed simulated trade. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeResult {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub strategy: StrategyKind,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub contracts: i64,
    pub pnl: Decimal,
    pub exit_reason: ExitReason,
    /// Risk metrics in effect at entry.
    pub risk: RiskMetrics,
}

impl TradeResult {
    pub fn is_winner(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    pub fn days_held(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
