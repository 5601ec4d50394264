//! Backtest simulator: trade lifecycle and performance accounting.

pub mod engine;
pub mod trade;

pub use engine::{BacktestConfig, BacktestEngine, BacktestResult, EntrySampling, EquityPoint};
pub use trade::{ExitReason, TradeResult};
