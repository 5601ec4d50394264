//! Risk bands, position sizing, and per-trade risk metrics.

pub mod sizing;

pub use sizing::{AccountInfo, AccountType, RiskBand, RiskConfig, RiskMetrics, RiskSizer};
