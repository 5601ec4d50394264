pub mod advisor;
pub mod backtest;
pub mod config;
pub mod data;
pub mod indicators;
pub mod pricing;
pub mod risk;
pub mod signal;
pub mod strategy;

// Re-export commonly used types
pub use advisor::{Advisor, AdvisorError, RiskLevel, StrategyRecommendation};
pub use backtest::{BacktestConfig, BacktestEngine, BacktestResult, EntrySampling, TradeResult};
pub use config::{Config, ConfigError};
pub use data::{
    DailyBar, MarketDataError, MarketDataSource, MarketSnapshot, OptionChainSlice, OptionQuote,
    OptionType,
};
pub use pricing::PricingModel;
pub use risk::{AccountInfo, AccountType, RiskMetrics, RiskSizer};
pub use signal::{MarketBias, VolatilityAssessment, VolatilityRegime};
pub use strategy::{StrategyKind, StrategyParameters};
