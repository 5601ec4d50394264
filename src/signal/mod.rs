//! Market bias, signal strength, and volatility regime classification.

pub mod classifier;
pub mod volatility;

pub use classifier::{market_bias, signal_strength, MarketBias, SignalConfig};
pub use volatility::{
    assess, PercentileBand, VolatilityAssessment, VolatilityConfig, VolatilityRegime,
};
