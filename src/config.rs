//! Configuration store.
//!
//! All thresholds and periods in one TOML-loadable struct. Every section
//! has defaults, so a partial file only overrides what it names. The core
//! never reads configuration ambiently; handles are passed in explicitly.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backtest::{BacktestConfig, EntrySampling};
use crate::indicators::IndicatorPeriods;
use crate::risk::{AccountType, RiskConfig};
use crate::signal::{SignalConfig, VolatilityConfig};
use crate::strategy::StrategyConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub indicators: IndicatorPeriods,

    #[serde(default)]
    pub signal: SignalConfig,

    #[serde(default)]
    pub volatility: VolatilityConfig,

    #[serde(default)]
    pub strategy: StrategyConfig,

    #[serde(default)]
    pub risk: RiskConfig,
}

/// Periods and thresholds that do not belong to a single component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Target days to expiration for chain fetches and backtest windows.
    pub target_dte: i64,
    /// Tolerance around the target expiration, in days.
    pub chain_tolerance_days: i64,
    /// Below this signal strength no trade is recommended.
    pub min_signal_strength: f64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            target_dte: 30,
            chain_tolerance_days: 5,
            min_signal_strength: 1.0,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Assemble a backtest configuration from these settings.
    pub fn backtest_config(
        &self,
        sampling: EntrySampling,
        account_type: AccountType,
    ) -> BacktestConfig {
        BacktestConfig {
            min_signal_strength: self.general.min_signal_strength,
            days_to_expiration: self.general.target_dte,
            sampling,
            account_type,
            indicators: self.indicators.clone(),
            signal: self.signal.clone(),
            volatility: self.volatility.clone(),
            strategy: self.strategy.clone(),
            risk: self.risk.clone(),
            ..BacktestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.indicators.sma_short, 50);
        assert_eq!(config.indicators.sma_long, 200);
        assert_eq!(config.indicators.rsi, 14);
        assert_eq!(config.indicators.macd_fast, 12);
        assert_eq!(config.indicators.macd_slow, 26);
        assert_eq!(config.general.chain_tolerance_days, 5);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: Config = toml::from_str(
            "[general]\n\
             target_dte = 45\n\
             min_signal_strength = 1.5\n\
             \n\
             [indicators]\n\
             sma_short = 20\n\
             sma_long = 100\n\
             \n\
             [volatility]\n\
             high_threshold = 30.0\n",
        )
        .unwrap();

        assert_eq!(config.general.target_dte, 45);
        assert_eq!(config.indicators.sma_long, 100);
        assert_eq!(config.volatility.high_threshold, 30.0);
        // Untouched sections keep their defaults.
        assert_eq!(config.general.chain_tolerance_days, 5);
        assert_eq!(config.indicators.rsi, 14);
        assert_eq!(config.signal.macd_strong_threshold, 10.0);
        assert_eq!(config.risk.stop_loss_pct, 0.02);
    }
}
