//! Strategy selection.
//!
//! A decision table over (market bias, volatility regime): high volatility
//! favors selling premium, low volatility favors buying it, medium splits
//! on the oscillator. RSI extremes override the table entirely, since mean
//! reversion outranks trend-following once the oscillator is pinned.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::signal::{MarketBias, PercentileBand, SignalConfig, VolatilityAssessment, VolatilityRegime};

/// Closed vocabulary of recommendable strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    BullPutSpread,
    BullCallSpread,
    BearCallSpread,
    BearPutSpread,
    IronCondor,
    IronButterfly,
    CalendarSpread,
    NoTrade,
}

/// Directional framing of a strategy, used for exits and risk levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyDirection {
    Bullish,
    Bearish,
    Neutral,
}

impl StrategyKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BullPutSpread => "BULL_PUT_SPREAD",
            Self::BullCallSpread => "BULL_CALL_SPREAD",
            Self::BearCallSpread => "BEAR_CALL_SPREAD",
            Self::BearPutSpread => "BEAR_PUT_SPREAD",
            Self::IronCondor => "IRON_CONDOR",
            Self::IronButterfly => "IRON_BUTTERFLY",
            Self::CalendarSpread => "CALENDAR_SPREAD",
            Self::NoTrade => "NO_TRADE",
        }
    }

    /// Whether the position is opened for a net credit.
    pub fn is_credit(&self) -> bool {
        matches!(
            self,
            Self::BullPutSpread | Self::BearCallSpread | Self::IronCondor | Self::IronButterfly
        )
    }

    pub fn direction(&self) -> StrategyDirection {
        match self {
            Self::BullPutSpread | Self::BullCallSpread => StrategyDirection::Bullish,
            Self::BearCallSpread | Self::BearPutSpread => StrategyDirection::Bearish,
            Self::IronCondor | Self::IronButterfly | Self::CalendarSpread | Self::NoTrade => {
                StrategyDirection::Neutral
            }
        }
    }
}

/// Pick a strategy for the day's conditions.
pub fn select_strategy(
    bias: MarketBias,
    volatility: &VolatilityAssessment,
    rsi: f64,
    config: &SignalConfig,
) -> StrategyKind {
    // Pinned oscillator overrides the bias table in every regime.
    if rsi >= config.rsi_overbought {
        debug!(rsi, "overbought override -> bear call spread");
        return StrategyKind::BearCallSpread;
    }
    if rsi <= config.rsi_oversold {
        debug!(rsi, "oversold override -> bull put spread");
        return StrategyKind::BullPutSpread;
    }

    match (bias, volatility.regime) {
        (MarketBias::Bullish, VolatilityRegime::High) => StrategyKind::BullPutSpread,
        (MarketBias::Bullish, VolatilityRegime::Medium) => {
            if rsi <= 50.0 {
                StrategyKind::BullPutSpread
            } else {
                StrategyKind::BullCallSpread
            }
        }
        (MarketBias::Bullish, VolatilityRegime::Low) => StrategyKind::BullCallSpread,

        (MarketBias::Bearish, VolatilityRegime::High) => StrategyKind::BearCallSpread,
        (MarketBias::Bearish, VolatilityRegime::Medium) => {
            if rsi >= 50.0 {
                StrategyKind::BearCallSpread
            } else {
                StrategyKind::BearPutSpread
            }
        }
        (MarketBias::Bearish, VolatilityRegime::Low) => StrategyKind::BearPutSpread,

        (MarketBias::Neutral, VolatilityRegime::High) => StrategyKind::IronCondor,
        (MarketBias::Neutral, VolatilityRegime::Medium) => {
            if volatility.percentile_band == PercentileBand::High {
                StrategyKind::IronCondor
            } else {
                StrategyKind::CalendarSpread
            }
        }
        (MarketBias::Neutral, VolatilityRegime::Low) => {
            if volatility.percentile_band == PercentileBand::Low {
                StrategyKind::NoTrade
            } else {
                StrategyKind::IronButterfly
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{assess, VolatilityConfig};

    fn vol(vix: f64, percentile: f64) -> VolatilityAssessment {
        assess(vix, percentile, &VolatilityConfig::default())
    }

    #[test]
    fn test_high_vol_favors_credit() {
        let config = SignalConfig::default();
        let v = vol(30.0, 60.0);

        assert_eq!(
            select_strategy(MarketBias::Bullish, &v, 50.0, &config),
            StrategyKind::BullPutSpread
        );
        assert_eq!(
            select_strategy(MarketBias::Bearish, &v, 50.0, &config),
            StrategyKind::BearCallSpread
        );
        assert_eq!(
            select_strategy(MarketBias::Neutral, &v, 50.0, &config),
            StrategyKind::IronCondor
        );
    }

    #[test]
    fn test_low_vol_favors_debit() {
        let config = SignalConfig::default();
        let v = vol(12.0, 50.0);

        assert_eq!(
            select_strategy(MarketBias::Bullish, &v, 55.0, &config),
            StrategyKind::BullCallSpread
        );
        assert_eq!(
            select_strategy(MarketBias::Bearish, &v, 45.0, &config),
            StrategyKind::BearPutSpread
        );
    }

    #[test]
    fn test_medium_vol_rsi_tiebreak() {
        let config = SignalConfig::default();
        let v = vol(20.0, 50.0);

        assert_eq!(
            select_strategy(MarketBias::Bullish, &v, 45.0, &config),
            StrategyKind::BullPutSpread
        );
        assert_eq!(
            select_strategy(MarketBias::Bullish, &v, 60.0, &config),
            StrategyKind::BullCallSpread
        );
        assert_eq!(
            select_strategy(MarketBias::Bearish, &v, 60.0, &config),
            StrategyKind::BearCallSpread
        );
        assert_eq!(
            select_strategy(MarketBias::Bearish, &v, 45.0, &config),
            StrategyKind::BearPutSpread
        );
    }

    #[test]
    fn test_neutral_medium_splits_on_percentile() {
        let config = SignalConfig::default();

        assert_eq!(
            select_strategy(MarketBias::Neutral, &vol(20.0, 80.0), 50.0, &config),
            StrategyKind::IronCondor
        );
        assert_eq!(
            select_strategy(MarketBias::Neutral, &vol(20.0, 50.0), 50.0, &config),
            StrategyKind::CalendarSpread
        );
    }

    #[test]
    fn test_neutral_low_butterfly_or_no_trade() {
        let config = SignalConfig::default();

        assert_eq!(
            select_strategy(MarketBias::Neutral, &vol(12.0, 50.0), 50.0, &config),
            StrategyKind::IronButterfly
        );
        assert_eq!(
            select_strategy(MarketBias::Neutral, &vol(12.0, 20.0), 50.0, &config),
            StrategyKind::NoTrade
        );
    }

    #[test]
    fn test_rsi_extremes_override_bias() {
        let config = SignalConfig::default();
        let v = vol(30.0, 80.0);

        // Overbought forces the bearish credit spread even on a bullish day.
        assert_eq!(
            select_strategy(MarketBias::Bullish, &v, 74.0, &config),
            StrategyKind::BearCallSpread
        );
        // Oversold forces the bullish credit spread even on a bearish day.
        assert_eq!(
            select_strategy(MarketBias::Bearish, &v, 22.0, &config),
            StrategyKind::BullPutSpread
        );
    }

    #[test]
    fn test_fear_day_never_selects_debit() {
        // VIX 40 at the 80th percentile must land on a premium-selling
        // structure whatever the bias says.
        let config = SignalConfig::default();
        let v = vol(40.0, 80.0);

        for bias in [MarketBias::Bullish, MarketBias::Bearish, MarketBias::Neutral] {
            let strategy = select_strategy(bias, &v, 50.0, &config);
            assert!(strategy.is_credit(), "{bias:?} chose {strategy:?}");
        }
    }
}
