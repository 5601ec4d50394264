//! Position sizing and per-trade risk metrics.
//!
//! Signal strength picks a point inside the account's risk band,
//! volatility and drawdown each apply an independent penalty, and the
//! result is clamped back into the band. All figures are recomputed
//! fresh for every recommendation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::signal::{VolatilityAssessment, VolatilityRegime};
use crate::strategy::StrategyDirection;

/// Account size classes with distinct risk bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Small,
    Medium,
    Large,
}

/// Account state supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub balance: Decimal,
    pub account_type: AccountType,
    /// Current drawdown from the account's peak, in [0, 1].
    pub current_drawdown: f64,
}

/// Position-size band as fractions of the account balance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskBand {
    pub min_fraction: f64,
    pub max_fraction: f64,
}

impl RiskBand {
    pub const fn new(min_fraction: f64, max_fraction: f64) -> Self {
        Self {
            min_fraction,
            max_fraction,
        }
    }

    fn clamp(&self, fraction: f64) -> f64 {
        fraction.clamp(self.min_fraction, self.max_fraction)
    }
}

/// Risk configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub small_band: RiskBand,
    pub medium_band: RiskBand,
    pub large_band: RiskBand,
    /// Band applied when the account is in a deep drawdown.
    pub stressed_band: RiskBand,
    /// Drawdown beyond which the stressed band takes over.
    pub stressed_drawdown: f64,
    /// Default stop distance as a fraction of entry price.
    pub stop_loss_pct: f64,
    /// Profit-target distance as a fraction of entry price.
    pub profit_target_pct: f64,
    /// Hard ceiling on tolerated account drawdown.
    pub max_drawdown_ceiling: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            small_band: RiskBand::new(0.04, 0.10),
            medium_band: RiskBand::new(0.05, 0.12),
            large_band: RiskBand::new(0.06, 0.15),
            stressed_band: RiskBand::new(0.02, 0.05),
            stressed_drawdown: 0.15,
            stop_loss_pct: 0.02,
            profit_target_pct: 0.04,
            max_drawdown_ceiling: 0.25,
        }
    }
}

/// Per-trade risk figures. Never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Largest position the band allows, in currency.
    pub max_position_size: Decimal,

    /// Position size for this signal, in currency.
    pub position_size: Decimal,

    /// Risk budget for the trade, in currency. Never exceeds the
    /// position size.
    pub max_risk: Decimal,

    pub stop_loss_price: Decimal,

    pub profit_target_price: Decimal,

    /// Reward distance over risk distance, floored above 1.
    pub risk_reward_ratio: f64,

    /// Tolerated drawdown ceiling, at most 0.25.
    pub max_drawdown_ceiling: f64,

    /// Combined volatility adjustment, bounded to [0.5, 1.5].
    pub volatility_adjustment: f64,

    /// Concentration heuristic for a single-underlying book, >= 0.
    pub correlation_risk: f64,
}

/// Computes position sizes and risk metrics.
pub struct RiskSizer {
    config: RiskConfig,
}

impl RiskSizer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    fn band_for(&self, account: &AccountInfo) -> RiskBand {
        if account.current_drawdown > self.config.stressed_drawdown {
            return self.config.stressed_band;
        }
        match account.account_type {
            AccountType::Small => self.config.small_band,
            AccountType::Medium => self.config.medium_band,
            AccountType::Large => self.config.large_band,
        }
    }

    /// Fraction of the balance to deploy, always inside the band.
    pub fn position_fraction(
        &self,
        signal_strength: f64,
        volatility: &VolatilityAssessment,
        account: &AccountInfo,
    ) -> f64 {
        let band = self.band_for(account);
        let span = band.max_fraction - band.min_fraction;

        let base = if signal_strength >= 4.0 {
            band.max_fraction
        } else if signal_strength >= 3.0 {
            band.min_fraction + span * 0.75
        } else if signal_strength >= 2.0 {
            band.min_fraction + span * 0.5
        } else if signal_strength >= 1.0 {
            band.min_fraction + span * 0.25
        } else {
            band.min_fraction
        };

        let vol_penalty = match volatility.regime {
            VolatilityRegime::High => 0.7,
            VolatilityRegime::Medium => 0.9,
            VolatilityRegime::Low => 1.0,
        };

        let drawdown_penalty = if account.current_drawdown > 0.15 {
            0.5
        } else if account.current_drawdown > 0.10 {
            0.6
        } else if account.current_drawdown > 0.05 {
            0.75
        } else {
            1.0
        };

        let fraction = band.clamp(base * vol_penalty * drawdown_penalty);
        debug!(
            signal_strength,
            base, vol_penalty, drawdown_penalty, fraction, "position fraction"
        );
        fraction
    }

    /// Full risk metrics for a candidate trade.
    ///
    /// `strategy_max_loss` (per share, from the strategy parameters)
    /// overrides the default percentage stop distance when present.
    pub fn compute(
        &self,
        signal_strength: f64,
        volatility: &VolatilityAssessment,
        account: &AccountInfo,
        entry_price: Decimal,
        direction: StrategyDirection,
        strategy_max_loss: Option<Decimal>,
    ) -> RiskMetrics {
        let band = self.band_for(account);
        let fraction = self.position_fraction(signal_strength, volatility, account);

        let max_fraction = Decimal::from_f64_retain(band.max_fraction).unwrap_or_default();
        let fraction_dec = Decimal::from_f64_retain(fraction).unwrap_or_default();

        let max_position_size = (account.balance * max_fraction).round_dp(2);
        let position_size = (account.balance * fraction_dec).round_dp(2);
        let max_risk = position_size.min(max_position_size);

        let stop_pct = Decimal::from_f64_retain(self.config.stop_loss_pct).unwrap_or_default();
        let target_pct =
            Decimal::from_f64_retain(self.config.profit_target_pct).unwrap_or_default();

        let stop_distance = strategy_max_loss
            .filter(|loss| *loss > Decimal::ZERO)
            .unwrap_or(entry_price * stop_pct);
        let target_distance = entry_price * target_pct;

        let (stop_loss_price, profit_target_price) = match direction {
            // Neutral structures are risk-framed on the downside.
            StrategyDirection::Bullish | StrategyDirection::Neutral => (
                (entry_price - stop_distance).round_dp(2),
                (entry_price + target_distance).round_dp(2),
            ),
            StrategyDirection::Bearish => (
                (entry_price + stop_distance).round_dp(2),
                (entry_price - target_distance).round_dp(2),
            ),
        };

        let stop_f: f64 = stop_distance.try_into().unwrap_or(1.0);
        let target_f: f64 = target_distance.try_into().unwrap_or(0.0);
        let risk_reward_ratio = if stop_f > 0.0 {
            (target_f / stop_f).max(1.05)
        } else {
            1.05
        };

        let correlation_risk = match volatility.regime {
            VolatilityRegime::High => 0.7,
            VolatilityRegime::Medium => 0.5,
            VolatilityRegime::Low => 0.3,
        };

        RiskMetrics {
            max_position_size,
            position_size,
            max_risk,
            stop_loss_price,
            profit_target_price,
            risk_reward_ratio,
            max_drawdown_ceiling: self.config.max_drawdown_ceiling.min(0.25),
            volatility_adjustment: volatility.combined_adjustment(),
            correlation_risk,
        }
    }
}
