//! Daily recommendation orchestration.
//!
//! Pulls the classifier, selector, pricing and risk modules together into
//! the one call the host cares about: given today's snapshot, an option
//! chain and an account, what spread should go on and at what size.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::data::{MarketDataError, MarketDataSource, MarketSnapshot, OptionChainSlice};
use crate::pricing::PricingModel;
use crate::risk::{AccountInfo, RiskMetrics, RiskSizer};
use crate::signal::{
    assess, market_bias, signal_strength, MarketBias, VolatilityAssessment, VolatilityRegime,
};
use crate::strategy::{
    select_strategy, ParameterBuilder, StrategyError, StrategyKind, StrategyParameters,
    ValidationError,
};

/// Errors surfaced by the recommendation cycle.
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error(transparent)]
    Data(#[from] MarketDataError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Coarse risk label for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
        }
    }
}

/// A complete recommendation for the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRecommendation {
    pub strategy: StrategyKind,
    pub bias: MarketBias,
    pub volatility: VolatilityAssessment,
    pub signal_strength: f64,
    pub risk_level: RiskLevel,
    /// Model probability of profit, used as the expected win rate.
    pub expected_win_rate: f64,
    /// Absent for NO_TRADE days.
    pub parameters: Option<StrategyParameters>,
    /// Absent for NO_TRADE days.
    pub risk: Option<RiskMetrics>,
    pub reasoning: String,
}

impl StrategyRecommendation {
    pub fn position_size(&self) -> Decimal {
        self.risk
            .as_ref()
            .map(|r| r.position_size)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn max_risk(&self) -> Decimal {
        self.risk
            .as_ref()
            .map(|r| r.max_risk)
            .unwrap_or(Decimal::ZERO)
    }
}

/// The recommendation engine.
pub struct Advisor {
    config: Config,
    sizer: RiskSizer,
    builder: ParameterBuilder,
}

impl Advisor {
    pub fn new(config: Config) -> Self {
        let sizer = RiskSizer::new(config.risk.clone());
        let builder = ParameterBuilder::new(PricingModel::default(), config.strategy.clone());
        Self {
            config,
            sizer,
            builder,
        }
    }

    /// Fetch fresh data from the collaborator and recommend.
    pub fn recommend_from_source(
        &self,
        source: &dyn MarketDataSource,
        account: &AccountInfo,
    ) -> Result<StrategyRecommendation, AdvisorError> {
        let snapshot = source.fetch_market_snapshot()?;
        let chain = source.fetch_option_chain(
            self.config.general.target_dte,
            self.config.general.chain_tolerance_days,
        )?;
        self.recommend(&snapshot, &chain, account)
    }

    /// Produce a recommendation for one snapshot/chain pair.
    pub fn recommend(
        &self,
        snapshot: &MarketSnapshot,
        chain: &OptionChainSlice,
        account: &AccountInfo,
    ) -> Result<StrategyRecommendation, AdvisorError> {
        let strength = signal_strength(snapshot, &self.config.signal);
        let bias = market_bias(snapshot, &self.config.signal);
        let volatility = assess(
            snapshot.vix,
            snapshot.vix_percentile,
            &self.config.volatility,
        );
        let risk_level = risk_level(&volatility, account);

        if strength < self.config.general.min_signal_strength {
            return Ok(self.no_trade(
                bias,
                volatility,
                strength,
                risk_level,
                format!(
                    "Signal strength {:.2} below minimum {:.2}; staying flat.",
                    strength, self.config.general.min_signal_strength
                ),
            ));
        }

        let strategy = select_strategy(bias, &volatility, snapshot.rsi, &self.config.signal);
        if strategy == StrategyKind::NoTrade {
            return Ok(self.no_trade(
                bias,
                volatility,
                strength,
                risk_level,
                "Neutral bias in a quiet, low-percentile tape; no edge to harvest.".to_string(),
            ));
        }

        let parameters = self.builder.build(strategy, snapshot, chain)?;
        parameters.validate(snapshot.price)?;

        let risk = self.sizer.compute(
            strength,
            &volatility,
            account,
            snapshot.price,
            strategy.direction(),
            Some(parameters.max_loss),
        );

        let reasoning = render_reasoning(snapshot, bias, &volatility, strength, &parameters, &risk);
        info!(strategy = strategy.label(), strength, "recommendation ready");

        Ok(StrategyRecommendation {
            strategy,
            bias,
            volatility,
            signal_strength: strength,
            risk_level,
            expected_win_rate: parameters.probability_of_profit,
            parameters: Some(parameters),
            risk: Some(risk),
            reasoning,
        })
    }

    fn no_trade(
        &self,
        bias: MarketBias,
        volatility: VolatilityAssessment,
        strength: f64,
        risk_level: RiskLevel,
        reasoning: String,
    ) -> StrategyRecommendation {
        StrategyRecommendation {
            strategy: StrategyKind::NoTrade,
            bias,
            volatility,
            signal_strength: strength,
            risk_level,
            expected_win_rate: 0.0,
            parameters: None,
            risk: None,
            reasoning,
        }
    }
}

fn risk_level(volatility: &VolatilityAssessment, account: &AccountInfo) -> RiskLevel {
    if volatility.regime == VolatilityRegime::High || account.current_drawdown > 0.10 {
        RiskLevel::High
    } else if volatility.regime == VolatilityRegime::Medium {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

fn render_reasoning(
    snapshot: &MarketSnapshot,
    bias: MarketBias,
    volatility: &VolatilityAssessment,
    strength: f64,
    parameters: &StrategyParameters,
    risk: &RiskMetrics,
) -> String {
    let strikes = match (parameters.sell_strike, parameters.buy_strike) {
        (Some(sell), Some(buy)) => format!("sell {sell} / buy {buy}"),
        _ => "n/a".to_string(),
    };

    format!(
        "Market Read\n\
         ----------------------------------------\n\
         Bias: {} | Volatility: {} (pct {:.0}) | Signal: {:.2}/5.00\n\
         Price: ${:.2} | RSI: {:.1} | ADX: {:.1} | MACD: {:.2}\n\
         \n\
         Recommendation: {}\n\
         Strikes: {} ({} DTE, expires {})\n\
         Net Premium: ${:.2} | Max Loss: ${:.2} | Breakeven: ${:.2}\n\
         Probability of Profit: {:.0}%\n\
         \n\
         Position Size: ${:.2} | Max Risk: ${:.2}\n\
         Stop: ${:.2} | Target: ${:.2} | R/R: {:.2}",
        bias.label(),
        volatility.regime.label(),
        snapshot.vix_percentile,
        strength,
        snapshot.price,
        snapshot.rsi,
        snapshot.adx,
        snapshot.macd,
        parameters.strategy.label(),
        strikes,
        parameters.days_to_expiration,
        parameters.expiration,
        parameters.target_credit,
        parameters.max_loss,
        parameters.breakeven,
        parameters.probability_of_profit * 100.0,
        risk.position_size,
        risk.max_risk,
        risk.stop_loss_price,
        risk.profit_target_price,
        risk.risk_reward_ratio,
    )
}
