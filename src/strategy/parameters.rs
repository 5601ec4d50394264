//! Strategy parameter construction.
//!
//! Walks the available-strikes set for the chosen strategy, picks legs
//! nearest the target offsets, and derives credit, max loss and breakeven.
//! Credit comes from actual bid/ask quotes when both legs are two-sided,
//! from the pricing model when only IVs are usable, and from a fixed
//! fraction of the spread width as a last resort.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{MarketSnapshot, OptionChainSlice, OptionQuote, OptionType};
use crate::pricing::PricingModel;

use super::selector::{StrategyDirection, StrategyKind};

/// Errors from strategy selection and parameter building.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("no valid strikes available in chain for {strategy:?}")]
    NoValidStrikes { strategy: StrategyKind },

    #[error("no parameter builder for {0:?}")]
    Unsupported(StrategyKind),
}

/// Invariant violations in computed parameters.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("max loss must be non-negative, got {0}")]
    NegativeMaxLoss(Decimal),

    #[error("target credit {credit} exceeds spread width {width}")]
    CreditExceedsWidth { credit: Decimal, width: Decimal },

    #[error("breakeven {breakeven} is on the wrong side of spot {spot} for {strategy:?}")]
    BreakevenWrongSide {
        strategy: StrategyKind,
        breakeven: Decimal,
        spot: Decimal,
    },

    #[error("probability of profit {0} outside [0, 1]")]
    ProbabilityOutOfRange(f64),
}

/// Strike offsets and fallbacks for parameter building.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Short leg of a credit vertical, fraction OTM.
    pub credit_sell_offset: f64,
    /// Long leg of a credit vertical, fraction OTM.
    pub credit_buy_offset: f64,
    /// Far leg of a debit vertical, fraction beyond spot.
    pub debit_far_offset: f64,
    /// Condor short strikes, fraction OTM each side.
    pub condor_inner_offset: f64,
    /// Condor long strikes, fraction OTM each side.
    pub condor_outer_offset: f64,
    /// Butterfly wings, fraction from the body.
    pub butterfly_wing_offset: f64,
    /// Credit assumed when neither quotes nor IVs price a spread,
    /// as a fraction of width.
    pub fallback_credit_fraction: f64,
    /// Calendar debit as a fraction of spot.
    pub calendar_debit_fraction: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            credit_sell_offset: 0.02,
            credit_buy_offset: 0.04,
            debit_far_offset: 0.03,
            condor_inner_offset: 0.03,
            condor_outer_offset: 0.05,
            butterfly_wing_offset: 0.02,
            fallback_credit_fraction: 0.30,
            calendar_debit_fraction: 0.015,
        }
    }
}

/// Output of the parameter builder.
///
/// `target_credit` holds the net premium: credit received for short
/// structures, debit paid for long ones. For four-leg structures the
/// stored strike pair is the put side and `breakeven` the lower of the
/// two breakevens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyParameters {
    pub strategy: StrategyKind,
    pub sell_strike: Option<Decimal>,
    pub buy_strike: Option<Decimal>,
    pub option_type: Option<OptionType>,
    pub target_credit: Decimal,
    pub max_loss: Decimal,
    pub max_profit: Decimal,
    pub return_on_risk: f64,
    pub days_to_expiration: i64,
    pub expiration: NaiveDate,
    pub breakeven: Decimal,
    /// Probability of profit, in [0, 1].
    pub probability_of_profit: f64,
}

impl StrategyParameters {
    /// Spread width between the stored legs.
    pub fn width(&self) -> Option<Decimal> {
        match (self.sell_strike, self.buy_strike) {
            (Some(sell), Some(buy)) => Some((sell - buy).abs()),
            _ => None,
        }
    }

    /// Check the parameter invariants against the current spot price.
    pub fn validate(&self, spot: Decimal) -> Result<(), ValidationError> {
        if self.max_loss < Decimal::ZERO {
            return Err(ValidationError::NegativeMaxLoss(self.max_loss));
        }

        if !(0.0..=1.0).contains(&self.probability_of_profit) {
            return Err(ValidationError::ProbabilityOutOfRange(
                self.probability_of_profit,
            ));
        }

        // Two-leg credit verticals: credit can never exceed the width.
        if matches!(
            self.strategy,
            StrategyKind::BullPutSpread | StrategyKind::BearCallSpread
        ) {
            if let Some(width) = self.width() {
                if self.target_credit > width {
                    return Err(ValidationError::CreditExceedsWidth {
                        credit: self.target_credit,
                        width,
                    });
                }
            }

            let wrong_side = match self.strategy.direction() {
                StrategyDirection::Bullish => self.breakeven >= spot,
                StrategyDirection::Bearish => self.breakeven <= spot,
                StrategyDirection::Neutral => false,
            };
            if wrong_side {
                return Err(ValidationError::BreakevenWrongSide {
                    strategy: self.strategy,
                    breakeven: self.breakeven,
                    spot,
                });
            }
        }

        Ok(())
    }
}

/// Builds strategy parameters against an option chain slice.
pub struct ParameterBuilder {
    model: PricingModel,
    config: StrategyConfig,
}

impl ParameterBuilder {
    pub fn new(model: PricingModel, config: StrategyConfig) -> Self {
        Self { model, config }
    }

    /// Build parameters for the chosen strategy.
    pub fn build(
        &self,
        strategy: StrategyKind,
        snapshot: &MarketSnapshot,
        chain: &OptionChainSlice,
    ) -> Result<StrategyParameters, StrategyError> {
        match strategy {
            StrategyKind::BullPutSpread => {
                self.build_credit_vertical(strategy, snapshot, chain, OptionType::Put)
            }
            StrategyKind::BearCallSpread => {
                self.build_credit_vertical(strategy, snapshot, chain, OptionType::Call)
            }
            StrategyKind::BullCallSpread => {
                self.build_debit_vertical(strategy, snapshot, chain, OptionType::Call)
            }
            StrategyKind::BearPutSpread => {
                self.build_debit_vertical(strategy, snapshot, chain, OptionType::Put)
            }
            StrategyKind::IronCondor => self.build_condor(snapshot, chain),
            StrategyKind::IronButterfly => self.build_butterfly(snapshot, chain),
            StrategyKind::CalendarSpread => self.build_calendar(snapshot, chain),
            StrategyKind::NoTrade => Err(StrategyError::Unsupported(strategy)),
        }
    }

    fn nearest(
        &self,
        chain: &OptionChainSlice,
        option_type: OptionType,
        target: f64,
        strategy: StrategyKind,
    ) -> Result<Decimal, StrategyError> {
        let target = Decimal::from_f64_retain(target).unwrap_or_default();
        chain
            .nearest_strike(option_type, target)
            .ok_or(StrategyError::NoValidStrikes { strategy })
    }

    fn leg_iv(quote: Option<&OptionQuote>, fallback: f64) -> f64 {
        quote
            .map(|q| q.implied_volatility)
            .filter(|iv| *iv > 0.0)
            .unwrap_or(fallback)
    }

    /// Net credit for a two-leg credit vertical, with the average leg IV
    /// used for the probability estimate.
    fn resolve_credit(
        &self,
        chain: &OptionChainSlice,
        option_type: OptionType,
        sell_strike: Decimal,
        buy_strike: Decimal,
        spot: f64,
        fallback_iv: f64,
    ) -> (Decimal, f64) {
        let sell_quote = chain.quote_at(option_type, sell_strike);
        let buy_quote = chain.quote_at(option_type, buy_strike);
        let sell_iv = Self::leg_iv(sell_quote, fallback_iv);
        let buy_iv = Self::leg_iv(buy_quote, fallback_iv);
        let avg_iv = (sell_iv + buy_iv) / 2.0;

        if let (Some(sell), Some(buy)) = (sell_quote, buy_quote) {
            if sell.is_two_sided() && buy.is_two_sided() {
                let credit = sell.bid - buy.ask;
                if credit > Decimal::ZERO {
                    return (credit, avg_iv);
                }
            }
        }

        let sell_f: f64 = sell_strike.try_into().unwrap_or(0.0);
        let buy_f: f64 = buy_strike.try_into().unwrap_or(0.0);
        let pricing = self.model.price_credit_vertical(
            spot,
            sell_f,
            buy_f,
            sell_iv,
            buy_iv,
            chain.dte,
            option_type,
        );
        if pricing.credit > 0.0 {
            let credit = Decimal::from_f64_retain(pricing.credit)
                .unwrap_or_default()
                .round_dp(2);
            return (credit, avg_iv);
        }

        let width = (sell_strike - buy_strike).abs();
        let fraction =
            Decimal::from_f64_retain(self.config.fallback_credit_fraction).unwrap_or_default();
        ((width * fraction).round_dp(2), avg_iv)
    }

    /// Net debit for a two-leg debit vertical.
    fn resolve_debit(
        &self,
        chain: &OptionChainSlice,
        option_type: OptionType,
        buy_strike: Decimal,
        sell_strike: Decimal,
        spot: f64,
        fallback_iv: f64,
    ) -> (Decimal, f64) {
        let buy_quote = chain.quote_at(option_type, buy_strike);
        let sell_quote = chain.quote_at(option_type, sell_strike);
        let buy_iv = Self::leg_iv(buy_quote, fallback_iv);
        let sell_iv = Self::leg_iv(sell_quote, fallback_iv);
        let avg_iv = (buy_iv + sell_iv) / 2.0;

        if let (Some(buy), Some(sell)) = (buy_quote, sell_quote) {
            if buy.is_two_sided() && sell.is_two_sided() {
                let debit = buy.ask - sell.bid;
                if debit > Decimal::ZERO {
                    return (debit, avg_iv);
                }
            }
        }

        let time = chain.dte as f64 / 365.0;
        let buy_f: f64 = buy_strike.try_into().unwrap_or(0.0);
        let sell_f: f64 = sell_strike.try_into().unwrap_or(0.0);
        let debit = self.model.price(spot, buy_f, buy_iv, time, option_type)
            - self.model.price(spot, sell_f, sell_iv, time, option_type);
        if debit > 0.0 {
            let debit = Decimal::from_f64_retain(debit)
                .unwrap_or_default()
                .round_dp(2);
            return (debit, avg_iv);
        }

        let width = (sell_strike - buy_strike).abs();
        let fraction =
            Decimal::from_f64_retain(self.config.fallback_credit_fraction).unwrap_or_default();
        ((width * fraction).round_dp(2), avg_iv)
    }

    fn build_credit_vertical(
        &self,
        strategy: StrategyKind,
        snapshot: &MarketSnapshot,
        chain: &OptionChainSlice,
        option_type: OptionType,
    ) -> Result<StrategyParameters, StrategyError> {
        let spot = snapshot.price_f64();
        let fallback_iv = (snapshot.vix / 100.0).max(0.05);

        let (sell_target, buy_target) = match option_type {
            OptionType::Put => (
                spot * (1.0 - self.config.credit_sell_offset),
                spot * (1.0 - self.config.credit_buy_offset),
            ),
            OptionType::Call => (
                spot * (1.0 + self.config.credit_sell_offset),
                spot * (1.0 + self.config.credit_buy_offset),
            ),
        };

        let sell_strike = self.nearest(chain, option_type, sell_target, strategy)?;
        let buy_strike = self.nearest(chain, option_type, buy_target, strategy)?;

        let ordered = match option_type {
            OptionType::Put => sell_strike > buy_strike,
            OptionType::Call => sell_strike < buy_strike,
        };
        if !ordered {
            return Err(StrategyError::NoValidStrikes { strategy });
        }

        let (credit, avg_iv) =
            self.resolve_credit(chain, option_type, sell_strike, buy_strike, spot, fallback_iv);
        let width = (sell_strike - buy_strike).abs();
        let max_loss = width - credit;

        let breakeven = match option_type {
            OptionType::Put => sell_strike - credit,
            OptionType::Call => sell_strike + credit,
        };
        let breakeven_f: f64 = breakeven.try_into().unwrap_or(0.0);
        let time = chain.dte as f64 / 365.0;
        let probability_of_profit = match option_type {
            OptionType::Put => self.model.prob_above(spot, breakeven_f, avg_iv, time),
            OptionType::Call => self.model.prob_below(spot, breakeven_f, avg_iv, time),
        };

        Ok(StrategyParameters {
            strategy,
            sell_strike: Some(sell_strike),
            buy_strike: Some(buy_strike),
            option_type: Some(option_type),
            target_credit: credit,
            max_loss,
            max_profit: credit,
            return_on_risk: ratio(credit, max_loss),
            days_to_expiration: chain.dte,
            expiration: chain.expiration,
            breakeven,
            probability_of_profit,
        })
    }

    fn build_debit_vertical(
        &self,
        strategy: StrategyKind,
        snapshot: &MarketSnapshot,
        chain: &OptionChainSlice,
        option_type: OptionType,
    ) -> Result<StrategyParameters, StrategyError> {
        let spot = snapshot.price_f64();
        let fallback_iv = (snapshot.vix / 100.0).max(0.05);

        let far_target = match option_type {
            OptionType::Call => spot * (1.0 + self.config.debit_far_offset),
            OptionType::Put => spot * (1.0 - self.config.debit_far_offset),
        };

        let buy_strike = self.nearest(chain, option_type, spot, strategy)?;
        let sell_strike = self.nearest(chain, option_type, far_target, strategy)?;

        let ordered = match option_type {
            OptionType::Call => buy_strike < sell_strike,
            OptionType::Put => buy_strike > sell_strike,
        };
        if !ordered {
            return Err(StrategyError::NoValidStrikes { strategy });
        }

        let (debit, avg_iv) =
            self.resolve_debit(chain, option_type, buy_strike, sell_strike, spot, fallback_iv);
        let width = (sell_strike - buy_strike).abs();
        let max_profit = width - debit;

        let breakeven = match option_type {
            OptionType::Call => buy_strike + debit,
            OptionType::Put => buy_strike - debit,
        };
        let breakeven_f: f64 = breakeven.try_into().unwrap_or(0.0);
        let time = chain.dte as f64 / 365.0;
        let probability_of_profit = match option_type {
            OptionType::Call => self.model.prob_above(spot, breakeven_f, avg_iv, time),
            OptionType::Put => self.model.prob_below(spot, breakeven_f, avg_iv, time),
        };

        Ok(StrategyParameters {
            strategy,
            sell_strike: Some(sell_strike),
            buy_strike: Some(buy_strike),
            option_type: Some(option_type),
            target_credit: debit,
            max_loss: debit,
            max_profit,
            return_on_risk: ratio(max_profit, debit),
            days_to_expiration: chain.dte,
            expiration: chain.expiration,
            breakeven,
            probability_of_profit,
        })
    }

    fn build_condor(
        &self,
        snapshot: &MarketSnapshot,
        chain: &OptionChainSlice,
    ) -> Result<StrategyParameters, StrategyError> {
        let strategy = StrategyKind::IronCondor;
        let spot = snapshot.price_f64();
        let fallback_iv = (snapshot.vix / 100.0).max(0.05);

        let sell_put = self.nearest(
            chain,
            OptionType::Put,
            spot * (1.0 - self.config.condor_inner_offset),
            strategy,
        )?;
        let buy_put = self.nearest(
            chain,
            OptionType::Put,
            spot * (1.0 - self.config.condor_outer_offset),
            strategy,
        )?;
        let sell_call = self.nearest(
            chain,
            OptionType::Call,
            spot * (1.0 + self.config.condor_inner_offset),
            strategy,
        )?;
        let buy_call = self.nearest(
            chain,
            OptionType::Call,
            spot * (1.0 + self.config.condor_outer_offset),
            strategy,
        )?;

        if sell_put <= buy_put || sell_call >= buy_call {
            return Err(StrategyError::NoValidStrikes { strategy });
        }

        let (put_credit, put_iv) =
            self.resolve_credit(chain, OptionType::Put, sell_put, buy_put, spot, fallback_iv);
        let (call_credit, call_iv) = self.resolve_credit(
            chain,
            OptionType::Call,
            sell_call,
            buy_call,
            spot,
            fallback_iv,
        );

        let credit = put_credit + call_credit;
        let width = (sell_put - buy_put).abs().max((buy_call - sell_call).abs());
        let max_loss = width - credit;

        let lower_breakeven = sell_put - credit;
        let upper_breakeven = sell_call + credit;
        let avg_iv = (put_iv + call_iv) / 2.0;
        let time = chain.dte as f64 / 365.0;
        let probability_of_profit = self.model.prob_within(
            spot,
            lower_breakeven.try_into().unwrap_or(0.0),
            upper_breakeven.try_into().unwrap_or(f64::MAX),
            avg_iv,
            time,
        );

        Ok(StrategyParameters {
            strategy,
            sell_strike: Some(sell_put),
            buy_strike: Some(buy_put),
            option_type: Some(OptionType::Put),
            target_credit: credit,
            max_loss,
            max_profit: credit,
            return_on_risk: ratio(credit, max_loss),
            days_to_expiration: chain.dte,
            expiration: chain.expiration,
            breakeven: lower_breakeven,
            probability_of_profit,
        })
    }

    fn build_butterfly(
        &self,
        snapshot: &MarketSnapshot,
        chain: &OptionChainSlice,
    ) -> Result<StrategyParameters, StrategyError> {
        let strategy = StrategyKind::IronButterfly;
        let spot = snapshot.price_f64();
        let fallback_iv = (snapshot.vix / 100.0).max(0.05);

        let body_put = self.nearest(chain, OptionType::Put, spot, strategy)?;
        let body_call = self.nearest(chain, OptionType::Call, spot, strategy)?;
        let wing_put = self.nearest(
            chain,
            OptionType::Put,
            spot * (1.0 - self.config.butterfly_wing_offset),
            strategy,
        )?;
        let wing_call = self.nearest(
            chain,
            OptionType::Call,
            spot * (1.0 + self.config.butterfly_wing_offset),
            strategy,
        )?;

        if body_put <= wing_put || body_call >= wing_call {
            return Err(StrategyError::NoValidStrikes { strategy });
        }

        let (put_credit, put_iv) =
            self.resolve_credit(chain, OptionType::Put, body_put, wing_put, spot, fallback_iv);
        let (call_credit, call_iv) = self.resolve_credit(
            chain,
            OptionType::Call,
            body_call,
            wing_call,
            spot,
            fallback_iv,
        );

        let credit = put_credit + call_credit;
        let width = (body_put - wing_put)
            .abs()
            .max((wing_call - body_call).abs());
        let max_loss = width - credit;

        let lower_breakeven = body_put - credit;
        let upper_breakeven = body_call + credit;
        let avg_iv = (put_iv + call_iv) / 2.0;
        let time = chain.dte as f64 / 365.0;
        let probability_of_profit = self.model.prob_within(
            spot,
            lower_breakeven.try_into().unwrap_or(0.0),
            upper_breakeven.try_into().unwrap_or(f64::MAX),
            avg_iv,
            time,
        );

        Ok(StrategyParameters {
            strategy,
            sell_strike: Some(body_put),
            buy_strike: Some(wing_put),
            option_type: Some(OptionType::Put),
            target_credit: credit,
            max_loss,
            max_profit: credit,
            return_on_risk: ratio(credit, max_loss),
            days_to_expiration: chain.dte,
            expiration: chain.expiration,
            breakeven: lower_breakeven,
            probability_of_profit,
        })
    }

    /// Calendar spreads need a second expiration the slice does not carry,
    /// so the debit and payoff are coarse estimates around the ATM strike.
    fn build_calendar(
        &self,
        snapshot: &MarketSnapshot,
        chain: &OptionChainSlice,
    ) -> Result<StrategyParameters, StrategyError> {
        let strategy = StrategyKind::CalendarSpread;
        let spot = snapshot.price_f64();

        let strike = self.nearest(chain, OptionType::Put, spot, strategy)?;

        let debit = (snapshot.price
            * Decimal::from_f64_retain(self.config.calendar_debit_fraction).unwrap_or_default())
        .round_dp(2);
        let max_profit = (debit * Decimal::from(3) / Decimal::from(2)).round_dp(2);

        Ok(StrategyParameters {
            strategy,
            sell_strike: Some(strike),
            buy_strike: Some(strike),
            option_type: Some(OptionType::Put),
            target_credit: debit,
            max_loss: debit,
            max_profit,
            return_on_risk: ratio(max_profit, debit),
            days_to_expiration: chain.dte,
            expiration: chain.expiration,
            breakeven: strike,
            probability_of_profit: 0.5,
        })
    }
}

fn ratio(numerator: Decimal, denominator: Decimal) -> f64 {
    let n: f64 = numerator.try_into().unwrap_or(0.0);
    let d: f64 = denominator.try_into().unwrap_or(0.0);
    if d > 0.0 {
        n / d
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn snapshot(price: Decimal, vix: f64) -> MarketSnapshot {
        MarketSnapshot {
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            price,
            sma_50: 595.0,
            sma_200: 570.0,
            macd: 3.0,
            rsi: 55.0,
            adx: 28.0,
            plus_di: 25.0,
            minus_di: 15.0,
            vix,
            vix_percentile: 60.0,
            volume: 40_000_000,
        }
    }

    fn quoted_chain(spot: Decimal) -> OptionChainSlice {
        let exp = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let mut chain = OptionChainSlice::new(exp, 28, spot);

        for i in 0..21 {
            let strike = Decimal::from(550 + i * 5);
            // Put premium rises with strike, call premium falls.
            let put_bid = Decimal::from(i) * dec!(0.40) + dec!(0.50);
            let call_bid = Decimal::from(20 - i) * dec!(0.40) + dec!(0.50);

            chain.add_quote(OptionQuote {
                strike,
                option_type: OptionType::Put,
                bid: put_bid,
                ask: put_bid + dec!(0.10),
                last: put_bid,
                volume: 500,
                open_interest: 2000,
                implied_volatility: 0.18,
                greeks: None,
            });
            chain.add_quote(OptionQuote {
                strike,
                option_type: OptionType::Call,
                bid: call_bid,
                ask: call_bid + dec!(0.10),
                last: call_bid,
                volume: 500,
                open_interest: 2000,
                implied_volatility: 0.16,
                greeks: None,
            });
        }

        chain
    }

    fn builder() -> ParameterBuilder {
        ParameterBuilder::new(PricingModel::default(), StrategyConfig::default())
    }

    #[test]
    fn test_bull_put_spread_from_quotes() {
        let spot = dec!(603.75);
        let snapshot = snapshot(spot, 18.0);
        let chain = quoted_chain(spot);

        let params = builder()
            .build(StrategyKind::BullPutSpread, &snapshot, &chain)
            .unwrap();

        // 2% below 603.75 is 591.68 -> strike 590; 4% below is 579.6 -> 580.
        assert_eq!(params.sell_strike, Some(dec!(590)));
        assert_eq!(params.buy_strike, Some(dec!(580)));
        assert_eq!(params.option_type, Some(OptionType::Put));

        assert!(params.target_credit > Decimal::ZERO);
        assert_eq!(params.max_loss, dec!(10) - params.target_credit);
        assert_eq!(params.breakeven, dec!(590) - params.target_credit);
        assert!(params.probability_of_profit > 0.5);
        assert!(params.validate(spot).is_ok());
    }

    #[test]
    fn test_bear_call_spread_breakeven_above_spot() {
        let spot = dec!(603.75);
        let snapshot = snapshot(spot, 28.0);
        let chain = quoted_chain(spot);

        let params = builder()
            .build(StrategyKind::BearCallSpread, &snapshot, &chain)
            .unwrap();

        assert!(params.breakeven > spot);
        assert!(params.validate(spot).is_ok());
    }

    #[test]
    fn test_debit_vertical_risk_is_the_debit() {
        let spot = dec!(603.75);
        let snapshot = snapshot(spot, 13.0);
        let chain = quoted_chain(spot);

        let params = builder()
            .build(StrategyKind::BullCallSpread, &snapshot, &chain)
            .unwrap();

        assert_eq!(params.max_loss, params.target_credit);
        assert!(params.max_profit > Decimal::ZERO);
        assert!(params.breakeven > params.buy_strike.unwrap());
        assert!(params.validate(spot).is_ok());
    }

    #[test]
    fn test_condor_combines_both_sides() {
        let spot = dec!(603.75);
        let snapshot = snapshot(spot, 32.0);
        let chain = quoted_chain(spot);

        let params = builder()
            .build(StrategyKind::IronCondor, &snapshot, &chain)
            .unwrap();

        assert!(params.target_credit > Decimal::ZERO);
        assert!(params.breakeven < spot);
        assert!(params.probability_of_profit > 0.0 && params.probability_of_profit <= 1.0);
        assert!(params.validate(spot).is_ok());
    }

    #[test]
    fn test_unquoted_chain_falls_back_to_model() {
        let spot = dec!(603.75);
        let snapshot = snapshot(spot, 20.0);
        let exp = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let mut chain = OptionChainSlice::new(exp, 28, spot);

        for i in 0..21 {
            chain.add_quote(OptionQuote {
                strike: Decimal::from(550 + i * 5),
                option_type: OptionType::Put,
                bid: Decimal::ZERO,
                ask: Decimal::ZERO,
                last: Decimal::ZERO,
                volume: 0,
                open_interest: 0,
                implied_volatility: 0.18,
                greeks: None,
            });
        }

        let params = builder()
            .build(StrategyKind::BullPutSpread, &snapshot, &chain)
            .unwrap();

        assert!(params.target_credit > Decimal::ZERO);
        assert!(params.target_credit < params.width().unwrap());
        assert!(params.validate(spot).is_ok());
    }

    #[test]
    fn test_empty_chain_is_strategy_error() {
        let spot = dec!(603.75);
        let snapshot = snapshot(spot, 20.0);
        let exp = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let chain = OptionChainSlice::new(exp, 28, spot);

        let err = builder()
            .build(StrategyKind::BullPutSpread, &snapshot, &chain)
            .unwrap_err();
        assert!(matches!(err, StrategyError::NoValidStrikes { .. }));
    }

    #[test]
    fn test_no_trade_has_no_builder() {
        let spot = dec!(603.75);
        let snapshot = snapshot(spot, 20.0);
        let chain = quoted_chain(spot);

        let err = builder()
            .build(StrategyKind::NoTrade, &snapshot, &chain)
            .unwrap_err();
        assert!(matches!(
            err,
            StrategyError::Unsupported(StrategyKind::NoTrade)
        ));
    }

    #[test]
    fn test_validation_rejects_negative_max_loss() {
        let spot = dec!(603.75);
        let snapshot = snapshot(spot, 18.0);
        let chain = quoted_chain(spot);

        let mut params = builder()
            .build(StrategyKind::BullPutSpread, &snapshot, &chain)
            .unwrap();
        params.max_loss = dec!(-1);

        assert!(matches!(
            params.validate(spot),
            Err(ValidationError::NegativeMaxLoss(_))
        ));
    }

    #[test]
    fn test_validation_rejects_wrong_side_breakeven() {
        let spot = dec!(603.75);
        let snapshot = snapshot(spot, 18.0);
        let chain = quoted_chain(spot);

        let mut params = builder()
            .build(StrategyKind::BullPutSpread, &snapshot, &chain)
            .unwrap();
        params.breakeven = dec!(610);

        assert!(matches!(
            params.validate(spot),
            Err(ValidationError::BreakevenWrongSide { .. })
        ));
    }
}
