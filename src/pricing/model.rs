//! Lognormal option pricing and probability-of-profit.
//!
//! A Black-Scholes-style model with zero rate and dividend defaults.
//! This is deliberately a screening model, not a derivatives engine:
//! good enough to rank spreads and estimate the odds that a breakeven
//! holds to expiration.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::data::OptionType;

/// Pricing model under a lognormal diffusion approximation.
#[derive(Debug, Clone, Copy)]
pub struct PricingModel {
    /// Risk-free interest rate.
    pub rate: f64,
    /// Dividend yield.
    pub dividend: f64,
}

impl Default for PricingModel {
    fn default() -> Self {
        Self {
            rate: 0.0,
            dividend: 0.0,
        }
    }
}

/// Theoretical pricing of a two-leg credit vertical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalPricing {
    /// Net credit per share (short leg value minus long leg value).
    pub credit: f64,
    /// Breakeven price implied by the credit.
    pub breakeven: f64,
    /// Probability the breakeven holds to expiration, in [0, 1].
    pub probability_of_profit: f64,
}

impl PricingModel {
    pub fn new(rate: f64, dividend: f64) -> Self {
        Self { rate, dividend }
    }

    fn d1(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        let numerator = (spot / strike).ln() + (self.rate - self.dividend + 0.5 * vol * vol) * time;
        numerator / (vol * time.sqrt())
    }

    fn d2(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        self.d1(spot, strike, time, vol) - vol * time.sqrt()
    }

    fn norm_cdf(x: f64) -> f64 {
        let normal = Normal::new(0.0, 1.0).unwrap();
        normal.cdf(x)
    }

    /// Put value; collapses to intrinsic at or past expiry.
    pub fn put_price(&self, spot: f64, strike: f64, vol: f64, time: f64) -> f64 {
        if time <= 0.0 || vol <= 0.0 {
            return (strike - spot).max(0.0);
        }

        let d1 = self.d1(spot, strike, time, vol);
        let d2 = self.d2(spot, strike, time, vol);

        strike * (-self.rate * time).exp() * Self::norm_cdf(-d2)
            - spot * (-self.dividend * time).exp() * Self::norm_cdf(-d1)
    }

    /// Call value; collapses to intrinsic at or past expiry.
    pub fn call_price(&self, spot: f64, strike: f64, vol: f64, time: f64) -> f64 {
        if time <= 0.0 || vol <= 0.0 {
            return (spot - strike).max(0.0);
        }

        let d1 = self.d1(spot, strike, time, vol);
        let d2 = self.d2(spot, strike, time, vol);

        spot * (-self.dividend * time).exp() * Self::norm_cdf(d1)
            - strike * (-self.rate * time).exp() * Self::norm_cdf(d2)
    }

    pub fn price(&self, spot: f64, strike: f64, vol: f64, time: f64, opt_type: OptionType) -> f64 {
        match opt_type {
            OptionType::Call => self.call_price(spot, strike, vol, time),
            OptionType::Put => self.put_price(spot, strike, vol, time),
        }
    }

    /// Probability the terminal price finishes above `level`, ignoring
    /// drift: N(ln(spot/level) / (vol * sqrt(T))).
    pub fn prob_above(&self, spot: f64, level: f64, vol: f64, time: f64) -> f64 {
        if spot <= 0.0 || level <= 0.0 {
            return 0.0;
        }
        if time <= 0.0 || vol <= 0.0 {
            return if spot > level { 1.0 } else { 0.0 };
        }
        Self::norm_cdf((spot / level).ln() / (vol * time.sqrt())).clamp(0.0, 1.0)
    }

    /// Probability the terminal price finishes below `level`.
    pub fn prob_below(&self, spot: f64, level: f64, vol: f64, time: f64) -> f64 {
        1.0 - self.prob_above(spot, level, vol, time)
    }

    /// Probability the terminal price stays within (lower, upper).
    pub fn prob_within(&self, spot: f64, lower: f64, upper: f64, vol: f64, time: f64) -> f64 {
        (self.prob_above(spot, lower, vol, time) - self.prob_above(spot, upper, vol, time))
            .clamp(0.0, 1.0)
    }

    /// Price a defined-risk credit vertical from its leg IVs.
    ///
    /// The short and long legs are valued with their own implied
    /// volatilities; the credit is their difference. The breakeven shifts
    /// from the short strike by the credit, and the probability of profit
    /// is the standardized distance from spot to breakeven under the
    /// average of the two leg IVs.
    pub fn price_credit_vertical(
        &self,
        spot: f64,
        short_strike: f64,
        long_strike: f64,
        short_iv: f64,
        long_iv: f64,
        dte_days: i64,
        option_type: OptionType,
    ) -> VerticalPricing {
        let time = dte_days as f64 / 365.0;
        let short_value = self.price(spot, short_strike, short_iv, time, option_type);
        let long_value = self.price(spot, long_strike, long_iv, time, option_type);
        let credit = (short_value - long_value).max(0.0);

        let avg_iv = (short_iv + long_iv) / 2.0;
        let (breakeven, probability_of_profit) = match option_type {
            // Bull put: profitable while price holds above short - credit.
            OptionType::Put => {
                let breakeven = short_strike - credit;
                (breakeven, self.prob_above(spot, breakeven, avg_iv, time))
            }
            // Bear call: profitable while price holds below short + credit.
            OptionType::Call => {
                let breakeven = short_strike + credit;
                (breakeven, self.prob_below(spot, breakeven, avg_iv, time))
            }
        };

        VerticalPricing {
            credit,
            breakeven,
            probability_of_profit: probability_of_profit.clamp(0.0, 1.0),
        }
    }
}
