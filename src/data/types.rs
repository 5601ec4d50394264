//! Core data types for signal evaluation and spread backtesting.
//!
//! Prices, strikes and account balances are `Decimal`; volatilities,
//! probabilities and scores are `f64`. Snapshots and chain slices are
//! produced by the data collaborator and consumed read-only.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "C" | "CALL" => Some(Self::Call),
            "P" | "PUT" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }
}

/// Greeks for an option contract, when the provider supplies them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
}

/// One technical observation of the underlying at a point in time.
///
/// Built by the data collaborator from raw series; every core component
/// reads it, none mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Observation date.
    pub date: NaiveDate,

    /// Underlying price.
    pub price: Decimal,

    /// 50-period simple moving average.
    pub sma_50: f64,

    /// 200-period simple moving average.
    pub sma_200: f64,

    /// MACD line value (EMA12 - EMA26).
    pub macd: f64,

    /// RSI over the configured period.
    pub rsi: f64,

    /// ADX trend strength.
    pub adx: f64,

    /// Plus directional indicator.
    pub plus_di: f64,

    /// Minus directional indicator.
    pub minus_di: f64,

    /// Volatility index level (VIX-style scale).
    pub vix: f64,

    /// Rank of the volatility index in its trailing one-year window (0-100).
    pub vix_percentile: f64,

    /// Traded volume of the underlying.
    pub volume: i64,
}

impl MarketSnapshot {
    /// Underlying price as f64 for ratio math.
    pub fn price_f64(&self) -> f64 {
        self.price.try_into().unwrap_or(0.0)
    }
}

/// A single option quote within a chain slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionQuote {
    /// Strike price.
    pub strike: Decimal,

    /// Option type (call or put).
    pub option_type: OptionType,

    /// Bid price.
    pub bid: Decimal,

    /// Ask price.
    pub ask: Decimal,

    /// Last traded price.
    pub last: Decimal,

    /// Trading volume.
    pub volume: i64,

    /// Open interest.
    pub open_interest: i64,

    /// Implied volatility (annualized, e.g. 0.18).
    pub implied_volatility: f64,

    /// Greeks, when the provider supplies them.
    pub greeks: Option<Greeks>,
}

impl OptionQuote {
    /// Mid price, zero when the market is one-sided.
    pub fn mid(&self) -> Decimal {
        if self.bid.is_zero() || self.ask.is_zero() {
            return Decimal::ZERO;
        }
        (self.bid + self.ask) / Decimal::from(2)
    }

    /// Whether both sides of the market are quoted.
    pub fn is_two_sided(&self) -> bool {
        self.bid > Decimal::ZERO && self.ask > Decimal::ZERO
    }
}

/// All quotes for one expiration date, grouped by type and keyed by strike.
///
/// Strikes are unique per type; the slice is immutable once fetched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionChainSlice {
    /// Expiration date for this slice.
    pub expiration: NaiveDate,

    /// Days to expiration at fetch time.
    pub dte: i64,

    /// Underlying price at fetch time.
    pub underlying_price: Decimal,

    /// IV percentile of the underlying (0-100).
    pub iv_percentile: f64,

    /// Put/call volume ratio across the slice.
    pub put_call_ratio: f64,

    /// Call quotes sorted by strike.
    pub calls: Vec<OptionQuote>,

    /// Put quotes sorted by strike.
    pub puts: Vec<OptionQuote>,
}

impl OptionChainSlice {
    pub fn new(expiration: NaiveDate, dte: i64, underlying_price: Decimal) -> Self {
        Self {
            expiration,
            dte,
            underlying_price,
            ..Default::default()
        }
    }

    /// Add a quote to the appropriate side, keeping strikes sorted and unique.
    pub fn add_quote(&mut self, quote: OptionQuote) {
        let side = match quote.option_type {
            OptionType::Call => &mut self.calls,
            OptionType::Put => &mut self.puts,
        };
        match side.binary_search_by(|q| q.strike.cmp(&quote.strike)) {
            Ok(idx) => side[idx] = quote,
            Err(idx) => side.insert(idx, quote),
        }
    }

    /// All distinct strikes for one option type.
    pub fn strikes(&self, option_type: OptionType) -> Vec<Decimal> {
        match option_type {
            OptionType::Call => self.calls.iter().map(|q| q.strike).collect(),
            OptionType::Put => self.puts.iter().map(|q| q.strike).collect(),
        }
    }

    /// Find a quote at an exact strike.
    pub fn quote_at(&self, option_type: OptionType, strike: Decimal) -> Option<&OptionQuote> {
        let side = match option_type {
            OptionType::Call => &self.calls,
            OptionType::Put => &self.puts,
        };
        side.iter().find(|q| q.strike == strike)
    }

    /// Find the strike nearest a target price, if the side has any quotes.
    pub fn nearest_strike(&self, option_type: OptionType, target: Decimal) -> Option<Decimal> {
        let side = match option_type {
            OptionType::Call => &self.calls,
            OptionType::Put => &self.puts,
        };
        side.iter()
            .map(|q| q.strike)
            .min_by_key(|s| (*s - target).abs())
    }

    /// Total number of quotes in this slice.
    pub fn total_quotes(&self) -> usize {
        self.calls.len() + self.puts.len()
    }
}

/// Daily bar for the underlying, as read from history files.
///
/// `vix` rides along per bar so the simulator can classify volatility
/// without a second data stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
    pub vix: f64,
}

impl DailyBar {
    pub fn close_f64(&self) -> f64 {
        self.close.try_into().unwrap_or(0.0)
    }

    pub fn high_f64(&self) -> f64 {
        self.high.try_into().unwrap_or(0.0)
    }

    pub fn low_f64(&self) -> f64 {
        self.low.try_into().unwrap_or(0.0)
    }
}
