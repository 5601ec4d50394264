//! Market bias and signal strength.
//!
//! Signal strength is a weighted sum of independent evidence sources,
//! clamped to [0, 5]; the nominal weights sum to exactly 5.0. Bias is a
//! majority vote over discrete directional signals, with trend votes
//! counting double when ADX marks a strong trend. Ties resolve NEUTRAL.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::MarketSnapshot;

/// Directional read of the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketBias {
    Bullish,
    Bearish,
    Neutral,
}

impl MarketBias {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bullish => "BULLISH",
            Self::Bearish => "BEARISH",
            Self::Neutral => "NEUTRAL",
        }
    }
}

/// Tunables for the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// |MACD| above this is a strong momentum reading.
    pub macd_strong_threshold: f64,
    /// RSI at or below this is oversold.
    pub rsi_oversold: f64,
    /// RSI at or above this is overbought.
    pub rsi_overbought: f64,
    /// ADX at or above this marks a strong trend (doubles trend votes).
    pub adx_trend_threshold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            macd_strong_threshold: 10.0,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            adx_trend_threshold: 25.0,
        }
    }
}

/// Evidence-weighted signal strength in [0, 5].
pub fn signal_strength(snapshot: &MarketSnapshot, config: &SignalConfig) -> f64 {
    let price = snapshot.price_f64();

    // Moving-average alignment: 1.5 for a fully stacked trend, 0.75 for
    // price holding one side of the 200-period average.
    let ma_score = if (price > snapshot.sma_50 && snapshot.sma_50 > snapshot.sma_200)
        || (price < snapshot.sma_50 && snapshot.sma_50 < snapshot.sma_200)
    {
        1.5
    } else if price != snapshot.sma_200 {
        0.75
    } else {
        0.0
    };

    let macd_score = if snapshot.macd.abs() > config.macd_strong_threshold {
        1.0
    } else if snapshot.macd != 0.0 {
        0.5
    } else {
        0.0
    };

    let rsi_score = if snapshot.rsi < config.rsi_oversold {
        0.75
    } else if snapshot.rsi > config.rsi_overbought {
        -0.75
    } else if (40.0..=60.0).contains(&snapshot.rsi) {
        0.25
    } else {
        0.0
    };

    // Non-monotonic: complacency and fear are both tradeable regimes.
    let vix_score = if snapshot.vix > 30.0 {
        0.9
    } else if snapshot.vix > 25.0 {
        0.6
    } else if snapshot.vix < 15.0 {
        0.5
    } else {
        0.2
    };

    let adx_score = match snapshot.adx {
        a if a < 20.0 => -0.25,
        a if a < 25.0 => 0.2,
        a if a < 50.0 => 0.6,
        a if a < 75.0 => 0.85,
        // Readings this extreme usually mark an exhausted move.
        _ => 0.4,
    };

    let raw: f64 = ma_score + macd_score + rsi_score + vix_score + adx_score;
    let strength = raw.clamp(0.0, 5.0);

    debug!(
        ma_score,
        macd_score, rsi_score, vix_score, adx_score, strength, "signal strength components"
    );

    strength
}

/// Majority-vote market bias.
pub fn market_bias(snapshot: &MarketSnapshot, config: &SignalConfig) -> MarketBias {
    let price = snapshot.price_f64();
    let trend_weight = if snapshot.adx >= config.adx_trend_threshold {
        2
    } else {
        1
    };

    let mut votes: i32 = 0;

    if price > snapshot.sma_50 && snapshot.sma_50 > snapshot.sma_200 {
        votes += trend_weight;
    } else if price < snapshot.sma_50 && snapshot.sma_50 < snapshot.sma_200 {
        votes -= trend_weight;
    }

    if snapshot.macd > 0.0 {
        votes += 1;
    } else if snapshot.macd < 0.0 {
        votes -= 1;
    }

    // RSI extremes vote for mean reversion, against the prevailing move.
    if snapshot.rsi <= config.rsi_oversold {
        votes += 1;
    } else if snapshot.rsi >= config.rsi_overbought {
        votes -= 1;
    }

    if snapshot.plus_di > snapshot.minus_di {
        votes += trend_weight;
    } else if snapshot.minus_di > snapshot.plus_di {
        votes -= trend_weight;
    }

    match votes.cmp(&0) {
        std::cmp::Ordering::Greater => MarketBias::Bullish,
        std::cmp::Ordering::Less => MarketBias::Bearish,
        std::cmp::Ordering::Equal => MarketBias::Neutral,
    }
}
