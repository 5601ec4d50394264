//! Technical indicator library.
//!
//! Pure functions over raw price/volume series. SMA fails loudly when the
//! window exceeds the series; RSI and ADX degrade to neutral/zero readings
//! instead, so a thin warmup never aborts a whole evaluation cycle.

pub mod moving_averages;
pub mod oscillators;
pub mod trend;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use moving_averages::{ema, macd_line, macd_line_with, sma};
pub use oscillators::rsi;
pub use trend::{adx, AdxReading};

/// Lookback periods used when rebuilding snapshots from raw series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorPeriods {
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub adx: usize,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        Self {
            sma_short: 50,
            sma_long: 200,
            rsi: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            adx: 14,
        }
    }
}

/// Errors from indicator computation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("insufficient data: need {required} points, have {actual}")]
    InsufficientData { required: usize, actual: usize },
}
