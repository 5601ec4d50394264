//! Volatility regime classification.
//!
//! Buckets the volatility index and its trailing-year percentile into
//! coarse regimes and produces the bounded sizing adjustments the risk
//! module applies downstream.

use serde::{Deserialize, Serialize};

/// Volatility index regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolatilityRegime {
    /// Index below the low threshold.
    Low,
    /// Between thresholds.
    Medium,
    /// Index above the high threshold.
    High,
}

impl VolatilityRegime {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// High-vol regimes favor selling premium; low-vol favors buying it.
    pub fn favors_premium_selling(&self) -> bool {
        matches!(self, Self::High)
    }
}

/// Percentile band of the volatility index within its trailing year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PercentileBand {
    /// Percentile <= 30.
    Low,
    Mid,
    /// Percentile >= 70.
    High,
}

/// Thresholds for regime bucketing and adjustment multipliers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    /// Below this the regime is LOW.
    pub low_threshold: f64,
    /// Above this the regime is HIGH.
    pub high_threshold: f64,
    /// Index level below which the level adjustment damps to 0.8.
    pub damp_level: f64,
    /// Index level above which the level adjustment boosts to 1.2.
    pub boost_level: f64,
    /// Percentile at or below which the band is LOW.
    pub percentile_low: f64,
    /// Percentile at or above which the band is HIGH.
    pub percentile_high: f64,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            low_threshold: 15.0,
            high_threshold: 25.0,
            damp_level: 15.0,
            boost_level: 30.0,
            percentile_low: 30.0,
            percentile_high: 70.0,
        }
    }
}

/// Result of classifying one volatility observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityAssessment {
    pub regime: VolatilityRegime,
    pub percentile_band: PercentileBand,
    /// Multiplier from the raw index level, one of 0.8 / 1.0 / 1.2.
    pub level_adjustment: f64,
    /// Multiplier from the percentile rank, one of 0.8 / 1.0 / 1.2.
    pub percentile_adjustment: f64,
}

impl VolatilityAssessment {
    /// Combined adjustment, bounded to [0.5, 1.5].
    pub fn combined_adjustment(&self) -> f64 {
        (self.level_adjustment * self.percentile_adjustment).clamp(0.5, 1.5)
    }
}

/// Classify a volatility index level and percentile rank.
pub fn assess(vix: f64, percentile: f64, config: &VolatilityConfig) -> VolatilityAssessment {
    let regime = if vix < config.low_threshold {
        VolatilityRegime::Low
    } else if vix > config.high_threshold {
        VolatilityRegime::High
    } else {
        VolatilityRegime::Medium
    };

    let percentile_band = if percentile <= config.percentile_low {
        PercentileBand::Low
    } else if percentile >= config.percentile_high {
        PercentileBand::High
    } else {
        PercentileBand::Mid
    };

    let level_adjustment = if vix < config.damp_level {
        0.8
    } else if vix > config.boost_level {
        1.2
    } else {
        1.0
    };

    let percentile_adjustment = if percentile < config.percentile_low {
        0.8
    } else if percentile > config.percentile_high {
        1.2
    } else {
        1.0
    };

    VolatilityAssessment {
        regime,
        percentile_band,
        level_adjustment,
        percentile_adjustment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regime_buckets() {
        let config = VolatilityConfig::default();
        assert_eq!(assess(12.0, 50.0, &config).regime, VolatilityRegime::Low);
        assert_eq!(assess(20.0, 50.0, &config).regime, VolatilityRegime::Medium);
        assert_eq!(assess(32.0, 50.0, &config).regime, VolatilityRegime::High);
    }

    #[test]
    fn test_boundary_values_are_medium() {
        let config = VolatilityConfig::default();
        assert_eq!(assess(15.0, 50.0, &config).regime, VolatilityRegime::Medium);
        assert_eq!(assess(25.0, 50.0, &config).regime, VolatilityRegime::Medium);
    }

    #[test]
    fn test_level_adjustments() {
        let config = VolatilityConfig::default();
        assert_eq!(assess(12.0, 50.0, &config).level_adjustment, 0.8);
        assert_eq!(assess(20.0, 50.0, &config).level_adjustment, 1.0);
        assert_eq!(assess(35.0, 50.0, &config).level_adjustment, 1.2);
    }

    #[test]
    fn test_percentile_bands_and_adjustments() {
        let config = VolatilityConfig::default();

        let low = assess(20.0, 25.0, &config);
        assert_eq!(low.percentile_band, PercentileBand::Low);
        assert_eq!(low.percentile_adjustment, 0.8);

        let high = assess(20.0, 85.0, &config);
        assert_eq!(high.percentile_band, PercentileBand::High);
        assert_eq!(high.percentile_adjustment, 1.2);

        // Inclusive band boundaries, exclusive adjustment boundaries.
        let edge = assess(20.0, 70.0, &config);
        assert_eq!(edge.percentile_band, PercentileBand::High);
        assert_eq!(edge.percentile_adjustment, 1.0);
    }

    #[test]
    fn test_combined_adjustment_bounded() {
        let config = VolatilityConfig::default();
        let boosted = assess(40.0, 95.0, &config);
        assert!((boosted.combined_adjustment() - 1.44).abs() < 1e-9);

        let damped = assess(10.0, 5.0, &config);
        assert!((damped.combined_adjustment() - 0.64).abs() < 1e-9);

        assert!(boosted.combined_adjustment() <= 1.5);
        assert!(damped.combined_adjustment() >= 0.5);
    }
}
