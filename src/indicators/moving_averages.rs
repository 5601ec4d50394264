//! Simple and exponential moving averages, and the MACD line.

use super::IndicatorError;

/// Simple moving average over a rolling window.
///
/// Returns one value per full window, so the output has
/// `series.len() - period + 1` elements.
pub fn sma(series: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    if period == 0 || series.len() < period {
        return Err(IndicatorError::InsufficientData {
            required: period.max(1),
            actual: series.len(),
        });
    }

    let mut out = Vec::with_capacity(series.len() - period + 1);
    let mut sum: f64 = series[..period].iter().sum();
    out.push(sum / period as f64);

    for i in period..series.len() {
        sum += series[i] - series[i - period];
        out.push(sum / period as f64);
    }

    Ok(out)
}

/// Exponential moving average, seeded with the first raw value.
///
/// Smoothing constant k = 2 / (period + 1). Output length matches the input.
pub fn ema(series: &[f64], period: usize) -> Vec<f64> {
    if series.is_empty() || period == 0 {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(series.len());
    let mut value = series[0];
    out.push(value);

    for &x in &series[1..] {
        value = x * k + value * (1.0 - k);
        out.push(value);
    }

    out
}

/// MACD line with the standard 12/26 periods.
pub fn macd_line(series: &[f64]) -> Vec<f64> {
    macd_line_with(series, 12, 26)
}

/// MACD line: EMA(fast) - EMA(slow), pointwise.
pub fn macd_line_with(series: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    let fast = ema(series, fast);
    let slow = ema(series, slow);
    fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sma_window_lengths() {
        let series: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        for period in 1..=10 {
            let out = sma(&series, period).unwrap();
            assert_eq!(out.len(), series.len() - period + 1);
        }
    }

    #[test]
    fn test_sma_values() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(out, vec![1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let err = sma(&[1.0, 2.0], 3).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::InsufficientData {
                required: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_ema_seeded_with_first_value() {
        let series = [10.0, 11.0, 12.0];
        let out = ema(&series, 9);
        assert_eq!(out[0], 10.0);

        // k = 2/10 = 0.2: 11*0.2 + 10*0.8 = 10.2
        assert_relative_eq!(out[1], 10.2, epsilon = 1e-12);
    }

    #[test]
    fn test_ema_constant_series() {
        let out = ema(&[5.0; 40], 12);
        assert!(out.iter().all(|&v| (v - 5.0).abs() < 1e-12));
    }

    #[test]
    fn test_macd_sign_tracks_trend() {
        let rising: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let macd = macd_line(&rising);
        assert_eq!(macd.len(), rising.len());
        assert!(*macd.last().unwrap() > 0.0);

        let falling: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        assert!(*macd_line(&falling).last().unwrap() < 0.0);
    }
}
