//! Momentum oscillators.

/// Relative Strength Index over the trailing window.
///
/// Uses simple averages of gains and losses across the last `period`
/// deltas: RS = avg_gain / avg_loss, RSI = 100 - 100/(1+RS). With no
/// losses in the window the reading is 100; with fewer than `period + 1`
/// points the series cannot support a reading and a neutral 50 is
/// returned instead of failing.
pub fn rsi(series: &[f64], period: usize) -> f64 {
    if period == 0 || series.len() < period + 1 {
        return 50.0;
    }

    let window = &series[series.len() - period - 1..];
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;

    for pair in window.windows(2) {
        let delta = pair[1] - pair[0];
        if delta > 0.0 {
            gain_sum += delta;
        } else {
            loss_sum -= delta;
        }
    }

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rsi_all_gains_is_100() {
        let series: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_relative_eq!(rsi(&series, 14), 100.0);
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let series: Vec<f64> = (0..20).map(|i| 200.0 - i as f64).collect();
        assert_relative_eq!(rsi(&series, 14), 0.0);
    }

    #[test]
    fn test_rsi_short_series_neutral() {
        assert_relative_eq!(rsi(&[100.0, 101.0, 102.0], 14), 50.0);
        assert_relative_eq!(rsi(&[], 14), 50.0);
    }

    #[test]
    fn test_rsi_bounded() {
        let series = [
            100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0, 85.0, 125.0, 80.0, 130.0, 75.0,
            135.0, 70.0, 140.0,
        ];
        let value = rsi(&series, 14);
        assert!((0.0..=100.0).contains(&value));
    }

    #[test]
    fn test_rsi_balanced_moves_near_50() {
        // Alternating +1/-1: equal gains and losses, RS = 1.
        let mut series = vec![100.0];
        for i in 0..20 {
            let last = *series.last().unwrap();
            series.push(if i % 2 == 0 { last + 1.0 } else { last - 1.0 });
        }
        assert_relative_eq!(rsi(&series, 14), 50.0, epsilon = 1e-9);
    }
}
