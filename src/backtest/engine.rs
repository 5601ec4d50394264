//! Backtest simulation engine.
//!
//! Walks historical daily bars strictly in order. Each eligible day:
//! 1. Rebuild the technical snapshot from the trailing series
//! 2. Gate on minimum signal strength
//! 3. Select a strategy and build parameters against a synthetic ladder
//! 4. Size the position against the running balance and drawdown
//! 5. Scan forward for stop, target, or time exit and realize the P&L
//!
//! A day that cannot open a trade is skipped, never fatal. Later days see
//! the balance and drawdown left behind by earlier ones, so the walk
//! cannot be parallelized.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::{DailyBar, MarketSnapshot, OptionChainSlice, OptionQuote, OptionType};
use crate::indicators::{adx, macd_line_with, rsi, sma, IndicatorPeriods};
use crate::pricing::PricingModel;
use crate::risk::{AccountInfo, AccountType, RiskConfig, RiskMetrics, RiskSizer};
use crate::signal::{
    assess, market_bias, signal_strength, SignalConfig, VolatilityConfig,
};
use crate::strategy::{
    select_strategy, ParameterBuilder, StrategyConfig, StrategyDirection, StrategyKind,
};

use super::trade::{ExitReason, TradeResult};

/// How often the simulator looks for entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySampling {
    /// Every trading day.
    Daily,
    /// First trading day on or after the 15th of each month.
    Monthly,
}

/// Configuration for a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Days below this signal strength stay idle.
    pub min_signal_strength: f64,
    /// Holding window for simulated positions.
    pub days_to_expiration: i64,
    pub sampling: EntrySampling,
    pub account_type: AccountType,
    /// Move band within which a neutral structure is profitable.
    pub neutral_profit_band: f64,
    /// Move beyond which a neutral structure is stopped.
    pub neutral_stop_band: f64,
    /// Synthetic strike ladder step as a fraction of spot.
    pub strike_step_fraction: f64,
    pub indicators: IndicatorPeriods,
    pub signal: SignalConfig,
    pub volatility: VolatilityConfig,
    pub strategy: StrategyConfig,
    pub risk: RiskConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            min_signal_strength: 1.0,
            days_to_expiration: 30,
            sampling: EntrySampling::Daily,
            account_type: AccountType::Medium,
            neutral_profit_band: 0.02,
            neutral_stop_band: 0.04,
            strike_step_fraction: 0.01,
            indicators: IndicatorPeriods::default(),
            signal: SignalConfig::default(),
            volatility: VolatilityConfig::default(),
            strategy: StrategyConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

/// Daily equity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub balance: Decimal,
    pub drawdown: f64,
}

/// Aggregate result of one backtest run. Derived entirely from the trade
/// log and the balance trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    /// (1 + mean per-trade return)^252 - 1.
    pub annualized_return: f64,
    /// Largest peak-to-trough drawdown, in [0, 1].
    pub max_drawdown: f64,
    /// Mean over stddev of per-trade returns, annualized by sqrt(252).
    /// Zero with fewer than two trades or zero dispersion.
    pub sharpe_ratio: f64,
    /// Gross profit over gross loss; zero when no losses were recorded.
    pub profit_factor: f64,
    pub trades: Vec<TradeResult>,
    pub equity_curve: Vec<EquityPoint>,
}

impl BacktestResult {
    /// Render a report in the usual terminal format.
    pub fn summary(&self) -> String {
        format!(
            "Backtest Results\n\
             ----------------------------------------\n\
             Initial Balance: ${:.2}\n\
             Final Balance: ${:.2}\n\
             Annualized Return: {:.2}%\n\
             Max Drawdown: {:.2}%\n\
             Sharpe Ratio: {:.2}\n\
             \n\
             Trades: {} (W: {}, L: {})\n\
             Win Rate: {:.1}%\n\
             Profit Factor: {:.2}",
            self.initial_balance,
            self.final_balance,
            self.annualized_return * 100.0,
            self.max_drawdown * 100.0,
            self.sharpe_ratio,
            self.total_trades,
            self.winning_trades,
            self.losing_trades,
            self.win_rate * 100.0,
            self.profit_factor,
        )
    }
}

/// The simulator. One instance per run; balance, peak and trade log live
/// only for the duration of that run.
pub struct BacktestEngine {
    config: BacktestConfig,
    sizer: RiskSizer,
    builder: ParameterBuilder,
    balance: Decimal,
    peak_balance: Decimal,
    current_drawdown: f64,
    max_drawdown: f64,
    trades: Vec<TradeResult>,
    trade_returns: Vec<f64>,
    equity_curve: Vec<EquityPoint>,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        let sizer = RiskSizer::new(config.risk.clone());
        let builder = ParameterBuilder::new(PricingModel::default(), config.strategy.clone());
        Self {
            config,
            sizer,
            builder,
            balance: Decimal::ZERO,
            peak_balance: Decimal::ZERO,
            current_drawdown: 0.0,
            max_drawdown: 0.0,
            trades: Vec::new(),
            trade_returns: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// Run the simulation over a daily-bar history.
    pub fn run(&mut self, bars: &[DailyBar], initial_balance: Decimal) -> BacktestResult {
        self.balance = initial_balance;
        self.peak_balance = initial_balance;
        self.current_drawdown = 0.0;
        self.max_drawdown = 0.0;
        self.trades.clear();
        self.trade_returns.clear();
        self.equity_curve.clear();

        let closes: Vec<f64> = bars.iter().map(DailyBar::close_f64).collect();
        let highs: Vec<f64> = bars.iter().map(DailyBar::high_f64).collect();
        let lows: Vec<f64> = bars.iter().map(DailyBar::low_f64).collect();

        // The long moving average is the longest lookback.
        let warmup = self.config.indicators.sma_long;
        let mut i = warmup;

        while i + 1 < bars.len() {
            if !self.is_entry_day(bars, i) {
                i += 1;
                continue;
            }

            let Some(snapshot) = self.build_snapshot(bars, &closes, &highs, &lows, i) else {
                i += 1;
                continue;
            };

            let strength = signal_strength(&snapshot, &self.config.signal);
            if strength < self.config.min_signal_strength {
                i += 1;
                continue;
            }

            match self.try_open_and_close(bars, &snapshot, strength, i) {
                Some(exit_index) => i = exit_index + 1,
                None => i += 1,
            }
        }

        let result = self.build_result(initial_balance);
        info!(
            trades = result.total_trades,
            win_rate = result.win_rate,
            "backtest complete"
        );
        result
    }

    fn is_entry_day(&self, bars: &[DailyBar], i: usize) -> bool {
        match self.config.sampling {
            EntrySampling::Daily => true,
            EntrySampling::Monthly => {
                let date = bars[i].date;
                if date.day() < 15 {
                    return false;
                }
                let prev = bars[i - 1].date;
                prev.month() != date.month() || prev.day() < 15
            }
        }
    }

    /// Rebuild the technical snapshot for day `i` from the trailing series.
    /// Returns None when the moving-average windows are not yet covered.
    fn build_snapshot(
        &self,
        bars: &[DailyBar],
        closes: &[f64],
        highs: &[f64],
        lows: &[f64],
        i: usize,
    ) -> Option<MarketSnapshot> {
        let history = &closes[..=i];
        let periods = &self.config.indicators;

        if history.len() < periods.sma_long.max(periods.sma_short) {
            return None;
        }
        let sma_50 = *sma(&history[history.len() - periods.sma_short..], periods.sma_short)
            .ok()?
            .last()?;
        let sma_200 = *sma(&history[history.len() - periods.sma_long..], periods.sma_long)
            .ok()?
            .last()?;
        let macd = *macd_line_with(history, periods.macd_fast, periods.macd_slow).last()?;
        let rsi_value = rsi(history, periods.rsi);
        let trend = adx(&highs[..=i], &lows[..=i], history, periods.adx);

        // Percentile of today's VIX within the trailing year.
        let window_start = i.saturating_sub(252);
        let window = &bars[window_start..i];
        let vix = bars[i].vix;
        let vix_percentile = if window.is_empty() {
            50.0
        } else {
            let below = window.iter().filter(|b| b.vix < vix).count();
            below as f64 / window.len() as f64 * 100.0
        };

        Some(MarketSnapshot {
            date: bars[i].date,
            price: bars[i].close,
            sma_50,
            sma_200,
            macd,
            rsi: rsi_value,
            adx: trend.adx,
            plus_di: trend.plus_di,
            minus_di: trend.minus_di,
            vix,
            vix_percentile,
            volume: bars[i].volume,
        })
    }

    /// Candidate through Closed: select, size, open, scan for the exit,
    /// book the trade. Returns the exit index, or None when the day could
    /// not open a position.
    fn try_open_and_close(
        &mut self,
        bars: &[DailyBar],
        snapshot: &MarketSnapshot,
        strength: f64,
        entry_index: usize,
    ) -> Option<usize> {
        let volatility = assess(
            snapshot.vix,
            snapshot.vix_percentile,
            &self.config.volatility,
        );
        let bias = market_bias(snapshot, &self.config.signal);
        let strategy = select_strategy(bias, &volatility, snapshot.rsi, &self.config.signal);
        if strategy == StrategyKind::NoTrade {
            return None;
        }

        let chain = self.synthetic_chain(snapshot);
        let params = match self.builder.build(strategy, snapshot, &chain) {
            Ok(params) => params,
            Err(err) => {
                debug!(date = %snapshot.date, %err, "skipping day");
                return None;
            }
        };
        if let Err(err) = params.validate(snapshot.price) {
            debug!(date = %snapshot.date, %err, "invalid parameters, skipping day");
            return None;
        }

        let account = AccountInfo {
            balance: self.balance,
            account_type: self.config.account_type,
            current_drawdown: self.current_drawdown,
        };
        let risk = self.sizer.compute(
            strength,
            &volatility,
            &account,
            snapshot.price,
            strategy.direction(),
            Some(params.max_loss),
        );

        // Contracts carry 100 shares of exposure per point of spread.
        let per_contract_risk = params.max_loss * Decimal::from(100);
        if per_contract_risk <= Decimal::ZERO {
            return None;
        }
        let contracts: i64 = (risk.max_risk / per_contract_risk)
            .floor()
            .try_into()
            .unwrap_or(0);
        if contracts < 1 {
            debug!(date = %snapshot.date, "risk budget below one contract, skipping day");
            return None;
        }

        let entry_price = snapshot.price;
        let direction = strategy.direction();
        let window_end = (entry_index + self.config.days_to_expiration as usize)
            .min(bars.len() - 1);
        let half_period = entry_index + (self.config.days_to_expiration as usize) / 2;

        let (exit_index, exit_reason, favorable) = self.scan_for_exit(
            bars,
            entry_index,
            window_end,
            half_period,
            entry_price,
            direction,
            &risk,
        );

        let payoff = if favorable {
            params.max_profit
        } else {
            -params.max_loss
        };
        let pnl = (payoff * Decimal::from(contracts) * Decimal::from(100)).round_dp(2);

        self.book_trade(TradeResult {
            entry_date: bars[entry_index].date,
            exit_date: bars[exit_index].date,
            strategy,
            entry_price,
            exit_price: bars[exit_index].close,
            contracts,
            pnl,
            exit_reason,
            risk,
        });

        Some(exit_index)
    }

    /// Walk forward from entry looking for, in priority order: stop-loss,
    /// profit target, half-period time exit. Falls back to a forced close
    /// at the end of the window or the end of data.
    #[allow(clippy::too_many_arguments)]
    fn scan_for_exit(
        &self,
        bars: &[DailyBar],
        entry_index: usize,
        window_end: usize,
        half_period: usize,
        entry_price: Decimal,
        direction: StrategyDirection,
        risk: &RiskMetrics,
    ) -> (usize, ExitReason, bool) {
        let entry_f: f64 = entry_price.try_into().unwrap_or(1.0);

        for j in entry_index + 1..=window_end {
            let close = bars[j].close;
            let move_pct = (bars[j].close_f64() - entry_f) / entry_f;

            let stopped = match direction {
                StrategyDirection::Bullish => close <= risk.stop_loss_price,
                StrategyDirection::Bearish => close >= risk.stop_loss_price,
                StrategyDirection::Neutral => move_pct.abs() >= self.config.neutral_stop_band,
            };
            if stopped {
                return (j, ExitReason::StopLoss, false);
            }

            let target_hit = match direction {
                StrategyDirection::Bullish => close >= risk.profit_target_price,
                StrategyDirection::Bearish => close <= risk.profit_target_price,
                // Neutral structures win by time passing, not by movement.
                StrategyDirection::Neutral => false,
            };
            if target_hit {
                return (j, ExitReason::ProfitTarget, true);
            }

            if j == half_period {
                let unprofitable = match direction {
                    StrategyDirection::Bullish => close <= entry_price,
                    StrategyDirection::Bearish => close >= entry_price,
                    StrategyDirection::Neutral => {
                        move_pct.abs() > self.config.neutral_profit_band
                    }
                };
                if unprofitable {
                    return (j, ExitReason::TimeExit, false);
                }
            }
        }

        // Forced close at the end of the window.
        let close = bars[window_end].close;
        let move_pct = (bars[window_end].close_f64() - entry_f) / entry_f;
        let favorable = match direction {
            StrategyDirection::Bullish => close > entry_price,
            StrategyDirection::Bearish => close < entry_price,
            StrategyDirection::Neutral => move_pct.abs() <= self.config.neutral_profit_band,
        };
        let reason = if window_end == entry_index + self.config.days_to_expiration as usize {
            ExitReason::Expiration
        } else {
            ExitReason::EndOfData
        };

        (window_end, reason, favorable)
    }

    fn book_trade(&mut self, trade: TradeResult) {
        let balance_before: f64 = self.balance.try_into().unwrap_or(1.0);
        let pnl: f64 = trade.pnl.try_into().unwrap_or(0.0);

        self.balance += trade.pnl;
        if self.balance > self.peak_balance {
            self.peak_balance = self.balance;
        }

        let peak: f64 = self.peak_balance.try_into().unwrap_or(1.0);
        let balance: f64 = self.balance.try_into().unwrap_or(0.0);
        self.current_drawdown = if peak > 0.0 {
            ((peak - balance) / peak).clamp(0.0, 1.0)
        } else {
            0.0
        };
        if self.current_drawdown > self.max_drawdown {
            self.max_drawdown = self.current_drawdown.clamp(0.0, 1.0);
        }

        if balance_before > 0.0 {
            self.trade_returns.push(pnl / balance_before);
        }

        self.equity_curve.push(EquityPoint {
            date: trade.exit_date,
            balance: self.balance,
            drawdown: self.current_drawdown,
        });
        self.trades.push(trade);
    }

    fn build_result(&self, initial_balance: Decimal) -> BacktestResult {
        let total_trades = self.trades.len();
        let winning_trades = self.trades.iter().filter(|t| t.is_winner()).count();
        let losing_trades = total_trades - winning_trades;
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64
        } else {
            0.0
        };

        let mean_return = if self.trade_returns.is_empty() {
            0.0
        } else {
            self.trade_returns.iter().sum::<f64>() / self.trade_returns.len() as f64
        };
        let annualized_return = if total_trades > 0 {
            (1.0 + mean_return).powf(252.0) - 1.0
        } else {
            0.0
        };

        let sharpe_ratio = if self.trade_returns.len() < 2 {
            0.0
        } else {
            let variance = self
                .trade_returns
                .iter()
                .map(|r| (r - mean_return).powi(2))
                .sum::<f64>()
                / self.trade_returns.len() as f64;
            let std_dev = variance.sqrt();
            if std_dev == 0.0 {
                0.0
            } else {
                mean_return / std_dev * 252.0_f64.sqrt()
            }
        };

        let gross_profit: f64 = self
            .trades
            .iter()
            .filter(|t| t.is_winner())
            .map(|t| t.pnl.try_into().unwrap_or(0.0))
            .sum();
        let gross_loss: f64 = self
            .trades
            .iter()
            .filter(|t| !t.is_winner())
            .map(|t| {
                let pnl: f64 = t.pnl.try_into().unwrap_or(0.0);
                pnl.abs()
            })
            .sum();
        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else {
            0.0
        };

        BacktestResult {
            initial_balance,
            final_balance: self.balance,
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            annualized_return,
            max_drawdown: self.max_drawdown,
            sharpe_ratio,
            profit_factor,
            trades: self.trades.clone(),
            equity_curve: self.equity_curve.clone(),
        }
    }

    /// Synthetic strike ladder around spot for days with no chain history.
    /// Quotes are one-sided with the day's VIX as implied volatility, which
    /// routes the parameter builder to its model-credit path.
    fn synthetic_chain(&self, snapshot: &MarketSnapshot) -> OptionChainSlice {
        let spot = snapshot.price_f64();
        let step = (spot * self.config.strike_step_fraction).round().max(1.0);
        let iv = (snapshot.vix / 100.0).max(0.05);
        let expiration = snapshot.date + Duration::days(self.config.days_to_expiration);

        let mut chain = OptionChainSlice::new(
            expiration,
            self.config.days_to_expiration,
            snapshot.price,
        );
        chain.iv_percentile = snapshot.vix_percentile;
        chain.put_call_ratio = 1.0;

        let mut strike = (spot * 0.80 / step).round() * step;
        let top = spot * 1.20;
        while strike <= top {
            let strike_dec = Decimal::from_f64_retain(strike).unwrap_or_default();
            for option_type in [OptionType::Put, OptionType::Call] {
                chain.add_quote(OptionQuote {
                    strike: strike_dec,
                    option_type,
                    bid: Decimal::ZERO,
                    ask: Decimal::ZERO,
                    last: Decimal::ZERO,
                    volume: 0,
                    open_interest: 0,
                    implied_volatility: iv,
                    greeks: None,
                });
            }
            strike += step;
        }

        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// Build a synthetic history: `warmup` flat-ish days, then a shaped
    /// segment controlled by `slope` per day.
    fn history(total: usize, slope: f64, vix: f64) -> Vec<DailyBar> {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let mut bars = Vec::with_capacity(total);
        let mut price = 400.0;

        for i in 0..total {
            if i >= 200 {
                price += slope;
            } else {
                // Mild chop during warmup keeps the oscillators off their rails.
                price += if i % 2 == 0 { 0.3 } else { -0.2 };
            }
            let close = Decimal::from_f64_retain(price).unwrap().round_dp(2);
            bars.push(DailyBar {
                date: start + Duration::days(i as i64),
                open: close - dec!(0.5),
                high: close + dec!(2),
                low: close - dec!(2),
                close,
                volume: 1_000_000,
                vix,
            });
        }
        bars
    }

    #[test]
    fn test_uptrend_produces_trades() {
        let bars = history(320, 1.5, 18.0);
        let mut engine = BacktestEngine::new(BacktestConfig::default());
        let result = engine.run(&bars, dec!(100_000));

        assert!(result.total_trades > 0);
        assert_eq!(
            result.total_trades,
            result.winning_trades + result.losing_trades
        );
        assert!((0.0..=1.0).contains(&result.win_rate));
    }

    #[test]
    fn test_drawdown_bounded() {
        let bars = history(400, -2.0, 28.0);
        let mut engine = BacktestEngine::new(BacktestConfig::default());
        let result = engine.run(&bars, dec!(100_000));

        assert!((0.0..=1.0).contains(&result.max_drawdown));
        for point in &result.equity_curve {
            assert!((0.0..=1.0).contains(&point.drawdown));
        }
    }

    #[test]
    fn test_sharpe_zero_with_few_trades() {
        // Too little history to ever open a trade.
        let bars = history(150, 1.0, 18.0);
        let mut engine = BacktestEngine::new(BacktestConfig::default());
        let result = engine.run(&bars, dec!(100_000));

        assert_eq!(result.total_trades, 0);
        assert_eq!(result.sharpe_ratio, 0.0);
        assert_eq!(result.win_rate, 0.0);
        assert_eq!(result.final_balance, dec!(100_000));
    }

    #[test]
    fn test_profit_factor_zero_without_losses() {
        let bars = history(280, 1.2, 16.0);
        let mut engine = BacktestEngine::new(BacktestConfig::default());
        let result = engine.run(&bars, dec!(100_000));

        if result.losing_trades == 0 {
            assert_eq!(result.profit_factor, 0.0);
        } else {
            assert!(result.profit_factor >= 0.0);
        }
    }

    #[test]
    fn test_monthly_sampling_trades_less() {
        let bars = history(500, 0.8, 18.0);

        let mut daily_engine = BacktestEngine::new(BacktestConfig::default());
        let daily = daily_engine.run(&bars, dec!(100_000));

        let mut monthly_engine = BacktestEngine::new(BacktestConfig {
            sampling: EntrySampling::Monthly,
            ..BacktestConfig::default()
        });
        let monthly = monthly_engine.run(&bars, dec!(100_000));

        assert!(monthly.total_trades <= daily.total_trades);
    }

    #[test]
    fn test_balance_matches_trade_pnl() {
        let bars = history(350, 1.0, 20.0);
        let mut engine = BacktestEngine::new(BacktestConfig::default());
        let result = engine.run(&bars, dec!(100_000));

        let total_pnl: Decimal = result.trades.iter().map(|t| t.pnl).sum();
        assert_eq!(result.final_balance, dec!(100_000) + total_pnl);
    }

    #[test]
    fn test_trades_never_overlap() {
        let bars = history(400, 1.0, 20.0);
        let mut engine = BacktestEngine::new(BacktestConfig::default());
        let result = engine.run(&bars, dec!(100_000));

        for pair in result.trades.windows(2) {
            assert!(pair[1].entry_date > pair[0].exit_date);
        }
    }
}
