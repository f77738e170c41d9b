//! Performance metrics over a simulated trade stream.
//!
//! Everything here is pure aggregation: the ordered `SimulatedTrade`
//! sequence plus the run configuration fully determine the report.

use backtest_core::SimulatedTrade;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::benchmark::BenchmarkComparison;
use crate::config::BacktestConfig;

/// Daily risk-free rate used by the Sharpe/Sortino numerators.
const RISK_FREE_RATE_DAILY: f64 = 0.02 / 365.0;

/// One point of the equity curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    /// Capital after the trades counted so far.
    pub equity: Decimal,
    /// Decline from the running peak, percentage.
    pub drawdown_pct: f64,
    /// Trades applied up to and including this point.
    pub trade_count: usize,
}

/// A maximal contiguous stretch of the equity curve spent below peak.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawdownPeriod {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Number of equity points in the stretch.
    pub duration: usize,
    /// Deepest drawdown seen during the stretch, percentage.
    pub max_drawdown_pct: f64,
    /// Points taken to climb back to peak.
    pub recovery: usize,
}

/// Profit and return for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReturn {
    pub date: NaiveDate,
    pub profit: Decimal,
    /// Day profit relative to capital at the start of the day.
    pub return_pct: f64,
    pub trade_count: usize,
}

/// Profit and return for one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    pub profit: Decimal,
    /// Month profit relative to initial capital.
    pub return_pct: f64,
    /// Best single-day profit within the month.
    pub best_day: Decimal,
    /// Worst single-day profit within the month.
    pub worst_day: Decimal,
}

/// Rollup statistics for one strategy or network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPerformance {
    pub total_trades: usize,
    pub successful_trades: usize,
    pub win_rate: f64,
    pub net_profit: Decimal,
    /// Serializes to `null` when unbounded (no losing trades).
    pub profit_factor: f64,
    pub best_trade: Decimal,
    pub worst_trade: Decimal,
}

/// The full backtest report. Plain data, directly serializable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResults {
    /// The configuration the run executed under.
    pub config: BacktestConfig,
    pub total_trades: usize,
    pub successful_trades: usize,
    /// Sum of profits across winning trades.
    pub total_profit: Decimal,
    /// Sum of slippage, fees and gas across all trades.
    pub total_costs: Decimal,
    /// Signed sum of actual profit across all trades.
    pub net_profit: Decimal,
    pub roi: f64,
    pub sharpe_ratio: f64,
    /// Serializes to `null` when unbounded (no negative daily returns).
    pub sortino_ratio: f64,
    pub win_rate: f64,
    /// Serializes to `null` when unbounded (no losing trades).
    pub profit_factor: f64,
    /// Expected profit percentage per trade.
    pub expectancy: f64,
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub max_drawdown_pct: f64,
    /// Length of the longest drawdown period, in equity points.
    pub max_drawdown_duration: usize,
    pub strategy_performance: HashMap<String, SegmentPerformance>,
    pub network_performance: HashMap<String, SegmentPerformance>,
    pub monthly_returns: Vec<MonthlyReturn>,
    pub daily_returns: Vec<DailyReturn>,
    pub equity_curve: Vec<EquityPoint>,
    pub drawdown_analysis: Vec<DrawdownPeriod>,
    pub benchmark_comparison: Option<BenchmarkComparison>,
    /// Wall-clock duration of the run, stamped by the orchestrator.
    pub execution_time_ms: u64,
    /// Step score of the sample size (50/70/85/95).
    pub data_quality: u8,
    /// Heuristic confidence score, capped at 95.
    pub confidence: u8,
}

/// Pure aggregation over the simulated trade stream.
pub struct MetricsEngine;

impl MetricsEngine {
    /// Compute the full report for a finished replay.
    ///
    /// `benchmark_comparison` and `execution_time_ms` are left for the
    /// orchestrator to fill in.
    pub fn compute(config: &BacktestConfig, trades: &[SimulatedTrade]) -> BacktestResults {
        let initial_capital = config.initial_capital;

        let total_trades = trades.len();
        let successful_trades = trades.iter().filter(|t| t.success).count();
        let win_rate = if total_trades > 0 {
            successful_trades as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let total_profit: Decimal = trades
            .iter()
            .filter(|t| t.actual_profit > Decimal::ZERO)
            .map(|t| t.actual_profit)
            .sum();
        let total_loss: Decimal = trades
            .iter()
            .filter(|t| t.actual_profit < Decimal::ZERO)
            .map(|t| t.actual_profit.abs())
            .sum();
        let total_costs: Decimal = trades.iter().map(|t| t.total_cost()).sum();
        let net_profit: Decimal = trades.iter().map(|t| t.actual_profit).sum();

        let roi = ((initial_capital + net_profit) / initial_capital)
            .to_f64()
            .map(|v| (v - 1.0) * 100.0)
            .unwrap_or(0.0);

        let profit_factor = profit_factor(total_profit, total_loss);

        let daily_returns = daily_returns(trades, initial_capital);
        let daily_pcts: Vec<f64> = daily_returns.iter().map(|d| d.return_pct).collect();
        let sharpe_ratio = sharpe(&daily_pcts);
        let sortino_ratio = sortino(&daily_pcts);

        let wins: Vec<Decimal> = trades
            .iter()
            .filter(|t| t.actual_profit > Decimal::ZERO)
            .map(|t| t.actual_profit)
            .collect();
        let losses: Vec<Decimal> = trades
            .iter()
            .filter(|t| t.actual_profit < Decimal::ZERO)
            .map(|t| t.actual_profit)
            .collect();

        let average_win = mean(&wins);
        let average_loss = mean(&losses);
        let largest_win = wins.iter().copied().max().unwrap_or(Decimal::ZERO);
        let largest_loss = losses.iter().copied().min().unwrap_or(Decimal::ZERO);

        let win_frac = win_rate / 100.0;
        let expectancy = win_frac * average_win.to_f64().unwrap_or(0.0)
            + (1.0 - win_frac) * average_loss.to_f64().unwrap_or(0.0);

        let (max_consecutive_wins, max_consecutive_losses) = consecutive_streaks(trades);

        let equity_curve = equity_curve(config.start_date, initial_capital, trades);
        let max_drawdown_pct = equity_curve
            .iter()
            .map(|p| p.drawdown_pct)
            .fold(0.0, f64::max);
        let drawdown_analysis = drawdown_periods(&equity_curve);
        let max_drawdown_duration = drawdown_analysis
            .iter()
            .map(|p| p.duration)
            .max()
            .unwrap_or(0);

        let monthly_returns = monthly_returns(&daily_returns, initial_capital);

        let strategy_performance = rollup(trades, |t| t.trade.strategy.as_str());
        let network_performance = rollup(trades, |t| t.trade.network.as_str());

        BacktestResults {
            config: config.clone(),
            total_trades,
            successful_trades,
            total_profit,
            total_costs,
            net_profit,
            roi,
            sharpe_ratio,
            sortino_ratio,
            win_rate,
            profit_factor,
            expectancy,
            average_win,
            average_loss,
            largest_win,
            largest_loss,
            max_consecutive_wins,
            max_consecutive_losses,
            max_drawdown_pct,
            max_drawdown_duration,
            strategy_performance,
            network_performance,
            monthly_returns,
            daily_returns,
            equity_curve,
            drawdown_analysis,
            benchmark_comparison: None,
            execution_time_ms: 0,
            data_quality: data_quality(total_trades),
            confidence: confidence(config, total_trades),
        }
    }
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().copied().sum::<Decimal>() / Decimal::from(values.len())
}

fn profit_factor(total_profit: Decimal, total_loss: Decimal) -> f64 {
    if total_loss > Decimal::ZERO {
        (total_profit / total_loss).to_f64().unwrap_or(0.0)
    } else if total_profit > Decimal::ZERO {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Bucket trades by calendar day; capital advances additively between
/// days, anchoring each day's return on capital at the start of the day.
fn daily_returns(trades: &[SimulatedTrade], initial_capital: Decimal) -> Vec<DailyReturn> {
    let mut days: BTreeMap<NaiveDate, (Decimal, usize)> = BTreeMap::new();
    for trade in trades {
        let entry = days
            .entry(trade.trade.timestamp.date_naive())
            .or_insert((Decimal::ZERO, 0));
        entry.0 += trade.actual_profit;
        entry.1 += 1;
    }

    let mut capital = initial_capital;
    let mut returns = Vec::with_capacity(days.len());
    for (date, (profit, trade_count)) in days {
        let return_pct = if capital > Decimal::ZERO {
            (profit / capital * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0)
        } else {
            0.0
        };
        returns.push(DailyReturn {
            date,
            profit,
            return_pct,
            trade_count,
        });
        capital += profit;
    }

    returns
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn sharpe(daily_pcts: &[f64]) -> f64 {
    if daily_pcts.len() < 2 {
        return 0.0;
    }
    let mean = daily_pcts.iter().sum::<f64>() / daily_pcts.len() as f64;
    let dev = std_dev(daily_pcts);
    if dev == 0.0 {
        return 0.0;
    }
    (mean - RISK_FREE_RATE_DAILY) / dev
}

fn sortino(daily_pcts: &[f64]) -> f64 {
    if daily_pcts.len() < 2 {
        return 0.0;
    }
    let negatives: Vec<f64> = daily_pcts.iter().copied().filter(|r| *r < 0.0).collect();
    if negatives.is_empty() {
        return f64::INFINITY;
    }
    let downside_dev = std_dev(&negatives);
    if downside_dev == 0.0 {
        return 0.0;
    }
    let mean = daily_pcts.iter().sum::<f64>() / daily_pcts.len() as f64;
    (mean - RISK_FREE_RATE_DAILY) / downside_dev
}

fn consecutive_streaks(trades: &[SimulatedTrade]) -> (usize, usize) {
    let mut max_wins = 0;
    let mut max_losses = 0;
    let mut current_wins = 0;
    let mut current_losses = 0;

    for trade in trades {
        if trade.actual_profit > Decimal::ZERO {
            current_wins += 1;
            current_losses = 0;
            max_wins = max_wins.max(current_wins);
        } else if trade.actual_profit < Decimal::ZERO {
            current_losses += 1;
            current_wins = 0;
            max_losses = max_losses.max(current_losses);
        }
    }

    (max_wins, max_losses)
}

/// One pre-trade point, then one point per admitted trade.
fn equity_curve(
    start_date: DateTime<Utc>,
    initial_capital: Decimal,
    trades: &[SimulatedTrade],
) -> Vec<EquityPoint> {
    let mut curve = Vec::with_capacity(trades.len() + 1);
    curve.push(EquityPoint {
        timestamp: start_date,
        equity: initial_capital,
        drawdown_pct: 0.0,
        trade_count: 0,
    });

    let mut equity = initial_capital;
    let mut peak = initial_capital;
    for (index, trade) in trades.iter().enumerate() {
        equity += trade.actual_profit;
        if equity > peak {
            peak = equity;
        }
        let drawdown_pct = if peak > Decimal::ZERO {
            ((peak - equity) / peak * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0)
        } else {
            0.0
        };
        curve.push(EquityPoint {
            timestamp: trade.trade.timestamp,
            equity,
            drawdown_pct,
            trade_count: index + 1,
        });
    }

    curve
}

/// Maximal runs of consecutive points with positive drawdown.
fn drawdown_periods(curve: &[EquityPoint]) -> Vec<DrawdownPeriod> {
    let mut periods = Vec::new();
    let mut run: Option<(DateTime<Utc>, DateTime<Utc>, usize, f64)> = None;

    for point in curve {
        if point.drawdown_pct > 0.0 {
            run = match run {
                Some((start, _, count, max)) => {
                    Some((start, point.timestamp, count + 1, max.max(point.drawdown_pct)))
                }
                None => Some((point.timestamp, point.timestamp, 1, point.drawdown_pct)),
            };
        } else if let Some((start, end, count, max)) = run.take() {
            periods.push(DrawdownPeriod {
                start_date: start,
                end_date: end,
                duration: count,
                max_drawdown_pct: max,
                recovery: count,
            });
        }
    }
    if let Some((start, end, count, max)) = run {
        periods.push(DrawdownPeriod {
            start_date: start,
            end_date: end,
            duration: count,
            max_drawdown_pct: max,
            recovery: count,
        });
    }

    periods
}

fn monthly_returns(daily: &[DailyReturn], initial_capital: Decimal) -> Vec<MonthlyReturn> {
    let mut months: BTreeMap<(i32, u32), Vec<&DailyReturn>> = BTreeMap::new();
    for day in daily {
        months
            .entry((day.date.year(), day.date.month()))
            .or_default()
            .push(day);
    }

    months
        .into_iter()
        .map(|((year, month), days)| {
            let profit: Decimal = days.iter().map(|d| d.profit).sum();
            let return_pct = if initial_capital > Decimal::ZERO {
                (profit / initial_capital * Decimal::ONE_HUNDRED)
                    .to_f64()
                    .unwrap_or(0.0)
            } else {
                0.0
            };
            let best_day = days.iter().map(|d| d.profit).max().unwrap_or(Decimal::ZERO);
            let worst_day = days.iter().map(|d| d.profit).min().unwrap_or(Decimal::ZERO);
            MonthlyReturn {
                year,
                month,
                profit,
                return_pct,
                best_day,
                worst_day,
            }
        })
        .collect()
}

fn rollup<'a, F>(trades: &'a [SimulatedTrade], key: F) -> HashMap<String, SegmentPerformance>
where
    F: Fn(&'a SimulatedTrade) -> &'a str,
{
    let mut groups: HashMap<&str, Vec<&SimulatedTrade>> = HashMap::new();
    for trade in trades {
        groups.entry(key(trade)).or_default().push(trade);
    }

    groups
        .into_iter()
        .map(|(name, group)| {
            let total_trades = group.len();
            let successful_trades = group.iter().filter(|t| t.success).count();
            let win_rate = if total_trades > 0 {
                successful_trades as f64 / total_trades as f64 * 100.0
            } else {
                0.0
            };
            let gains: Decimal = group
                .iter()
                .filter(|t| t.actual_profit > Decimal::ZERO)
                .map(|t| t.actual_profit)
                .sum();
            let losses: Decimal = group
                .iter()
                .filter(|t| t.actual_profit < Decimal::ZERO)
                .map(|t| t.actual_profit.abs())
                .sum();
            let net_profit: Decimal = group.iter().map(|t| t.actual_profit).sum();
            let best_trade = group
                .iter()
                .map(|t| t.actual_profit)
                .max()
                .unwrap_or(Decimal::ZERO);
            let worst_trade = group
                .iter()
                .map(|t| t.actual_profit)
                .min()
                .unwrap_or(Decimal::ZERO);

            (
                name.to_string(),
                SegmentPerformance {
                    total_trades,
                    successful_trades,
                    win_rate,
                    net_profit,
                    profit_factor: profit_factor(gains, losses),
                    best_trade,
                    worst_trade,
                },
            )
        })
        .collect()
}

fn data_quality(sample_count: usize) -> u8 {
    match sample_count {
        n if n < 100 => 50,
        n if n < 500 => 70,
        n if n < 1000 => 85,
        _ => 95,
    }
}

fn confidence(config: &BacktestConfig, trade_count: usize) -> u8 {
    let mut score: u32 = 50;

    if trade_count > 1000 {
        score += 20;
    } else if trade_count > 500 {
        score += 10;
    }

    let span_days = (config.end_date - config.start_date).num_days();
    if span_days > 90 {
        score += 20;
    } else if span_days > 30 {
        score += 10;
    }

    if config.strategies.len() >= 3 {
        score += 10;
    }
    if config.networks.len() >= 5 {
        score += 10;
    }

    score.min(95) as u8
}
