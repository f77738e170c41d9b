//! Chronological trade replay with path-dependent capital tracking.

use backtest_core::{HistoricalTrade, SimulatedTrade};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use risk_manager::RiskGate;

use crate::config::BacktestConfig;
use crate::cost::execution_succeeds;

/// How many processed trades between progress notifications.
const PROGRESS_INTERVAL: usize = 100;

/// Lifecycle of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Idle,
    Running,
    /// The full trade stream was replayed.
    Completed,
    /// The run-level drawdown ceiling was breached; remaining trades
    /// were not replayed. Partial results are still valid.
    EmergencyStopped,
}

/// Advisory progress notification, fired every [`PROGRESS_INTERVAL`]
/// processed trades. Observers must not feed anything back into the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Share of the input stream processed so far, 0-100.
    pub progress_pct: f64,
    /// Input trades examined so far (admitted or not).
    pub trades_processed: usize,
    /// Running capital.
    pub capital: Decimal,
}

/// Fire-and-forget progress observer.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Everything the replay pass produces.
#[derive(Debug)]
pub struct SimulationOutcome {
    /// Admitted trades, in replay order.
    pub trades: Vec<SimulatedTrade>,
    /// Capital after the last admitted trade.
    pub final_capital: Decimal,
    /// Highest capital observed during the run.
    pub peak_capital: Decimal,
    /// Terminal status: `Completed` or `EmergencyStopped`.
    pub status: SimulationStatus,
    /// Input trades that passed the strategy/network filter.
    pub trades_examined: usize,
}

/// Replays a historical trade stream under the configured cost models
/// and risk gate.
///
/// Strictly sequential: capital, peak and drawdown are path-dependent on
/// the exact timestamp order, so the loop must never be parallelized.
/// The random source is injected so a seeded run replays identically.
pub struct ExecutionSimulator<R: Rng = StdRng> {
    config: BacktestConfig,
    rng: R,
    progress: Option<ProgressCallback>,
    status: SimulationStatus,
}

impl ExecutionSimulator<StdRng> {
    /// Create a simulator for one run, seeding the RNG from
    /// `config.rng_seed` when present.
    pub fn new(config: BacktestConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> ExecutionSimulator<R> {
    /// Create a simulator with an explicit random source.
    pub fn with_rng(config: BacktestConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            progress: None,
            status: SimulationStatus::Idle,
        }
    }

    /// Attach a progress observer.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Current lifecycle status.
    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    /// Replay the trade stream. Input need not be pre-sorted.
    pub fn run(&mut self, mut trades: Vec<HistoricalTrade>) -> SimulationOutcome {
        trades.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        self.status = SimulationStatus::Running;

        info!(
            input_trades = trades.len(),
            initial_capital = %self.config.initial_capital,
            "Starting backtest replay"
        );

        let total = trades.len();
        let mut capital = self.config.initial_capital;
        let mut peak_capital = capital;
        let mut drawdown_pct = 0.0_f64;
        let mut simulated = Vec::new();
        let mut examined = 0usize;

        for (index, trade) in trades.into_iter().enumerate() {
            let processed = index + 1;
            self.notify_progress(processed, total, capital);

            if !self.config.strategies.contains(&trade.strategy)
                || !self.config.networks.contains(&trade.network)
            {
                continue;
            }
            examined += 1;

            let slippage = self.config.slippage_model.calculate(&trade, &mut self.rng);
            let fees = self.config.fee_model.calculate(&trade);

            let latency_ms = self.config.latency_model.sample(&mut self.rng);
            if !execution_succeeds(latency_ms, &mut self.rng) {
                debug!(trade_id = %trade.id, latency_ms, "Trade dropped: execution failed");
                continue;
            }

            let net_profit = trade.expected_profit - slippage - fees - trade.gas_cost;

            let decision =
                RiskGate::check(net_profit.abs(), capital, drawdown_pct, &self.config.risk);
            if !decision.allowed {
                debug!(
                    trade_id = %trade.id,
                    reason = decision.reason.as_deref().unwrap_or(""),
                    "Trade rejected by risk gate"
                );
                continue;
            }

            simulated.push(SimulatedTrade::from_execution(trade, slippage, fees, capital));
            capital += net_profit;

            if capital > peak_capital {
                peak_capital = capital;
                drawdown_pct = 0.0;
            } else {
                drawdown_pct = ((peak_capital - capital) / peak_capital
                    * Decimal::ONE_HUNDRED)
                    .to_f64()
                    .unwrap_or(0.0);
            }

            if drawdown_pct > self.config.max_drawdown_pct {
                warn!(
                    drawdown_pct,
                    ceiling = self.config.max_drawdown_pct,
                    trades_replayed = simulated.len(),
                    "Emergency stop: drawdown ceiling breached"
                );
                self.status = SimulationStatus::EmergencyStopped;
                break;
            }
        }

        if self.status == SimulationStatus::Running {
            self.status = SimulationStatus::Completed;
        }

        info!(
            status = ?self.status,
            admitted = simulated.len(),
            final_capital = %capital,
            "Backtest replay finished"
        );

        SimulationOutcome {
            trades: simulated,
            final_capital: capital,
            peak_capital,
            status: self.status,
            trades_examined: examined,
        }
    }

    fn notify_progress(&self, processed: usize, total: usize, capital: Decimal) {
        if processed % PROGRESS_INTERVAL != 0 {
            return;
        }
        if let Some(progress) = &self.progress {
            progress(ProgressUpdate {
                progress_pct: processed as f64 / total as f64 * 100.0,
                trades_processed: processed,
                capital,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{FeeModel, LatencyModel, SlippageModel};
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::mock::StepRng;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// RNG whose every f64 draw is 0.5: the execution-success draw
    /// always passes at instant latency.
    fn passing_rng() -> StepRng {
        StepRng::new(u64::MAX / 2, 0)
    }

    fn frictionless_config() -> BacktestConfig {
        BacktestConfig {
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
            initial_capital: Decimal::new(10000, 0),
            max_drawdown_pct: 20.0,
            strategies: HashSet::from(["arbitrage".to_string()]),
            networks: HashSet::from(["ethereum".to_string()]),
            slippage_model: SlippageModel::Fixed,
            fee_model: FeeModel::Zero,
            latency_model: LatencyModel::Instant,
            rng_seed: Some(7),
            ..Default::default()
        }
    }

    fn trade(offset_hours: i64, expected_profit: Decimal, gas_cost: Decimal) -> HistoricalTrade {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        HistoricalTrade {
            id: uuid::Uuid::new_v4(),
            timestamp: base + Duration::hours(offset_hours),
            network: "ethereum".to_string(),
            strategy: "arbitrage".to_string(),
            entry_price: Decimal::ONE,
            exit_price: Decimal::ONE,
            expected_profit,
            gas_cost,
            execution_time_ms: 500,
            success: true,
            volatility: Decimal::new(40, 0),
            liquidity: Decimal::new(500_000, 0),
            gas_price: Decimal::new(25, 0),
        }
    }

    #[test]
    fn test_unsorted_input_replays_chronologically() {
        let mut simulator = ExecutionSimulator::with_rng(frictionless_config(), passing_rng());
        let outcome = simulator.run(vec![
            trade(48, Decimal::new(30, 0), Decimal::ZERO),
            trade(1, Decimal::new(10, 0), Decimal::ZERO),
            trade(24, Decimal::new(20, 0), Decimal::ZERO),
        ]);

        let stamps: Vec<_> = outcome.trades.iter().map(|t| t.trade.timestamp).collect();
        let mut sorted = stamps.clone();
        sorted.sort();
        assert_eq!(stamps, sorted);
        assert_eq!(outcome.trades.len(), 3);
    }

    #[test]
    fn test_filters_unconfigured_strategy_and_network() {
        let mut simulator = ExecutionSimulator::with_rng(frictionless_config(), passing_rng());

        let mut foreign_strategy = trade(1, Decimal::new(10, 0), Decimal::ZERO);
        foreign_strategy.strategy = "sandwich".to_string();
        let mut foreign_network = trade(2, Decimal::new(10, 0), Decimal::ZERO);
        foreign_network.network = "solana".to_string();

        let outcome = simulator.run(vec![
            foreign_strategy,
            foreign_network,
            trade(3, Decimal::new(10, 0), Decimal::ZERO),
        ]);

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades_examined, 1);
    }

    #[test]
    fn test_capital_accumulates_trade_profits() {
        let config = frictionless_config();
        let mut simulator = ExecutionSimulator::with_rng(config.clone(), passing_rng());
        let outcome = simulator.run(vec![
            trade(1, Decimal::new(100, 0), Decimal::new(5, 0)),
            trade(2, Decimal::new(50, 0), Decimal::new(5, 0)),
        ]);

        assert_eq!(outcome.trades.len(), 2);
        let total: Decimal = outcome.trades.iter().map(|t| t.actual_profit).sum();
        assert_eq!(outcome.final_capital, config.initial_capital + total);
        assert_eq!(outcome.status, SimulationStatus::Completed);
    }

    #[test]
    fn test_emergency_stop_halts_replay() {
        let mut config = frictionless_config();
        config.max_drawdown_pct = 3.0;
        // Keep the gate permissive so the run-level ceiling is what trips.
        config.risk.max_position_size = Decimal::new(1_000_000, 0);
        config.initial_capital = Decimal::new(100_000, 0);

        let mut simulator = ExecutionSimulator::with_rng(config, passing_rng());
        let outcome = simulator.run(vec![
            trade(1, Decimal::new(-4000, 0), Decimal::ZERO),
            trade(2, Decimal::new(10, 0), Decimal::ZERO),
            trade(3, Decimal::new(10, 0), Decimal::ZERO),
        ]);

        assert_eq!(outcome.status, SimulationStatus::EmergencyStopped);
        assert_eq!(outcome.trades.len(), 1);
    }

    #[test]
    fn test_risk_gate_rejections_are_silent() {
        let mut config = frictionless_config();
        config.risk.max_position_size = Decimal::new(20, 0);

        let mut simulator = ExecutionSimulator::with_rng(config, passing_rng());
        let outcome = simulator.run(vec![
            trade(1, Decimal::new(500, 0), Decimal::ZERO), // |net| > 20, rejected
            trade(2, Decimal::new(10, 0), Decimal::ZERO),
        ]);

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.status, SimulationStatus::Completed);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let mut config = frictionless_config();
        config.slippage_model = SlippageModel::Dynamic;
        config.latency_model = LatencyModel::Realistic;
        config.rng_seed = Some(99);

        let trades: Vec<_> = (0..50)
            .map(|i| trade(i, Decimal::new(40, 0), Decimal::ONE))
            .collect();

        let a = ExecutionSimulator::new(config.clone()).run(trades.clone());
        let b = ExecutionSimulator::new(config).run(trades);

        assert_eq!(a.trades.len(), b.trades.len());
        assert_eq!(a.final_capital, b.final_capital);
        for (x, y) in a.trades.iter().zip(b.trades.iter()) {
            assert_eq!(x.slippage, y.slippage);
            assert_eq!(x.actual_profit, y.actual_profit);
        }
    }

    #[test]
    fn test_progress_fires_every_hundred_trades() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let mut simulator = ExecutionSimulator::with_rng(frictionless_config(), passing_rng())
            .with_progress(Box::new(move |u| {
                seen.fetch_add(1, Ordering::SeqCst);
                assert!(u.progress_pct <= 100.0);
                assert_eq!(u.trades_processed % 100, 0);
            }));

        let trades: Vec<_> = (0..250)
            .map(|i| trade(i, Decimal::new(10, 0), Decimal::ZERO))
            .collect();
        simulator.run(trades);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
