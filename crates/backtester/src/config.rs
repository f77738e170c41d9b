//! Backtest run configuration.

use backtest_core::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use risk_manager::RiskParameters;

use crate::cost::{FeeModel, LatencyModel, SlippageModel};

/// Configuration for a single backtest run.
///
/// Immutable for the duration of the run; the report echoes it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Start of the replay window (inclusive).
    pub start_date: DateTime<Utc>,
    /// End of the replay window (exclusive).
    pub end_date: DateTime<Utc>,
    /// Starting capital.
    pub initial_capital: Decimal,
    /// Run-level drawdown ceiling (percentage) that triggers an
    /// emergency stop of the whole replay.
    pub max_drawdown_pct: f64,
    /// Strategies admitted into the replay.
    pub strategies: HashSet<String>,
    /// Networks admitted into the replay.
    pub networks: HashSet<String>,
    /// Per-trade risk limits.
    pub risk: RiskParameters,
    /// Slippage model applied to every trade.
    pub slippage_model: SlippageModel,
    /// Fee model applied to every trade.
    pub fee_model: FeeModel,
    /// Latency model feeding the execution-success draw.
    pub latency_model: LatencyModel,
    /// Benchmark to compare against, if any.
    pub benchmark_strategy: Option<String>,
    /// Seed for the simulation RNG. Same config + same seed replays to
    /// an identical simulated trade stream.
    pub rng_seed: Option<u64>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        let end_date = Utc::now();
        Self {
            start_date: end_date - chrono::Duration::days(30),
            end_date,
            initial_capital: Decimal::new(10000, 0),
            max_drawdown_pct: 20.0,
            strategies: HashSet::from(["arbitrage".to_string()]),
            networks: HashSet::from(["ethereum".to_string()]),
            risk: RiskParameters::default(),
            slippage_model: SlippageModel::Realistic,
            fee_model: FeeModel::Estimated,
            latency_model: LatencyModel::Realistic,
            benchmark_strategy: None,
            rng_seed: None,
        }
    }
}

impl BacktestConfig {
    /// Fail-fast validation, run before any simulation work.
    pub fn validate(&self) -> Result<()> {
        if self.start_date >= self.end_date {
            return Err(Error::config("start date must be before end date"));
        }
        if self.initial_capital <= Decimal::ZERO {
            return Err(Error::config("initial capital must be positive"));
        }
        if self.strategies.is_empty() {
            return Err(Error::config("at least one strategy is required"));
        }
        if self.networks.is_empty() {
            return Err(Error::config("at least one network is required"));
        }
        if self.max_drawdown_pct < 0.0 {
            return Err(Error::config("max_drawdown_pct must be non-negative"));
        }
        self.risk.validate()?;

        Ok(())
    }

    /// Networks as a sorted list, for the trade source query.
    pub fn network_list(&self) -> Vec<String> {
        let mut networks: Vec<String> = self.networks.iter().cloned().collect();
        networks.sort();
        networks
    }
}
