//! Cost models: slippage, fees, and execution latency.
//!
//! All stochastic variants draw from the caller-supplied RNG so a seeded
//! run replays identically.

use backtest_core::HistoricalTrade;
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Base failure probability of the execution-success draw.
const BASE_FAILURE_RATE: f64 = 0.1;

/// Latency penalty divisor: every 1000ms of latency adds 10% failure.
const LATENCY_FAILURE_DIVISOR: f64 = 10_000.0;

/// Slippage model for simulating execution impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlippageModel {
    /// Flat 0.1% of expected profit.
    Fixed,
    /// Uniform draw between 0.05% and 0.25% of expected profit.
    Dynamic,
    /// Scales with the trade's recorded volatility.
    Realistic,
}

impl SlippageModel {
    /// Calculate slippage for a trade.
    pub fn calculate<R: Rng + ?Sized>(&self, trade: &HistoricalTrade, rng: &mut R) -> Decimal {
        match self {
            SlippageModel::Fixed => trade.expected_profit * Decimal::new(1, 3),
            SlippageModel::Dynamic => {
                let pct = rng.gen_range(0.0005..0.0025);
                trade.expected_profit * Decimal::from_f64(pct).unwrap_or_default()
            }
            SlippageModel::Realistic => {
                trade.expected_profit * trade.volatility / Decimal::new(1000, 0)
            }
        }
    }
}

/// Fee model for simulating trading costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeModel {
    /// Observed fee rate, 0.3% of expected profit.
    Actual,
    /// Conservative estimate, 0.25% of expected profit.
    Estimated,
    /// No fees.
    Zero,
}

impl FeeModel {
    /// Calculate fees for a trade.
    pub fn calculate(&self, trade: &HistoricalTrade) -> Decimal {
        match self {
            FeeModel::Actual => trade.expected_profit * Decimal::new(3, 3),
            FeeModel::Estimated => trade.expected_profit * Decimal::new(25, 4),
            FeeModel::Zero => Decimal::ZERO,
        }
    }
}

/// Latency model feeding the execution-success draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyModel {
    /// No added latency.
    Instant,
    /// Uniform 500-2500ms.
    Realistic,
    /// Uniform 1000-6000ms.
    Pessimistic,
}

impl LatencyModel {
    /// Sample an execution latency in milliseconds.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            LatencyModel::Instant => 0.0,
            LatencyModel::Realistic => rng.gen_range(500.0..2500.0),
            LatencyModel::Pessimistic => rng.gen_range(1000.0..6000.0),
        }
    }
}

/// Execution-success draw for a trade under the sampled latency.
///
/// Base 90% success probability, degraded linearly by latency. A failed
/// draw drops the trade from the simulated stream entirely.
pub fn execution_succeeds<R: Rng + ?Sized>(latency_ms: f64, rng: &mut R) -> bool {
    rng.gen::<f64>() > BASE_FAILURE_RATE + latency_ms / LATENCY_FAILURE_DIVISOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_trade(expected_profit: Decimal, volatility: Decimal) -> HistoricalTrade {
        HistoricalTrade {
            id: uuid::Uuid::new_v4(),
            timestamp: Utc::now(),
            network: "ethereum".to_string(),
            strategy: "arbitrage".to_string(),
            entry_price: Decimal::ONE,
            exit_price: Decimal::ONE,
            expected_profit,
            gas_cost: Decimal::ONE,
            execution_time_ms: 800,
            success: true,
            volatility,
            liquidity: Decimal::new(1_000_000, 0),
            gas_price: Decimal::new(30, 0),
        }
    }

    #[test]
    fn test_fixed_slippage() {
        let mut rng = StdRng::seed_from_u64(1);
        let trade = sample_trade(Decimal::new(1000, 0), Decimal::new(50, 0));

        // 0.1% of 1000 = 1
        let slippage = SlippageModel::Fixed.calculate(&trade, &mut rng);
        assert_eq!(slippage, Decimal::ONE);
    }

    #[test]
    fn test_dynamic_slippage_stays_in_band() {
        let mut rng = StdRng::seed_from_u64(2);
        let trade = sample_trade(Decimal::new(10000, 0), Decimal::new(50, 0));

        for _ in 0..100 {
            let slippage = SlippageModel::Dynamic.calculate(&trade, &mut rng);
            // 0.05%..0.25% of 10,000 = 5..25
            assert!(slippage >= Decimal::new(5, 0));
            assert!(slippage <= Decimal::new(25, 0));
        }
    }

    #[test]
    fn test_dynamic_slippage_is_seed_deterministic() {
        let trade = sample_trade(Decimal::new(10000, 0), Decimal::new(50, 0));

        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        assert_eq!(
            SlippageModel::Dynamic.calculate(&trade, &mut rng_a),
            SlippageModel::Dynamic.calculate(&trade, &mut rng_b)
        );
    }

    #[test]
    fn test_realistic_slippage_tracks_volatility() {
        let mut rng = StdRng::seed_from_u64(3);

        // 1000 * 50 / 1000 = 50
        let calm = sample_trade(Decimal::new(1000, 0), Decimal::new(50, 0));
        assert_eq!(
            SlippageModel::Realistic.calculate(&calm, &mut rng),
            Decimal::new(50, 0)
        );

        // 1000 * 200 / 1000 = 200
        let wild = sample_trade(Decimal::new(1000, 0), Decimal::new(200, 0));
        assert_eq!(
            SlippageModel::Realistic.calculate(&wild, &mut rng),
            Decimal::new(200, 0)
        );
    }

    #[test]
    fn test_fee_models() {
        let trade = sample_trade(Decimal::new(1000, 0), Decimal::new(50, 0));

        assert_eq!(FeeModel::Actual.calculate(&trade), Decimal::new(3, 0));
        assert_eq!(FeeModel::Estimated.calculate(&trade), Decimal::new(25, 1));
        assert_eq!(FeeModel::Zero.calculate(&trade), Decimal::ZERO);
    }

    #[test]
    fn test_latency_ranges() {
        let mut rng = StdRng::seed_from_u64(4);

        assert_eq!(LatencyModel::Instant.sample(&mut rng), 0.0);

        for _ in 0..100 {
            let ms = LatencyModel::Realistic.sample(&mut rng);
            assert!((500.0..2500.0).contains(&ms));

            let ms = LatencyModel::Pessimistic.sample(&mut rng);
            assert!((1000.0..6000.0).contains(&ms));
        }
    }

    #[test]
    fn test_execution_success_rate_degrades_with_latency() {
        let mut rng = StdRng::seed_from_u64(5);

        let runs = 10_000;
        let instant_successes = (0..runs)
            .filter(|_| execution_succeeds(0.0, &mut rng))
            .count() as f64;
        let slow_successes = (0..runs)
            .filter(|_| execution_succeeds(5000.0, &mut rng))
            .count() as f64;

        // ~90% at zero latency, ~40% at 5000ms
        assert!((instant_successes / runs as f64 - 0.9).abs() < 0.03);
        assert!((slow_successes / runs as f64 - 0.4).abs() < 0.03);
    }

    #[test]
    fn test_model_serde_names() {
        assert_eq!(
            serde_json::to_string(&SlippageModel::Dynamic).unwrap(),
            "\"dynamic\""
        );
        assert_eq!(serde_json::to_string(&FeeModel::Zero).unwrap(), "\"zero\"");
        assert_eq!(
            serde_json::to_string(&LatencyModel::Pessimistic).unwrap(),
            "\"pessimistic\""
        );
    }
}
