//! Trade records shared across the backtesting crates.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A historical trade record supplied by an external store.
///
/// Records are read-only inputs: the engine never mutates them, and the
/// corpus is not required to arrive sorted — the simulator orders by
/// timestamp before replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalTrade {
    /// Trade identifier.
    pub id: uuid::Uuid,
    /// Trade timestamp.
    pub timestamp: DateTime<Utc>,
    /// Network the trade executed on (e.g. "ethereum", "arbitrum").
    pub network: String,
    /// Strategy that produced the trade.
    pub strategy: String,
    /// Entry price.
    pub entry_price: Decimal,
    /// Exit price.
    pub exit_price: Decimal,
    /// Profit expected at detection time, before any costs.
    pub expected_profit: Decimal,
    /// Gas spent on the trade.
    pub gas_cost: Decimal,
    /// Observed execution time in milliseconds.
    pub execution_time_ms: u64,
    /// Raw success flag as recorded at the time, pre-simulation.
    pub success: bool,
    /// Market volatility reading at trade time.
    pub volatility: Decimal,
    /// Pool/market liquidity at trade time.
    pub liquidity: Decimal,
    /// Gas price at trade time.
    pub gas_price: Decimal,
}

/// A trade admitted by the simulator, with simulated costs applied.
///
/// Created once during the replay pass and never mutated afterward. The
/// ordered sequence of simulated trades is the sole input to the metrics
/// engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedTrade {
    /// The underlying historical record.
    pub trade: HistoricalTrade,
    /// Profit after slippage, fees and gas.
    pub actual_profit: Decimal,
    /// Simulated slippage cost.
    pub slippage: Decimal,
    /// Simulated fee cost.
    pub fees: Decimal,
    /// Whether the trade was profitable after costs.
    pub success: bool,
    /// Actual profit relative to capital at the time of the trade.
    pub profit_pct: f64,
}

impl SimulatedTrade {
    /// Derive a simulated trade from a historical record and its costs.
    ///
    /// `capital_at_trade` is the running capital before this trade is
    /// applied; it anchors the per-trade return percentage.
    pub fn from_execution(
        trade: HistoricalTrade,
        slippage: Decimal,
        fees: Decimal,
        capital_at_trade: Decimal,
    ) -> Self {
        let actual_profit = trade.expected_profit - slippage - fees - trade.gas_cost;
        let profit_pct = if capital_at_trade > Decimal::ZERO {
            (actual_profit / capital_at_trade * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0)
        } else {
            0.0
        };

        Self {
            trade,
            actual_profit,
            slippage,
            fees,
            success: actual_profit > Decimal::ZERO,
            profit_pct,
        }
    }

    /// Total simulated cost of the trade (slippage + fees + gas).
    pub fn total_cost(&self) -> Decimal {
        self.slippage + self.fees + self.trade.gas_cost
    }
}
