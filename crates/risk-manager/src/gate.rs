//! Per-trade risk gate.

use backtest_core::{Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Single-trade risk cap as a percentage of current capital.
///
/// Fixed policy constant, independent of the configured limits.
pub const SINGLE_TRADE_RISK_CAP_PCT: f64 = 5.0;

/// Risk limits consulted when admitting trades.
///
/// Only `max_position_size` and `max_drawdown_pct` gate admission inside
/// the engine; the remaining limits are validated and carried for
/// callers that enforce them around live execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskParameters {
    /// Maximum position size per trade (absolute).
    pub max_position_size: Decimal,
    /// Maximum realized loss per day (absolute).
    pub max_daily_loss: Decimal,
    /// Maximum drawdown before trade admission stops (percentage).
    ///
    /// Gates individual trades; independent from the run-level
    /// emergency-stop ceiling on the backtest config.
    pub max_drawdown_pct: f64,
    /// Stop-loss trigger per position (percentage).
    pub stop_loss_pct: f64,
    /// Emergency stop-loss trigger (percentage).
    pub emergency_stop_loss_pct: f64,
    /// Maximum capital share on a single network (percentage).
    pub max_network_exposure_pct: f64,
    /// Maximum capital share on a single strategy (percentage).
    pub max_strategy_exposure_pct: f64,
    /// Rate limit on trade submission.
    pub max_transactions_per_hour: u32,
    /// Pause after a losing trade, in milliseconds.
    pub cooldown_after_loss_ms: u64,
    /// Maximum tolerated market volatility.
    pub max_volatility: Decimal,
    /// Window for volatility sampling, in minutes.
    pub volatility_window: u32,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            max_position_size: Decimal::new(1000, 0),
            max_daily_loss: Decimal::new(500, 0),
            max_drawdown_pct: 15.0,
            stop_loss_pct: 5.0,
            emergency_stop_loss_pct: 10.0,
            max_network_exposure_pct: 40.0,
            max_strategy_exposure_pct: 60.0,
            max_transactions_per_hour: 120,
            cooldown_after_loss_ms: 60_000,
            max_volatility: Decimal::new(100, 0),
            volatility_window: 60,
        }
    }
}

impl RiskParameters {
    /// Validate that every limit is non-negative.
    pub fn validate(&self) -> Result<()> {
        if self.max_position_size < Decimal::ZERO {
            return Err(Error::config("max_position_size must be non-negative"));
        }
        if self.max_daily_loss < Decimal::ZERO {
            return Err(Error::config("max_daily_loss must be non-negative"));
        }
        if self.max_volatility < Decimal::ZERO {
            return Err(Error::config("max_volatility must be non-negative"));
        }
        for (name, value) in [
            ("max_drawdown_pct", self.max_drawdown_pct),
            ("stop_loss_pct", self.stop_loss_pct),
            ("emergency_stop_loss_pct", self.emergency_stop_loss_pct),
            ("max_network_exposure_pct", self.max_network_exposure_pct),
            ("max_strategy_exposure_pct", self.max_strategy_exposure_pct),
        ] {
            if value < 0.0 {
                return Err(Error::config(format!("{name} must be non-negative")));
            }
        }

        Ok(())
    }
}

/// Outcome of a risk gate check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskDecision {
    /// Whether the trade may proceed.
    pub allowed: bool,
    /// Denial reason, set only when not allowed.
    pub reason: Option<String>,
}

impl RiskDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn deny(reason: &str) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// Stateless per-trade admission check.
pub struct RiskGate;

impl RiskGate {
    /// Evaluate a proposed position against the risk limits.
    ///
    /// Rules run in order; the first failing rule wins.
    pub fn check(
        position_size: Decimal,
        current_capital: Decimal,
        current_drawdown_pct: f64,
        params: &RiskParameters,
    ) -> RiskDecision {
        if position_size > params.max_position_size {
            return RiskDecision::deny("position exceeds max size");
        }

        if current_drawdown_pct > params.max_drawdown_pct {
            return RiskDecision::deny("drawdown exceeds limit");
        }

        let position_risk_pct = if current_capital > Decimal::ZERO {
            (position_size / current_capital * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(f64::MAX)
        } else {
            f64::MAX
        };
        if position_risk_pct > SINGLE_TRADE_RISK_CAP_PCT {
            return RiskDecision::deny("position risk too high");
        }

        RiskDecision::allow()
    }
}
