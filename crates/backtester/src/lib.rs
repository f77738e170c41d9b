//! Backtester
//!
//! Historical-trade replay and performance analytics for cross-network
//! arbitrage strategies.
//!
//! # Features
//!
//! - **Cost Models**: selectable slippage, fee and latency models with a
//!   seedable random source
//! - **Execution Simulator**: chronological replay with risk gating,
//!   drawdown tracking and an emergency stop
//! - **Metrics Engine**: Sharpe/Sortino, profit factor, equity curve,
//!   drawdown segmentation, per-strategy and per-network rollups
//! - **Orchestrator**: validation, single-run guard, benchmark
//!   comparison, progress reporting
//!
//! # Example
//!
//! ```ignore
//! use backtester::{BacktestConfig, BacktestOrchestrator};
//! use backtest_core::InMemoryTradeSource;
//! use std::sync::Arc;
//!
//! let source = Arc::new(InMemoryTradeSource::new(trades));
//! let orchestrator = BacktestOrchestrator::new(source);
//!
//! let results = orchestrator.run_backtest(BacktestConfig::default()).await?;
//! println!("ROI: {:.2}%  Sharpe: {:.2}", results.roi, results.sharpe_ratio);
//! ```

pub mod benchmark;
pub mod config;
pub mod cost;
pub mod metrics;
pub mod orchestrator;
pub mod simulator;

// Re-exports
pub use benchmark::{BenchmarkComparator, BenchmarkComparison};
pub use config::BacktestConfig;
pub use cost::{FeeModel, LatencyModel, SlippageModel};
pub use metrics::{
    BacktestResults, DailyReturn, DrawdownPeriod, EquityPoint, MetricsEngine, MonthlyReturn,
    SegmentPerformance,
};
pub use orchestrator::BacktestOrchestrator;
pub use simulator::{
    ExecutionSimulator, ProgressCallback, ProgressUpdate, SimulationOutcome, SimulationStatus,
};
