//! Top-level backtest coordination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use backtest_core::{BenchmarkSource, Error, Result, TradeSource};
use tracing::info;

use crate::benchmark::BenchmarkComparator;
use crate::config::BacktestConfig;
use crate::metrics::{BacktestResults, MetricsEngine};
use crate::simulator::{ExecutionSimulator, ProgressCallback};

/// Coordinates one backtest run end to end: validation, trade loading,
/// replay, metrics, and the optional benchmark comparison.
///
/// One run at a time per instance; a second call while a run is in
/// flight fails immediately with [`Error::AlreadyRunning`] rather than
/// queueing. Independent instances run independently.
pub struct BacktestOrchestrator {
    trade_source: Arc<dyn TradeSource>,
    benchmark_source: Option<Arc<dyn BenchmarkSource>>,
    is_running: AtomicBool,
}

impl BacktestOrchestrator {
    /// Create an orchestrator over a trade supplier.
    pub fn new(trade_source: Arc<dyn TradeSource>) -> Self {
        Self {
            trade_source,
            benchmark_source: None,
            is_running: AtomicBool::new(false),
        }
    }

    /// Attach a benchmark return supplier. Without one, reports omit the
    /// benchmark comparison even when the config names a benchmark.
    pub fn with_benchmark_source(mut self, source: Arc<dyn BenchmarkSource>) -> Self {
        self.benchmark_source = Some(source);
        self
    }

    /// Whether a run is currently in flight.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Run a backtest without progress reporting.
    pub async fn run_backtest(&self, config: BacktestConfig) -> Result<BacktestResults> {
        self.run_backtest_with_progress(config, None).await
    }

    /// Run a backtest, optionally threading a progress observer through
    /// to the simulator.
    pub async fn run_backtest_with_progress(
        &self,
        config: BacktestConfig,
        progress: Option<ProgressCallback>,
    ) -> Result<BacktestResults> {
        config.validate()?;

        if self
            .is_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyRunning);
        }

        let started = Instant::now();
        let result = self.execute(&config, progress).await;
        self.is_running.store(false, Ordering::SeqCst);

        let mut results = result?;
        results.execution_time_ms = started.elapsed().as_millis() as u64;
        Ok(results)
    }

    async fn execute(
        &self,
        config: &BacktestConfig,
        progress: Option<ProgressCallback>,
    ) -> Result<BacktestResults> {
        let trades = self
            .trade_source
            .load_trades(&config.network_list(), config.start_date, config.end_date)
            .await?;

        info!(
            loaded = trades.len(),
            start = %config.start_date,
            end = %config.end_date,
            "Loaded historical trades"
        );

        let mut simulator = ExecutionSimulator::new(config.clone());
        if let Some(progress) = progress {
            simulator = simulator.with_progress(progress);
        }
        let outcome = simulator.run(trades);

        let mut results = MetricsEngine::compute(config, &outcome.trades);

        if let (Some(benchmark), Some(source)) =
            (&config.benchmark_strategy, &self.benchmark_source)
        {
            let benchmark_return = source
                .benchmark_return(benchmark, config.start_date, config.end_date)
                .await?;
            results.benchmark_comparison = Some(BenchmarkComparator::compare(
                benchmark,
                results.roi,
                benchmark_return,
                results.sharpe_ratio,
            ));
        }

        Ok(results)
    }
}
