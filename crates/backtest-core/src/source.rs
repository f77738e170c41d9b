//! External collaborator boundaries: trade and benchmark supply.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::HistoricalTrade;

/// Supplies the historical trade corpus for a backtest window.
///
/// Storage lives outside the engine; implementations may be backed by a
/// database, a file, or an in-memory collection. The engine only filters
/// and sorts what it receives.
#[async_trait]
pub trait TradeSource: Send + Sync {
    /// Load trades for the given networks within `[start, end)`.
    async fn load_trades(
        &self,
        networks: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoricalTrade>>;
}

/// Supplies a benchmark return (percentage over the window) by name.
#[async_trait]
pub trait BenchmarkSource: Send + Sync {
    async fn benchmark_return(
        &self,
        benchmark: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64>;
}

/// Reference `TradeSource` over an in-memory collection.
///
/// Useful for tests and offline analysis of already-exported corpora.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTradeSource {
    trades: Vec<HistoricalTrade>,
}

impl InMemoryTradeSource {
    pub fn new(trades: Vec<HistoricalTrade>) -> Self {
        Self { trades }
    }

    /// Number of trades held, regardless of window.
    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

#[async_trait]
impl TradeSource for InMemoryTradeSource {
    async fn load_trades(
        &self,
        networks: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoricalTrade>> {
        let trades = self
            .trades
            .iter()
            .filter(|t| t.timestamp >= start && t.timestamp < end)
            .filter(|t| networks.is_empty() || networks.contains(&t.network))
            .cloned()
            .collect();

        Ok(trades)
    }
}
