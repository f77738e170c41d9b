//! Core types for the arbitrage backtesting engine.
//!
//! This crate holds the data model and collaborator boundaries shared by
//! the risk and simulation crates:
//!
//! - `HistoricalTrade` / `SimulatedTrade` trade records
//! - `TradeSource` / `BenchmarkSource` external supply traits
//! - the engine-wide error taxonomy

pub mod error;
pub mod source;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use source::{BenchmarkSource, InMemoryTradeSource, TradeSource};
pub use types::{HistoricalTrade, SimulatedTrade};
