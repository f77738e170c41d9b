//! Benchmark comparison arithmetic.
//!
//! The benchmark return itself comes from an external supplier; this
//! module only derives the comparison figures from the two scalar
//! returns.

use serde::{Deserialize, Serialize};

/// Comparison of a backtest's return against a named benchmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    /// Benchmark name, as configured.
    pub benchmark: String,
    /// The run's return percentage.
    pub our_return: f64,
    /// The benchmark's return percentage over the same window.
    pub benchmark_return: f64,
    /// Excess return over the benchmark.
    pub alpha: f64,
    /// Return sensitivity proxy: our return relative to the benchmark's.
    pub beta: f64,
    /// Return correlation. A single scalar observation pair carries no
    /// correlation information, so this is reported as 0.
    pub correlation: f64,
    /// Risk-adjusted excess return.
    pub information_ratio: f64,
    /// Deviation of the differential return.
    pub tracking_error: f64,
}

/// Derives comparison figures from scalar returns.
pub struct BenchmarkComparator;

impl BenchmarkComparator {
    /// Compare the run's return against the benchmark's.
    ///
    /// `sharpe_ratio` normalizes the information ratio; when it is zero
    /// the raw alpha is reported instead.
    pub fn compare(
        benchmark: &str,
        our_return: f64,
        benchmark_return: f64,
        sharpe_ratio: f64,
    ) -> BenchmarkComparison {
        let alpha = our_return - benchmark_return;
        let beta = if benchmark_return != 0.0 {
            our_return / benchmark_return
        } else {
            1.0
        };
        let information_ratio = if sharpe_ratio != 0.0 {
            alpha / sharpe_ratio
        } else {
            alpha
        };

        BenchmarkComparison {
            benchmark: benchmark.to_string(),
            our_return,
            benchmark_return,
            alpha,
            beta,
            correlation: 0.0,
            information_ratio,
            tracking_error: alpha.abs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_and_beta() {
        let cmp = BenchmarkComparator::compare("buy_and_hold", 12.0, 8.0, 2.0);

        assert_eq!(cmp.alpha, 4.0);
        assert_eq!(cmp.beta, 1.5);
        assert_eq!(cmp.information_ratio, 2.0);
        assert_eq!(cmp.tracking_error, 4.0);
    }

    #[test]
    fn test_zero_sharpe_falls_back_to_alpha() {
        let cmp = BenchmarkComparator::compare("buy_and_hold", 5.0, 2.0, 0.0);
        assert_eq!(cmp.information_ratio, cmp.alpha);
    }

    #[test]
    fn test_zero_benchmark_return_defaults_beta() {
        let cmp = BenchmarkComparator::compare("flat", 5.0, 0.0, 1.0);
        assert_eq!(cmp.beta, 1.0);
    }

    #[test]
    fn test_underperformance_has_negative_alpha() {
        let cmp = BenchmarkComparator::compare("buy_and_hold", 3.0, 9.0, 1.5);
        assert_eq!(cmp.alpha, -6.0);
        assert_eq!(cmp.tracking_error, 6.0);
    }
}
