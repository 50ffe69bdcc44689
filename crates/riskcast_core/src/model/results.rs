//! Simulation results
//!
//! Output of one simulation run: closed-form annualised statistics, the
//! simulated distribution of horizon returns and a sample of full trajectories
//! for charting.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::stats::{self, HistogramBin};

/// Closed-form portfolio statistics on an annual basis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualizedStats {
    pub expected_return: f64,
    pub volatility: f64,
    /// `expected_return / volatility`, or 0 when volatility is exactly 0
    pub sharpe_ratio: f64,
}

/// Qualitative band for a Sharpe ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SharpeRating {
    Excellent,
    Good,
    Acceptable,
    Poor,
    Negative,
}

impl SharpeRating {
    #[must_use]
    pub fn from_ratio(sharpe: f64) -> Self {
        if sharpe > 2.0 {
            Self::Excellent
        } else if sharpe > 1.0 {
            Self::Good
        } else if sharpe > 0.5 {
            Self::Acceptable
        } else if sharpe > 0.0 {
            Self::Poor
        } else {
            Self::Negative
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Acceptable => "Acceptable",
            Self::Poor => "Poor",
            Self::Negative => "Negative",
        }
    }
}

/// Complete result of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Annualised expected portfolio return (closed form)
    pub expected_return: f64,
    /// Annualised portfolio volatility (closed form)
    pub volatility: f64,
    pub sharpe_ratio: f64,
    /// 5th percentile of the simulated cumulative returns
    pub var_95: f64,
    /// Mean of the simulated cumulative returns at or below `var_95`
    pub expected_shortfall_95: f64,
    /// Fraction of trials ending below break-even
    pub probability_of_loss: f64,
    /// Cumulative return over the horizon for each trial
    pub final_values: Vec<f64>,
    /// Cumulative portfolio value (base 1.0) at every period, one row per path
    pub paths_sample: Vec<Vec<f64>>,
    pub horizon: usize,
    pub trials: usize,
    pub seed: u64,
}

impl SimulationResult {
    #[must_use]
    pub fn annualized(&self) -> AnnualizedStats {
        AnnualizedStats {
            expected_return: self.expected_return,
            volatility: self.volatility,
            sharpe_ratio: self.sharpe_ratio,
        }
    }

    /// Percentile `q` in `[0, 1]` of the trial cumulative returns
    pub fn percentile(&self, q: f64) -> Result<f64> {
        stats::percentile(&self.final_values, q)
    }

    /// Mean cumulative return across trials
    #[must_use]
    pub fn mean_final_value(&self) -> f64 {
        stats::mean(&self.final_values).unwrap_or(0.0)
    }

    #[must_use]
    pub fn histogram(&self, bins: usize) -> Vec<HistogramBin> {
        stats::histogram(&self.final_values, bins)
    }

    /// Per-period average of the sample paths
    #[must_use]
    pub fn mean_path(&self) -> Vec<f64> {
        let Some(first) = self.paths_sample.first() else {
            return Vec::new();
        };
        let n = self.paths_sample.len() as f64;
        let mut sums = vec![0.0; first.len()];
        for path in &self.paths_sample {
            for (sum, value) in sums.iter_mut().zip(path) {
                *sum += value;
            }
        }
        sums.into_iter().map(|s| s / n).collect()
    }

    #[must_use]
    pub fn sharpe_rating(&self) -> SharpeRating {
        SharpeRating::from_ratio(self.sharpe_ratio)
    }
}
