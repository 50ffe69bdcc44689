//! Portfolio risk estimation and Monte Carlo projection
//!
//! This crate fits a multivariate normal return model to historical return
//! series and projects portfolio outcomes by simulation. It provides:
//! - Date alignment of per-instrument return series (intersection, undefined rows dropped)
//! - Mean vector and sample covariance estimation
//! - Correlated daily return sampling (Cholesky, eigen fallback for singular covariances)
//! - Annualised return, volatility and Sharpe ratio in closed form
//! - Value-at-Risk and expected shortfall over simulated horizon returns
//! - A separately drawn sample of full trajectories for charting
//!
//! Everything here is pure computation over in-memory data. A run owns its
//! generator, so independent runs may execute concurrently.
//!
//! ```ignore
//! use riskcast_core::{ReturnSeries, SimulationConfig, estimate, simulate};
//!
//! let series = vec![
//!     ReturnSeries::from_prices("AAPL", &aapl_prices)?,
//!     ReturnSeries::from_prices("MSFT", &msft_prices)?,
//! ];
//! let model = estimate(&series)?;
//! let result = simulate(&model, &[0.6, 0.4], &SimulationConfig::default())?;
//! println!("VaR 95%: {:.2}%", result.var_95 * 100.0);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod error;
pub mod estimator;
pub mod sampler;
pub mod simulation;
pub mod stats;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use error::{ErrorKind, Result, RiskError};
pub use estimator::{estimate, estimate_from_aligned};
pub use model::{
    AlignedReturnMatrix, AnnualizedStats, ReturnModel, ReturnSeries, SharpeRating,
    SimulationResult,
};
pub use simulation::{
    ExecutionMode, SimulationConfig, SimulationRun, TRADING_PERIODS_PER_YEAR,
    annualized_statistics, simulate,
};
pub use stats::HistogramBin;
