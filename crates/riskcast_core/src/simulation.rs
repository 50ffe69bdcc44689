use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::{Result, RiskError};
use crate::model::{AnnualizedStats, ReturnModel, SimulationResult};
use crate::sampler::{MultivariateNormal, PortfolioSampler};
use crate::stats;

/// Trading periods in one year. Annualised statistics always use this,
/// whatever horizon is simulated.
pub const TRADING_PERIODS_PER_YEAR: f64 = 252.0;

pub const DEFAULT_HORIZON: i64 = 252;
pub const DEFAULT_TRIALS: i64 = 1000;
pub const DEFAULT_SAMPLE_PATHS: usize = 100;
pub const DEFAULT_SEED: u64 = 42;

/// Lower-tail percentile reported as Value-at-Risk (95% confidence)
pub const VAR_PERCENTILE: f64 = 0.05;

/// How trials consume random numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One generator seeded once; risk trials draw first, then sample paths,
    /// each in index order.
    #[default]
    Sequential,
    /// Trial `i` draws from stream `i` of a generator seeded with the run
    /// seed, sample path `j` from stream `trials + j`. Output does not depend
    /// on scheduling, so trials run on the rayon pool when `parallel` is on.
    PerTrialStreams,
}

/// Parameters of one simulation run.
///
/// `horizon` and `trials` are signed so that out-of-range requests are
/// reported as errors instead of being unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of simulated periods per trial
    pub horizon: i64,
    /// Number of risk-metric trials
    pub trials: i64,
    /// Number of full trajectories kept for display
    pub sample_paths: usize,
    pub seed: u64,
    pub mode: ExecutionMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            trials: DEFAULT_TRIALS,
            sample_paths: DEFAULT_SAMPLE_PATHS,
            seed: DEFAULT_SEED,
            mode: ExecutionMode::Sequential,
        }
    }
}

fn validate_weights(model: &ReturnModel, weights: &[f64]) -> Result<()> {
    if weights.len() != model.num_instruments() {
        return Err(RiskError::invalid(
            "weights",
            format!(
                "expected {} weights, got {}",
                model.num_instruments(),
                weights.len()
            ),
        ));
    }
    if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
        return Err(RiskError::invalid(
            "weights",
            format!("weights must be finite, got {w}"),
        ));
    }
    Ok(())
}

/// Closed-form annualised return, volatility and Sharpe ratio of a portfolio.
///
/// Expected return is `(w · μ) × 252`, volatility `sqrt(wᵀ (Σ × 252) w)`.
/// The Sharpe ratio is defined as 0 when volatility is exactly 0.
pub fn annualized_statistics(model: &ReturnModel, weights: &[f64]) -> Result<AnnualizedStats> {
    validate_weights(model, weights)?;
    let w = nalgebra::DVector::from_column_slice(weights);

    let expected_return = model.portfolio_mean(&w) * TRADING_PERIODS_PER_YEAR;
    let annual_covariance = model.covariance() * TRADING_PERIODS_PER_YEAR;
    let variance = w.dot(&(annual_covariance * &w));
    if !expected_return.is_finite() || !variance.is_finite() {
        return Err(RiskError::invalid(
            "model",
            format!("annualised return {expected_return} or variance {variance} is not finite"),
        ));
    }
    // Rounding can leave a semi-definite quadratic form a hair below zero
    let volatility = if variance < 0.0 { 0.0 } else { variance.sqrt() };

    let sharpe_ratio = if volatility == 0.0 {
        0.0
    } else {
        expected_return / volatility
    };

    Ok(AnnualizedStats {
        expected_return,
        volatility,
        sharpe_ratio,
    })
}

/// A validated, single-use simulation request.
#[derive(Debug, Clone)]
pub struct SimulationRun<'a> {
    model: &'a ReturnModel,
    weights: &'a [f64],
    horizon: usize,
    trials: usize,
    sample_paths: usize,
    seed: u64,
    mode: ExecutionMode,
}

impl<'a> SimulationRun<'a> {
    pub fn new(
        model: &'a ReturnModel,
        weights: &'a [f64],
        config: &SimulationConfig,
    ) -> Result<Self> {
        let horizon = usize::try_from(config.horizon)
            .ok()
            .filter(|h| *h > 0)
            .ok_or_else(|| {
                RiskError::invalid("horizon", format!("must be positive, got {}", config.horizon))
            })?;
        let trials = usize::try_from(config.trials)
            .ok()
            .filter(|t| *t > 0)
            .ok_or_else(|| {
                RiskError::invalid("trials", format!("must be positive, got {}", config.trials))
            })?;
        validate_weights(model, weights)?;

        Ok(Self {
            model,
            weights,
            horizon,
            trials,
            sample_paths: config.sample_paths,
            seed: config.seed,
            mode: config.mode,
        })
    }

    #[must_use]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    #[must_use]
    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn execute(&self) -> Result<SimulationResult> {
        tracing::debug!(
            instruments = self.model.num_instruments(),
            horizon = self.horizon,
            trials = self.trials,
            sample_paths = self.sample_paths,
            seed = self.seed,
            mode = ?self.mode,
            "starting simulation run"
        );

        let annual = annualized_statistics(self.model, self.weights)?;
        let sampler = MultivariateNormal::from_model(self.model)?.project(self.weights)?;

        let (final_values, paths_sample) = match self.mode {
            ExecutionMode::Sequential => self.draw_sequential(&sampler)?,
            ExecutionMode::PerTrialStreams => self.draw_per_trial_streams(&sampler)?,
        };

        let var_95 = stats::percentile(&final_values, VAR_PERCENTILE)?;
        let expected_shortfall_95 = stats::expected_shortfall(&final_values, var_95).unwrap_or(var_95);
        let probability_of_loss = stats::fraction_negative(&final_values);

        tracing::debug!(
            expected_return = annual.expected_return,
            volatility = annual.volatility,
            var_95,
            "simulation run complete"
        );

        Ok(SimulationResult {
            expected_return: annual.expected_return,
            volatility: annual.volatility,
            sharpe_ratio: annual.sharpe_ratio,
            var_95,
            expected_shortfall_95,
            probability_of_loss,
            final_values,
            paths_sample,
            horizon: self.horizon,
            trials: self.trials,
            seed: self.seed,
        })
    }

    fn draw_sequential(&self, sampler: &PortfolioSampler) -> Result<(Vec<f64>, Vec<Vec<f64>>)> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let final_values = (0..self.trials)
            .map(|_| sampler.cumulative_return(&mut rng, self.horizon))
            .collect::<Result<Vec<_>>>()?;
        // Paths continue the same stream after the risk trials
        let paths = (0..self.sample_paths)
            .map(|_| sampler.path(&mut rng, self.horizon))
            .collect::<Result<Vec<_>>>()?;

        Ok((final_values, paths))
    }

    fn draw_per_trial_streams(
        &self,
        sampler: &PortfolioSampler,
    ) -> Result<(Vec<f64>, Vec<Vec<f64>>)> {
        let trials = self.trials as u64;
        let paths = self.sample_paths as u64;

        #[cfg(feature = "parallel")]
        let (final_values, paths) = (
            (0..trials)
                .into_par_iter()
                .map(|i| sampler.cumulative_return(&mut stream_rng(self.seed, i), self.horizon))
                .collect::<Result<Vec<_>>>()?,
            (0..paths)
                .into_par_iter()
                .map(|j| sampler.path(&mut stream_rng(self.seed, trials + j), self.horizon))
                .collect::<Result<Vec<_>>>()?,
        );

        #[cfg(not(feature = "parallel"))]
        let (final_values, paths) = (
            (0..trials)
                .map(|i| sampler.cumulative_return(&mut stream_rng(self.seed, i), self.horizon))
                .collect::<Result<Vec<_>>>()?,
            (0..paths)
                .map(|j| sampler.path(&mut stream_rng(self.seed, trials + j), self.horizon))
                .collect::<Result<Vec<_>>>()?,
        );

        Ok((final_values, paths))
    }
}

/// Independent generator for one trial, keyed by the run seed and a stream id.
#[must_use]
pub fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Run one simulation: validate, sample, aggregate.
pub fn simulate(
    model: &ReturnModel,
    weights: &[f64],
    config: &SimulationConfig,
) -> Result<SimulationResult> {
    SimulationRun::new(model, weights, config)?.execute()
}
