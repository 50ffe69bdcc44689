//! Report assembled from a completed run

use nalgebra::DMatrix;
use riskcast_core::{HistogramBin, ReturnModel, SimulationResult, estimate, simulate};
use serde::Serialize;

use crate::request::{Overrides, RequestError, RunRequest};

pub const DEFAULT_HISTOGRAM_BINS: usize = 50;

/// Estimated per-period statistics, in instrument order
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub tickers: Vec<String>,
    pub observations: Option<usize>,
    pub mean: Vec<f64>,
    pub covariance: Vec<Vec<f64>>,
    pub correlation: Vec<Vec<f64>>,
}

fn matrix_rows(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}

impl From<&ReturnModel> for ModelReport {
    fn from(model: &ReturnModel) -> Self {
        Self {
            tickers: model.tickers().to_vec(),
            observations: model.observations(),
            mean: model.mean().iter().copied().collect(),
            covariance: matrix_rows(model.covariance()),
            correlation: matrix_rows(&model.correlation()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub weights: Vec<f64>,
    pub model: ModelReport,
    pub sharpe_rating: &'static str,
    pub histogram: Vec<HistogramBin>,
    pub mean_path: Vec<f64>,
    #[serde(flatten)]
    pub result: SimulationResult,
}

/// Estimate the model for `request` and simulate it.
pub fn run(
    request: &RunRequest,
    overrides: &Overrides,
    bins: usize,
) -> Result<Report, RequestError> {
    let series = request.series()?;
    let weights = request.weights();
    let config = request.simulation_config(overrides);

    let model = estimate(&series)?;
    tracing::info!(
        instruments = model.num_instruments(),
        observations = model.observations(),
        horizon = config.horizon,
        trials = config.trials,
        "estimated return model"
    );

    let result = simulate(&model, &weights, &config)?;
    tracing::info!(
        expected_return = result.expected_return,
        volatility = result.volatility,
        sharpe_ratio = result.sharpe_ratio,
        var_95 = result.var_95,
        "simulation finished"
    );

    Ok(Report {
        weights,
        model: ModelReport::from(&model),
        sharpe_rating: result.sharpe_rating().label(),
        histogram: result.histogram(bins),
        mean_path: result.mean_path(),
        result,
    })
}
