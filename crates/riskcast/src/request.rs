//! Run request files
//!
//! A request names the instruments, their weights and either closing prices or
//! precomputed periodic returns, plus optional simulation parameters:
//!
//! ```yaml
//! days: 252
//! simulations: 1000
//! instruments:
//!   - ticker: AAPL
//!     weight: 0.6
//!     prices: [["2024-01-02", 185.6], ["2024-01-03", 184.2]]
//!   - ticker: MSFT
//!     weight: 0.4
//!     returns: [["2024-01-03", -0.0007]]
//! ```

use std::path::{Path, PathBuf};

use jiff::civil::Date;
use riskcast_core::simulation::{DEFAULT_HORIZON, DEFAULT_SAMPLE_PATHS, DEFAULT_SEED, DEFAULT_TRIALS};
use riskcast_core::{ExecutionMode, ReturnSeries, RiskError, SimulationConfig};
use serde::{Deserialize, Serialize};

/// Weights further than this from summing to 1 are logged
const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON request: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML request: {0}")]
    Yaml(String),

    #[error("unsupported request format {0:?} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("instrument {ticker} needs exactly one of `prices` or `returns`")]
    InstrumentData { ticker: String },

    #[error("request contains no instruments")]
    NoInstruments,

    #[error(transparent)]
    Risk(#[from] RiskError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRequest {
    pub ticker: String,
    pub weight: f64,
    #[serde(default)]
    pub prices: Option<Vec<(Date, f64)>>,
    #[serde(default)]
    pub returns: Option<Vec<(Date, f64)>>,
}

impl InstrumentRequest {
    pub fn to_series(&self) -> Result<ReturnSeries, RequestError> {
        match (&self.prices, &self.returns) {
            (Some(prices), None) => Ok(ReturnSeries::from_prices(&self.ticker, prices)?),
            (None, Some(returns)) => Ok(ReturnSeries::new(&self.ticker, returns.clone())?),
            _ => Err(RequestError::InstrumentData {
                ticker: self.ticker.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub instruments: Vec<InstrumentRequest>,
    #[serde(default)]
    pub days: Option<i64>,
    #[serde(default)]
    pub simulations: Option<i64>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub sample_paths: Option<usize>,
}

/// Command-line values that take precedence over the request file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub days: Option<i64>,
    pub simulations: Option<i64>,
    pub seed: Option<u64>,
    pub sample_paths: Option<usize>,
    pub per_trial_streams: bool,
}

impl RunRequest {
    pub fn from_json(text: &str) -> Result<Self, RequestError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self, RequestError> {
        serde_saphyr::from_str(text).map_err(|e| RequestError::Yaml(e.to_string()))
    }

    /// Read a request, picking the parser from the file extension.
    pub fn load(path: &Path) -> Result<Self, RequestError> {
        let text = std::fs::read_to_string(path).map_err(|source| RequestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Self::from_json(&text),
            "yaml" | "yml" => Self::from_yaml(&text),
            _ => Err(RequestError::UnsupportedFormat(ext)),
        }
    }

    pub fn tickers(&self) -> Vec<String> {
        self.instruments.iter().map(|i| i.ticker.clone()).collect()
    }

    /// Weights in instrument order
    pub fn weights(&self) -> Vec<f64> {
        let weights: Vec<f64> = self.instruments.iter().map(|i| i.weight).collect();
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            tracing::warn!(total, "portfolio weights do not sum to 1");
        }
        weights
    }

    pub fn series(&self) -> Result<Vec<ReturnSeries>, RequestError> {
        if self.instruments.is_empty() {
            return Err(RequestError::NoInstruments);
        }
        self.instruments.iter().map(InstrumentRequest::to_series).collect()
    }

    pub fn simulation_config(&self, overrides: &Overrides) -> SimulationConfig {
        SimulationConfig {
            horizon: overrides.days.or(self.days).unwrap_or(DEFAULT_HORIZON),
            trials: overrides
                .simulations
                .or(self.simulations)
                .unwrap_or(DEFAULT_TRIALS),
            sample_paths: overrides
                .sample_paths
                .or(self.sample_paths)
                .unwrap_or(DEFAULT_SAMPLE_PATHS),
            seed: overrides.seed.or(self.seed).unwrap_or(DEFAULT_SEED),
            mode: if overrides.per_trial_streams {
                ExecutionMode::PerTrialStreams
            } else {
                ExecutionMode::Sequential
            },
        }
    }
}
