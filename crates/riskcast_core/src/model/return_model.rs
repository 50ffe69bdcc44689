use nalgebra::{DMatrix, DVector};

use crate::error::{Result, RiskError};

/// Largest asymmetry `|c[i,j] - c[j,i]|`, relative to the largest entry,
/// accepted for a caller-supplied covariance matrix.
const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// Mean vector and covariance matrix of per-period instrument returns.
///
/// The covariance is exactly symmetric; it may be rank-deficient when fewer
/// observations than instruments were available.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnModel {
    tickers: Vec<String>,
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
    /// Number of aligned rows the statistics were estimated from
    observations: Option<usize>,
}

impl ReturnModel {
    /// Build a model from statistics computed elsewhere.
    pub fn new(tickers: Vec<String>, mean: DVector<f64>, covariance: DMatrix<f64>) -> Result<Self> {
        let n = tickers.len();
        if n == 0 {
            return Err(RiskError::invalid("tickers", "at least one instrument is required"));
        }
        if mean.len() != n {
            return Err(RiskError::invalid(
                "mean",
                format!("expected {n} entries, got {}", mean.len()),
            ));
        }
        if covariance.shape() != (n, n) {
            return Err(RiskError::invalid(
                "covariance",
                format!("expected {n}x{n}, got {:?}", covariance.shape()),
            ));
        }
        if mean.iter().chain(covariance.iter()).any(|v| !v.is_finite()) {
            return Err(RiskError::invalid("covariance", "entries must be finite"));
        }

        let scale = covariance.amax().max(1.0);
        for i in 0..n {
            for j in 0..i {
                if (covariance[(i, j)] - covariance[(j, i)]).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(RiskError::invalid(
                        "covariance",
                        format!("matrix is not symmetric at ({i}, {j})"),
                    ));
                }
            }
        }

        let mut covariance = covariance;
        covariance.fill_upper_triangle_with_lower_triangle();
        Ok(Self {
            tickers,
            mean,
            covariance,
            observations: None,
        })
    }

    /// Convenience constructor from plain vectors (covariance given row by row).
    pub fn from_rows(tickers: &[&str], mean: &[f64], covariance: &[&[f64]]) -> Result<Self> {
        let n = tickers.len();
        if covariance.len() != n || covariance.iter().any(|row| row.len() != n) {
            return Err(RiskError::invalid(
                "covariance",
                format!("expected {n} rows of {n} entries"),
            ));
        }
        let flat: Vec<f64> = covariance.iter().flat_map(|row| row.iter().copied()).collect();
        Self::new(
            tickers.iter().map(|t| (*t).to_string()).collect(),
            DVector::from_column_slice(mean),
            DMatrix::from_row_slice(n, n, &flat),
        )
    }

    pub(crate) fn estimated(
        tickers: Vec<String>,
        mean: DVector<f64>,
        covariance: DMatrix<f64>,
        observations: usize,
    ) -> Self {
        Self {
            tickers,
            mean,
            covariance,
            observations: Some(observations),
        }
    }

    #[must_use]
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    #[must_use]
    pub fn num_instruments(&self) -> usize {
        self.tickers.len()
    }

    #[must_use]
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    #[must_use]
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Aligned rows used for estimation, `None` for caller-supplied models
    #[must_use]
    pub fn observations(&self) -> Option<usize> {
        self.observations
    }

    /// Per-period portfolio mean `w · μ`.
    ///
    /// `weights` must have one entry per instrument.
    #[must_use]
    pub fn portfolio_mean(&self, weights: &DVector<f64>) -> f64 {
        weights.dot(&self.mean)
    }

    /// Per-period portfolio variance `wᵀ Σ w`.
    #[must_use]
    pub fn portfolio_variance(&self, weights: &DVector<f64>) -> f64 {
        weights.dot(&(&self.covariance * weights))
    }

    /// Correlation matrix derived from the covariance.
    ///
    /// An instrument with zero variance is reported uncorrelated with the others.
    #[must_use]
    pub fn correlation(&self) -> DMatrix<f64> {
        let std_devs: Vec<f64> = self.covariance.diagonal().iter().map(|v| v.sqrt()).collect();
        DMatrix::from_fn(self.num_instruments(), self.num_instruments(), |i, j| {
            if i == j {
                1.0
            } else {
                let denom = std_devs[i] * std_devs[j];
                if denom > 0.0 {
                    self.covariance[(i, j)] / denom
                } else {
                    0.0
                }
            }
        })
    }
}
