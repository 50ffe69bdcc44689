//! Multivariate normal sampling over a return model.
//!
//! Draws are `μ + L·z` where `z` is a vector of independent standard normals
//! (drawn in instrument order) and `L` is a factor with `L·Lᵀ = Σ`.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{Result, RiskError};
use crate::model::ReturnModel;

/// Eigenvalues down to `-PSD_TOLERANCE * max|λ|` are treated as rounding
/// noise and clamped to zero; anything more negative is rejected.
pub const PSD_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factorization {
    Cholesky,
    /// Eigen-decomposition, used when the covariance is only semi-definite
    Eigen,
}

/// Normal distribution with a full covariance matrix.
#[derive(Debug, Clone)]
pub struct MultivariateNormal {
    mean: DVector<f64>,
    factor: DMatrix<f64>,
    factorization: Factorization,
}

impl MultivariateNormal {
    pub fn new(mean: DVector<f64>, covariance: &DMatrix<f64>) -> Result<Self> {
        let n = mean.len();
        if covariance.shape() != (n, n) {
            return Err(RiskError::sampling(format!(
                "covariance shape {:?} does not match mean length {n}",
                covariance.shape()
            )));
        }
        if mean.iter().chain(covariance.iter()).any(|v| !v.is_finite()) {
            return Err(RiskError::sampling(
                "mean and covariance entries must be finite",
            ));
        }

        if let Some(chol) = covariance.clone().cholesky() {
            return Ok(Self {
                mean,
                factor: chol.unpack(),
                factorization: Factorization::Cholesky,
            });
        }

        let eigen = SymmetricEigen::new(covariance.clone());
        let largest = eigen.eigenvalues.amax();
        let smallest = eigen.eigenvalues.min();
        if smallest < -PSD_TOLERANCE * largest {
            return Err(RiskError::sampling(format!(
                "covariance matrix is not positive semi-definite (smallest eigenvalue {smallest:e})"
            )));
        }
        tracing::warn!(
            smallest_eigenvalue = smallest,
            "covariance is singular, sampling via eigen-decomposition"
        );

        let roots = eigen.eigenvalues.map(|v| v.max(0.0).sqrt());
        let mut factor = eigen.eigenvectors;
        for (j, root) in roots.iter().enumerate() {
            factor.column_mut(j).scale_mut(*root);
        }

        Ok(Self {
            mean,
            factor,
            factorization: Factorization::Eigen,
        })
    }

    pub fn from_model(model: &ReturnModel) -> Result<Self> {
        Self::new(model.mean().clone(), model.covariance())
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    #[must_use]
    pub fn factorization(&self) -> Factorization {
        self.factorization
    }

    /// Draw one joint sample of per-instrument returns.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> DVector<f64> {
        let z = DVector::from_fn(self.dim(), |_, _| rng.sample::<f64, _>(StandardNormal));
        &self.mean + &self.factor * z
    }

    /// Collapse the distribution onto a weight vector.
    ///
    /// For `r = μ + L·z`, `w·r = w·μ + (Lᵀw)·z`, so a portfolio draw needs the
    /// same standard normals as a joint draw but only one dot product.
    pub fn project(&self, weights: &[f64]) -> Result<PortfolioSampler> {
        if weights.len() != self.dim() {
            return Err(RiskError::invalid(
                "weights",
                format!("expected {} weights, got {}", self.dim(), weights.len()),
            ));
        }
        let w = DVector::from_column_slice(weights);
        Ok(PortfolioSampler {
            drift: w.dot(&self.mean),
            loading: self.factor.tr_mul(&w),
        })
    }
}

/// Per-period portfolio return sampler derived from a [`MultivariateNormal`].
#[derive(Debug, Clone)]
pub struct PortfolioSampler {
    drift: f64,
    loading: DVector<f64>,
}

impl PortfolioSampler {
    #[must_use]
    pub fn drift(&self) -> f64 {
        self.drift
    }

    /// Draw one period's portfolio return.
    #[inline]
    pub fn period_return<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.drift
            + self
                .loading
                .iter()
                .map(|l| l * rng.sample::<f64, _>(StandardNormal))
                .sum::<f64>()
    }

    /// Compound `horizon` period returns: `Π(1 + r) - 1`.
    pub fn cumulative_return<R: Rng + ?Sized>(&self, rng: &mut R, horizon: usize) -> Result<f64> {
        let mut growth = 1.0;
        for _ in 0..horizon {
            growth *= 1.0 + self.period_return(rng);
        }
        if growth.is_finite() {
            Ok(growth - 1.0)
        } else {
            Err(RiskError::sampling("compounded return is not finite"))
        }
    }

    /// Running product of `(1 + r)` at every period, starting from a base of 1.0.
    pub fn path<R: Rng + ?Sized>(&self, rng: &mut R, horizon: usize) -> Result<Vec<f64>> {
        let mut value = 1.0;
        let mut path = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            value *= 1.0 + self.period_return(rng);
            path.push(value);
        }
        if value.is_finite() {
            Ok(path)
        } else {
            Err(RiskError::sampling("sample path value is not finite"))
        }
    }
}
