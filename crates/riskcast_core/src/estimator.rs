//! Mean and covariance estimation from historical return series.

use nalgebra::{DMatrix, DVector};

use crate::error::{Result, RiskError};
use crate::model::{AlignedReturnMatrix, ReturnModel, ReturnSeries};

/// Align `series` on their common dates and estimate a [`ReturnModel`].
///
/// The instrument axis of the model follows the order of `series`.
pub fn estimate(series: &[ReturnSeries]) -> Result<ReturnModel> {
    let aligned = AlignedReturnMatrix::align(series)?;
    estimate_from_aligned(&aligned)
}

/// Sample mean and unbiased sample covariance over the aligned rows.
///
/// At least two rows are required since the `n - 1` covariance is undefined
/// for a single observation.
pub fn estimate_from_aligned(aligned: &AlignedReturnMatrix) -> Result<ReturnModel> {
    let rows = aligned.num_rows();
    match rows {
        0 => {
            return Err(RiskError::alignment(format!(
                "no common fully-populated dates across {} instruments",
                aligned.num_instruments()
            )));
        }
        1 => {
            return Err(RiskError::alignment(
                "only one common date; at least two are needed for a covariance",
            ));
        }
        _ => {}
    }

    let returns = aligned.returns();
    let mean: DVector<f64> = returns.row_mean().transpose();

    let centered = DMatrix::from_fn(rows, returns.ncols(), |i, j| returns[(i, j)] - mean[j]);
    let mut covariance = centered.tr_mul(&centered) / (rows - 1) as f64;
    covariance.fill_upper_triangle_with_lower_triangle();

    if mean.iter().chain(covariance.iter()).any(|v| !v.is_finite()) {
        return Err(RiskError::invalid(
            "returns",
            "estimated mean or covariance is not finite",
        ));
    }

    if rows < aligned.num_instruments() {
        tracing::debug!(
            rows,
            instruments = aligned.num_instruments(),
            "fewer observations than instruments, covariance is rank-deficient"
        );
    }

    Ok(ReturnModel::estimated(
        aligned.tickers().to_vec(),
        mean,
        covariance,
        rows,
    ))
}
