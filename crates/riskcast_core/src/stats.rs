//! Summary statistics over simulated outcome arrays.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

#[inline]
fn lerp(lower: f64, upper: f64, weight: f64) -> f64 {
    lower * (1.0 - weight) + upper * weight
}

/// Arithmetic mean, `None` for an empty slice
#[must_use]
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        None
    } else {
        Some(data.iter().sum::<f64>() / data.len() as f64)
    }
}

/// Percentile `q` (in `[0, 1]`) with linear interpolation between the two
/// nearest order statistics, i.e. position `q * (n - 1)` in the sorted data.
pub fn percentile(data: &[f64], q: f64) -> Result<f64> {
    if data.is_empty() {
        return Err(RiskError::invalid("data", "percentile of an empty slice"));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(RiskError::invalid(
            "percentile",
            format!("must be in [0, 1], got {q}"),
        ));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(RiskError::invalid("data", "percentile input must be finite"));
    }

    let mut values = data.to_vec();
    let position = q * (values.len() - 1) as f64;
    let lower_index = position.floor() as usize;
    let upper_index = position.ceil() as usize;

    if lower_index == upper_index {
        let (_, value, _) = values.select_nth_unstable_by(lower_index, f64::total_cmp);
        Ok(*value)
    } else {
        let (lower_partition, upper_value, _) =
            values.select_nth_unstable_by(upper_index, f64::total_cmp);
        let upper_value = *upper_value;
        // Everything below upper_index is <= upper_value; the lower order
        // statistic is the maximum of that partition.
        let lower_value = lower_partition
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        Ok(lerp(lower_value, upper_value, position - lower_index as f64))
    }
}

/// Mean of all values at or below `threshold` (conditional tail mean).
#[must_use]
pub fn expected_shortfall(data: &[f64], threshold: f64) -> Option<f64> {
    let (sum, count) = data
        .iter()
        .filter(|v| **v <= threshold)
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Fraction of values strictly below zero.
#[must_use]
pub fn fraction_negative(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().filter(|v| **v < 0.0).count() as f64 / data.len() as f64
}

/// One bucket of an equal-width histogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram spanning `[min, max]` of the data.
///
/// The last bin is closed on the right. When every value is identical a single
/// zero-width bin holds them all.
#[must_use]
pub fn histogram(data: &[f64], bins: usize) -> Vec<HistogramBin> {
    if data.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if span <= 0.0 || !span.is_finite() {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: data.len(),
        }];
    }

    let width = span / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in data {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i == bins - 1 {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count,
        })
        .collect()
}
