use jiff::civil::Date;
use nalgebra::DMatrix;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Result, RiskError};
use crate::model::ReturnSeries;

/// Multi-instrument return table restricted to dates where every instrument
/// has a defined return.
///
/// Rows are dates in ascending order, columns are instruments in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedReturnMatrix {
    tickers: Vec<String>,
    dates: Vec<Date>,
    returns: DMatrix<f64>,
}

impl AlignedReturnMatrix {
    /// Intersect the dates of all series, keeping only fully-populated rows.
    ///
    /// Fails with `InsufficientData` if any series has no defined observation,
    /// and with `DataAlignment` if no instruments are supplied or a ticker
    /// appears twice. An empty intersection is *not* an error here; the
    /// estimator decides how many rows it needs.
    pub fn align(series: &[ReturnSeries]) -> Result<Self> {
        let Some(first) = series.first() else {
            return Err(RiskError::alignment("no instruments supplied"));
        };

        let mut seen = FxHashSet::default();
        for s in series {
            if !seen.insert(s.ticker()) {
                return Err(RiskError::alignment(format!(
                    "instrument {} supplied more than once",
                    s.ticker()
                )));
            }
            if s.is_empty() {
                return Err(RiskError::InsufficientData {
                    ticker: s.ticker().to_string(),
                    reason: "series is empty",
                });
            }
            if s.defined_len() == 0 {
                return Err(RiskError::InsufficientData {
                    ticker: s.ticker().to_string(),
                    reason: "series has no defined returns",
                });
            }
        }

        let lookups: Vec<FxHashMap<Date, f64>> = series[1..]
            .iter()
            .map(|s| s.observations().iter().copied().collect())
            .collect();

        // The first series is strictly increasing, so walking it keeps the
        // aligned dates sorted.
        let mut dates = Vec::new();
        let mut values = Vec::new();
        let mut row = Vec::with_capacity(series.len());
        for &(date, first_value) in first.observations() {
            row.clear();
            row.push(first_value);
            for lookup in &lookups {
                match lookup.get(&date) {
                    Some(v) => row.push(*v),
                    None => break,
                }
            }
            if row.len() == series.len() && row.iter().all(|v| !v.is_nan()) {
                dates.push(date);
                values.extend_from_slice(&row);
            }
        }

        let returns = DMatrix::from_row_slice(dates.len(), series.len(), &values);
        tracing::debug!(
            instruments = series.len(),
            rows = dates.len(),
            "aligned return series"
        );

        Ok(Self {
            tickers: series.iter().map(|s| s.ticker().to_string()).collect(),
            dates,
            returns,
        })
    }

    #[must_use]
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Row-per-date, column-per-instrument return matrix
    #[must_use]
    pub fn returns(&self) -> &DMatrix<f64> {
        &self.returns
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.dates.len()
    }

    #[must_use]
    pub fn num_instruments(&self) -> usize {
        self.tickers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use jiff::civil::date;

    fn series(ticker: &str, days: &[i8], value: f64) -> ReturnSeries {
        let obs = days
            .iter()
            .map(|d| (date(2024, 3, *d), value + f64::from(*d) / 1000.0))
            .collect();
        ReturnSeries::new(ticker, obs).unwrap()
    }

    #[test]
    fn test_align_keeps_intersection() {
        let input = [
            series("A", &[1, 2, 3], 0.01),
            series("B", &[2, 3, 4], 0.02),
            series("C", &[2, 3], 0.03),
        ];
        let aligned = AlignedReturnMatrix::align(&input).unwrap();

        assert_eq!(aligned.dates(), &[date(2024, 3, 2), date(2024, 3, 3)]);
        assert_eq!(aligned.tickers(), &["A", "B", "C"]);
        assert_eq!(aligned.returns().shape(), (2, 3));
        assert!((aligned.returns()[(0, 1)] - 0.022).abs() < 1e-12);
        assert!((aligned.returns()[(1, 2)] - 0.033).abs() < 1e-12);
    }

    #[test]
    fn test_align_drops_undefined_rows() {
        let a = ReturnSeries::new(
            "A",
            vec![
                (date(2024, 3, 1), f64::NAN),
                (date(2024, 3, 2), 0.01),
                (date(2024, 3, 3), 0.02),
            ],
        )
        .unwrap();
        let b = series("B", &[1, 2, 3], 0.0);
        let aligned = AlignedReturnMatrix::align(&[a, b]).unwrap();

        assert_eq!(aligned.dates(), &[date(2024, 3, 2), date(2024, 3, 3)]);
    }

    #[test]
    fn test_align_order_follows_first_series() {
        let aligned = AlignedReturnMatrix::align(&[
            series("B", &[5, 6, 7], 0.0),
            series("A", &[5, 7], 0.0),
        ])
        .unwrap();
        assert_eq!(aligned.dates(), &[date(2024, 3, 5), date(2024, 3, 7)]);
    }

    #[test]
    fn test_align_disjoint_dates_gives_empty_matrix() {
        let aligned =
            AlignedReturnMatrix::align(&[series("A", &[1, 2], 0.0), series("B", &[3, 4], 0.0)])
                .unwrap();
        assert_eq!(aligned.num_rows(), 0);
        assert_eq!(aligned.num_instruments(), 2);
    }

    #[test]
    fn test_align_rejects_empty_series() {
        let empty = ReturnSeries::new("EMPTY", vec![]).unwrap();
        let err = AlignedReturnMatrix::align(&[series("A", &[1], 0.0), empty]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn test_align_rejects_duplicate_ticker() {
        let err =
            AlignedReturnMatrix::align(&[series("A", &[1], 0.0), series("A", &[1], 0.0)])
                .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataAlignment);
    }

    #[test]
    fn test_align_rejects_no_instruments() {
        let err = AlignedReturnMatrix::align(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataAlignment);
    }
}
