use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// Periodic returns of a single instrument, ordered by strictly increasing date.
///
/// A `NaN` value marks an undefined return (e.g. the first period after a gap).
/// Rows holding one are dropped when series are aligned, never imputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    ticker: String,
    observations: Vec<(Date, f64)>,
}

impl ReturnSeries {
    /// Create a series from `(date, fractional return)` pairs.
    ///
    /// Dates must be strictly increasing. Values are finite or `NaN`.
    pub fn new(ticker: impl Into<String>, observations: Vec<(Date, f64)>) -> Result<Self> {
        let ticker = ticker.into();
        if let Some((date, value)) = observations.iter().find(|(_, r)| r.is_infinite()) {
            return Err(RiskError::invalid(
                "observations",
                format!("{ticker}: return on {date} is {value}"),
            ));
        }
        if let Some(pair) = observations.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(RiskError::invalid(
                "observations",
                format!(
                    "{ticker}: dates must be strictly increasing ({} then {})",
                    pair[0].0, pair[1].0
                ),
            ));
        }
        Ok(Self {
            ticker,
            observations,
        })
    }

    /// Build a return series from closing prices.
    ///
    /// Each return is `p[i] / p[i - 1] - 1` and is stamped with the date of
    /// `p[i]`; the first price has no predecessor and produces no entry.
    pub fn from_prices(ticker: impl Into<String>, prices: &[(Date, f64)]) -> Result<Self> {
        let ticker = ticker.into();
        if let Some((date, price)) = prices.iter().find(|(_, p)| !p.is_finite() || *p <= 0.0) {
            return Err(RiskError::invalid(
                "prices",
                format!("{ticker}: price on {date} must be positive and finite, got {price}"),
            ));
        }

        let observations = prices
            .windows(2)
            .map(|w| (w[1].0, w[1].1 / w[0].1 - 1.0))
            .collect();
        Self::new(ticker, observations)
    }

    #[must_use]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    #[must_use]
    pub fn observations(&self) -> &[(Date, f64)] {
        &self.observations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of observations carrying a defined (non-NaN) return
    #[must_use]
    pub fn defined_len(&self) -> usize {
        self.observations.iter().filter(|(_, r)| !r.is_nan()).count()
    }
}
