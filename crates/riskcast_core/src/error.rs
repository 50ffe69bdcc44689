/// Broad category of a [`RiskError`], for callers that branch on the failure
/// class rather than its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InsufficientData,
    DataAlignment,
    InvalidParameter,
    Sampling,
}

/// Errors reported by the estimator and the simulation engine.
///
/// Every failure is deterministic given the inputs, so none of them are retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RiskError {
    /// An instrument's series is empty or has no defined observation
    #[error("insufficient data for {ticker}: {reason}")]
    InsufficientData { ticker: String, reason: &'static str },

    /// No usable set of aligned observation rows across instruments
    #[error("cannot align return series: {reason}")]
    DataAlignment { reason: String },

    /// A caller-supplied parameter is out of range or inconsistent
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The covariance matrix cannot parameterise a normal distribution, or the
    /// draws it produced are not finite
    #[error("sampling failed: {reason}")]
    Sampling { reason: String },
}

impl RiskError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            RiskError::InsufficientData { .. } => ErrorKind::InsufficientData,
            RiskError::DataAlignment { .. } => ErrorKind::DataAlignment,
            RiskError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            RiskError::Sampling { .. } => ErrorKind::Sampling,
        }
    }

    pub(crate) fn alignment(reason: impl Into<String>) -> Self {
        RiskError::DataAlignment {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        RiskError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn sampling(reason: impl Into<String>) -> Self {
        RiskError::Sampling {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;
