//! Error surface for the outlier-detection layer.
//!
//! Every numerical failure raised inside the iterative loop is caught
//! exactly once, at the `process()` boundary, and converted into a `false`
//! return; these variants exist so estimator and scanner implementations
//! can report failures uniformly on the way there.

use crate::likelihood::errors::LikelihoodError;

/// Crate-wide result alias for outlier-detection operations.
pub type OutlierResult<T> = Result<T, OutlierError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OutlierError {
    /// A re-estimation pass failed; `text` carries the estimator's own
    /// diagnostic.
    EstimationFailure {
        text: String,
    },

    /// Lifted likelihood-layer failure (ill-conditioned covariance,
    /// singular factor, builder misuse inside an estimator).
    Likelihood(LikelihoodError),

    /// The scanner reported a winning type index with no registered factory.
    UnknownOutlierType {
        type_index: usize,
        registered: usize,
    },

    /// No outlier factories were configured before `process()`.
    NoFactoriesConfigured,

    /// Scan bounds do not define a non-empty candidate window.
    InvalidBounds {
        start: usize,
        end: usize,
    },
}

impl std::error::Error for OutlierError {}

impl std::fmt::Display for OutlierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutlierError::EstimationFailure { text } => {
                write!(f, "Estimation failure: {text}")
            }
            OutlierError::Likelihood(err) => {
                write!(f, "Likelihood failure: {err}")
            }
            OutlierError::UnknownOutlierType { type_index, registered } => {
                write!(
                    f,
                    "Unknown outlier type index {type_index}: only {registered} factories registered"
                )
            }
            OutlierError::NoFactoriesConfigured => {
                write!(f, "No outlier factories configured")
            }
            OutlierError::InvalidBounds { start, end } => {
                write!(f, "Invalid scan bounds [{start}, {end})")
            }
        }
    }
}

impl From<LikelihoodError> for OutlierError {
    fn from(err: LikelihoodError) -> Self {
        OutlierError::Likelihood(err)
    }
}
