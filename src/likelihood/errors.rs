//! Error surface for the likelihood layer.
//!
//! Numerical failures (ill-conditioned covariance blocks, singular
//! triangular factors) and builder contract violations are reported through
//! [`LikelihoodError`]; degenerate observations are not errors and never
//! appear here — the accumulator silently skips them.

/// Crate-wide result alias for likelihood operations.
pub type LikResult<T> = Result<T, LikelihoodError>;

#[derive(Debug, Clone, PartialEq)]
pub enum LikelihoodError {
    // ---- Builder contract ----
    /// A triangular factor is required whenever missing values are declared;
    /// without it the log-determinant correction is undefined.
    MissingTriangularFactor {
        n_missing: usize,
    },

    /// Effective sample size must be strictly positive.
    InvalidSampleSize {
        n: usize,
    },

    /// Sum of squared errors must be finite and non-negative.
    InvalidSsq {
        value: f64,
    },

    /// Log-determinant must be finite.
    InvalidLogDeterminant {
        value: f64,
    },

    // ---- Numerical failures ----
    /// Cholesky factorization met a non-positive pivot beyond tolerance.
    CholeskyFailure {
        index: usize,
        pivot: f64,
    },

    /// Upper-triangular factor cannot be inverted (zero diagonal entry).
    SingularTriangularFactor {
        order: usize,
    },

    // ---- Shape checks ----
    /// A matrix expected to be square was not.
    NotSquare {
        rows: usize,
        cols: usize,
    },

    /// Vector/matrix dimensions do not agree.
    DimensionMismatch {
        expected: usize,
        found: usize,
    },
}

impl std::error::Error for LikelihoodError {}

impl std::fmt::Display for LikelihoodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LikelihoodError::MissingTriangularFactor { n_missing } => {
                write!(
                    f,
                    "Missing triangular factor: {n_missing} missing observation(s) declared but no R factor supplied"
                )
            }
            LikelihoodError::InvalidSampleSize { n } => {
                write!(f, "Invalid effective sample size {n}: must be strictly positive")
            }
            LikelihoodError::InvalidSsq { value } => {
                write!(f, "Invalid sum of squared errors {value}: must be finite and non-negative")
            }
            LikelihoodError::InvalidLogDeterminant { value } => {
                write!(f, "Invalid log-determinant {value}: must be finite")
            }
            LikelihoodError::CholeskyFailure { index, pivot } => {
                write!(f, "Cholesky factorization failed at index {index}: pivot {pivot} below tolerance")
            }
            LikelihoodError::SingularTriangularFactor { order } => {
                write!(f, "Singular upper-triangular factor of order {order}: zero diagonal entry")
            }
            LikelihoodError::NotSquare { rows, cols } => {
                write!(f, "Matrix is not square: {rows}x{cols}")
            }
            LikelihoodError::DimensionMismatch { expected, found } => {
                write!(f, "Dimension mismatch: expected {expected}, found {found}")
            }
        }
    }
}
