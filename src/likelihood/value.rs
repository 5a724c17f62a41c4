//! Immutable likelihood record: sample size, log-determinant, ssq.

use crate::likelihood::errors::{LikResult, LikelihoodError};

/// Outcome of one estimation pass, concentrated with respect to the
/// residual scale.
///
/// Holds the effective observation count `n` (missing observations
/// excluded), the log-determinant of the error covariance transform, and
/// the sum of squared standardized errors. The log-likelihood and the
/// determinantal factor are derived on demand:
///
/// ℓ = −½·(n·ln 2π + n·(1 + ln(ssq/n)) + ldet),  factor = exp(ldet/n)
///
/// Instances are created once per estimation pass and never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LikelihoodValue {
    n: usize,
    log_determinant: f64,
    ssq: f64,
}

impl LikelihoodValue {
    /// Build a validated likelihood record.
    ///
    /// # Errors
    /// - [`LikelihoodError::InvalidSsq`] for non-finite or negative `ssq`.
    /// - [`LikelihoodError::InvalidLogDeterminant`] for non-finite `ldet`.
    pub fn new(n: usize, log_determinant: f64, ssq: f64) -> LikResult<Self> {
        if !ssq.is_finite() || ssq < 0.0 {
            return Err(LikelihoodError::InvalidSsq { value: ssq });
        }
        if !log_determinant.is_finite() {
            return Err(LikelihoodError::InvalidLogDeterminant { value: log_determinant });
        }
        Ok(Self { n, log_determinant, ssq })
    }

    /// Internal constructor for callers whose accumulation invariants
    /// already guarantee validity.
    pub(crate) fn unchecked(n: usize, log_determinant: f64, ssq: f64) -> Self {
        Self { n, log_determinant, ssq }
    }

    /// Effective number of observations.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Log-determinant of the error covariance transform.
    pub fn log_determinant(&self) -> f64 {
        self.log_determinant
    }

    /// Sum of squared standardized errors.
    pub fn ssq(&self) -> f64 {
        self.ssq
    }

    /// Concentrated Gaussian log-likelihood. `NaN` when `n == 0` (no
    /// observations contribute, so the profile is undefined).
    pub fn log_likelihood(&self) -> f64 {
        if self.n == 0 {
            return f64::NAN;
        }
        let n = self.n as f64;
        -0.5 * (n * (2.0 * std::f64::consts::PI).ln()
            + n * (1.0 + (self.ssq / n).ln())
            + self.log_determinant)
    }

    /// Determinantal scale factor `exp(ldet/n)`. `NaN` when `n == 0`.
    pub fn factor(&self) -> f64 {
        if self.n == 0 {
            return f64::NAN;
        }
        (self.log_determinant / self.n as f64).exp()
    }
}
