//! Incremental residual/log-determinant accumulation.
//!
//! Folds per-observation (or per-block) innovation contributions produced by
//! an external filtering process into a [`LikelihoodValue`]. Two concerns
//! drive the design:
//!
//! - **Numerical range.** The determinant term is a product of thousands of
//!   innovation variances; [`DeterminantAccumulator`] keeps it as a
//!   mantissa/exponent pair rescaled into a safe band so the running product
//!   neither overflows nor underflows before the logarithm is taken.
//! - **Degenerate observations.** An observation with both a near-zero
//!   innovation and a near-zero variance carries no information; it is
//!   skipped silently rather than treated as an error.
//!
//! Correlated blocks are reduced to independent scalar contributions through
//! a tolerance-aware Cholesky factorization, preserving the determinant term
//! via `ln|V| = 2·Σ ln L[i,i]`.

use crate::{
    likelihood::{errors::LikResult, errors::LikelihoodError, value::LikelihoodValue},
    linalg::{CHOLESKY_TOL, cholesky_lower, solve_lower},
};
use ndarray::{ArrayView1, ArrayView2};

/// Observations with both |e| and |var| below this bound are skipped.
pub const DEGENERATE_TOL: f64 = 1e-9;

/// Rescaling band bounds for the running determinant product.
const RANGE_HIGH: f64 = 1e150;
const RANGE_LOW: f64 = 1e-150;
/// ln(RANGE_HIGH), the exponent step in log space.
const RANGE_LN: f64 = 345.387_763_949_106_9;

/// Running product of innovation variances kept as `mantissa · RANGE_HIGHᵉ`.
///
/// After every multiplication the mantissa is renormalized into
/// `[RANGE_LOW, RANGE_HIGH)` (in absolute value) by shifting the exponent,
/// so `log_value()` stays accurate for arbitrarily long accumulation runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterminantAccumulator {
    mantissa: f64,
    exponent: i64,
}

impl DeterminantAccumulator {
    pub fn new() -> Self {
        Self { mantissa: 1.0, exponent: 0 }
    }

    /// Fold one variance factor into the running product.
    pub fn add(&mut self, factor: f64) {
        self.mantissa *= factor;
        while self.mantissa.abs() >= RANGE_HIGH {
            self.mantissa *= RANGE_LOW;
            self.exponent += 1;
        }
        while self.mantissa != 0.0 && self.mantissa.abs() < RANGE_LOW {
            self.mantissa *= RANGE_HIGH;
            self.exponent -= 1;
        }
    }

    /// Natural logarithm of the absolute running product.
    pub fn log_value(&self) -> f64 {
        self.mantissa.abs().ln() + self.exponent as f64 * RANGE_LN
    }

    /// Reset to the empty product.
    pub fn clear(&mut self) {
        self.mantissa = 1.0;
        self.exponent = 0;
    }
}

impl Default for DeterminantAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental builder of a [`LikelihoodValue`] from standardized residual
/// contributions.
///
/// Reusable across estimation passes: call [`ResidualAccumulator::clear`]
/// between passes instead of reallocating.
#[derive(Debug, Clone, Default)]
pub struct ResidualAccumulator {
    determinant: DeterminantAccumulator,
    ssq: f64,
    n: usize,
}

impl ResidualAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one scalar observation `(e, var)`.
    ///
    /// Skips silently when both `|var|` and `|e|` fall below
    /// [`DEGENERATE_TOL`]; otherwise adds `var` to the determinant product,
    /// `e²/var` to the sum of squares, and increments the count.
    pub fn add(&mut self, e: f64, var: f64) {
        if var.abs() < DEGENERATE_TOL && e.abs() < DEGENERATE_TOL {
            return;
        }
        self.determinant.add(var);
        self.ssq += e * e / var;
        self.n += 1;
    }

    /// Fold one already-standardized observation `(z, stddev)`, the form a
    /// Cholesky reduction produces: `stddev²` enters the determinant, `z²`
    /// the sum of squares.
    pub fn add_standardized(&mut self, z: f64, stddev: f64) {
        if stddev.abs() < DEGENERATE_TOL && z.abs() < DEGENERATE_TOL {
            return;
        }
        self.determinant.add(stddev * stddev);
        self.ssq += z * z;
        self.n += 1;
    }

    /// Fold a correlated block: innovation vector `e` with covariance `cov`.
    ///
    /// Factorizes `cov = L·Lᵀ` with tolerance [`CHOLESKY_TOL`], solves
    /// `L·z = e`, and folds each `(z_i, L[i,i])` pair through
    /// [`ResidualAccumulator::add_standardized`]. Since
    /// `ln|V| = 2·Σ ln L[i,i]`, the block's determinant contribution is
    /// preserved exactly by the scalar folds.
    ///
    /// # Errors
    /// - [`LikelihoodError::DimensionMismatch`] if `e.len() != cov.nrows()`.
    /// - [`LikelihoodError::CholeskyFailure`] for an ill-conditioned block.
    pub fn add_block(&mut self, e: ArrayView1<f64>, cov: ArrayView2<f64>) -> LikResult<()> {
        if e.len() != cov.nrows() {
            return Err(LikelihoodError::DimensionMismatch {
                expected: cov.nrows(),
                found: e.len(),
            });
        }
        let l = cholesky_lower(cov, CHOLESKY_TOL)?;
        let z = solve_lower(l.view(), e)?;
        for i in 0..z.len() {
            self.add_standardized(z[i], l[(i, i)]);
        }
        Ok(())
    }

    /// Freeze the current totals into an immutable [`LikelihoodValue`].
    pub fn evaluate(&self) -> LikelihoodValue {
        LikelihoodValue::unchecked(self.n, self.determinant.log_value(), self.ssq)
    }

    /// Reset all accumulators so the instance can be reused for the next
    /// estimation pass.
    pub fn clear(&mut self) {
        self.determinant.clear();
        self.ssq = 0.0;
        self.n = 0;
    }

    /// Number of observations folded so far.
    pub fn observations(&self) -> usize {
        self.n
    }
}
