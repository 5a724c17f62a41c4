//! Concentrated likelihood of a GLS regression, with missing-value
//! correction and memoized covariance.
//!
//! Purpose
//! -------
//! Represent the outcome of one GLS estimation pass — coefficients, their
//! unscaled covariance, residuals, sum of squared errors, and the
//! log-determinant of the error transform — and expose the standardized
//! statistics the outlier-detection loop tests against.
//!
//! Key behaviors
//! -------------
//! - Builder-plus-immutable-value construction: a chained
//!   [`ConcentratedLikelihoodBuilder`] accumulates inputs; `build()` freezes
//!   an immutable [`ConcentratedLikelihood`].
//! - Missing observations are represented upstream by additive-outlier
//!   dummies whose columns inflate the determinant of the transformed
//!   design. `build()` removes that artificial contribution by adding
//!   `2·Σ_{i<n_missing} ln|R[i,i]|` to the supplied log-determinant, which
//!   is why the triangular factor is mandatory whenever missing values are
//!   declared.
//! - The unscaled covariance `R⁻¹·R⁻ᵀ` (restricted to the non-missing
//!   block) is computed lazily on first access and memoized in a
//!   `OnceLock`; concurrent readers either see the cached value or
//!   recompute the same deterministic result.
//!
//! Invariants
//! ----------
//! - `coefficients.len() = n_missing + nx` where `nx` is the number of real
//!   regressors.
//! - After `build()` succeeds the value is immutable apart from the
//!   covariance memo.

use crate::{
    likelihood::{
        errors::{LikResult, LikelihoodError},
        value::LikelihoodValue,
    },
    linalg::symmetric_inverse_product,
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use std::sync::OnceLock;

/// Mutable builder for [`ConcentratedLikelihood`].
///
/// All setters are chained and consuming. `build()` validates the inputs,
/// applies the missing-value log-determinant correction, and freezes the
/// result; a declared missing count without a triangular factor fails fast
/// with [`LikelihoodError::MissingTriangularFactor`].
#[derive(Debug, Clone, Default)]
pub struct ConcentratedLikelihoodBuilder {
    n: usize,
    n_missing: usize,
    log_determinant: f64,
    ssq: f64,
    residuals: Option<Array1<f64>>,
    coefficients: Option<Array1<f64>>,
    r_factor: Option<Array2<f64>>,
    covariance: Option<Array2<f64>>,
}

impl ConcentratedLikelihoodBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective sample size, missing observations excluded.
    pub fn sample_size(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    /// Number of missing observations represented by leading dummy columns.
    pub fn missing_count(mut self, n_missing: usize) -> Self {
        self.n_missing = n_missing;
        self
    }

    /// Uncorrected log-determinant of the error transform.
    pub fn log_determinant(mut self, ldet: f64) -> Self {
        self.log_determinant = ldet;
        self
    }

    /// Sum of squared standardized errors.
    pub fn ssq(mut self, ssq: f64) -> Self {
        self.ssq = ssq;
        self
    }

    /// Standardized residual series (optional).
    pub fn residuals(mut self, residuals: Array1<f64>) -> Self {
        self.residuals = Some(residuals);
        self
    }

    /// Full coefficient vector: missing-value estimates first, then the
    /// real regression coefficients.
    pub fn coefficients(mut self, coefficients: Array1<f64>) -> Self {
        self.coefficients = Some(coefficients);
        self
    }

    /// Upper-triangular `R` factor of the design's QR decomposition.
    pub fn r_factor(mut self, r: Array2<f64>) -> Self {
        self.r_factor = Some(r);
        self
    }

    /// Precomputed unscaled covariance of the real regressors, for callers
    /// that already hold it.
    pub fn unscaled_covariance(mut self, covariance: Array2<f64>) -> Self {
        self.covariance = Some(covariance);
        self
    }

    /// Validate, apply the missing-value correction, and freeze.
    ///
    /// # Errors
    /// - [`LikelihoodError::InvalidSampleSize`] when `n == 0`.
    /// - [`LikelihoodError::MissingTriangularFactor`] when `n_missing > 0`
    ///   and no `R` factor was supplied.
    /// - [`LikelihoodError::DimensionMismatch`] / [`LikelihoodError::NotSquare`]
    ///   for inconsistent factor shapes.
    /// - Validation errors from [`LikelihoodValue::new`].
    pub fn build(self) -> LikResult<ConcentratedLikelihood> {
        if self.n == 0 {
            return Err(LikelihoodError::InvalidSampleSize { n: self.n });
        }
        let coefficients = self.coefficients.unwrap_or_else(|| Array1::zeros(0));
        if self.n_missing > coefficients.len() {
            return Err(LikelihoodError::DimensionMismatch {
                expected: self.n_missing,
                found: coefficients.len(),
            });
        }
        if let Some(r) = self.r_factor.as_ref() {
            let (rows, cols) = r.dim();
            if rows != cols {
                return Err(LikelihoodError::NotSquare { rows, cols });
            }
            if rows != coefficients.len() {
                return Err(LikelihoodError::DimensionMismatch {
                    expected: coefficients.len(),
                    found: rows,
                });
            }
        }

        let mut ldet = self.log_determinant;
        if self.n_missing > 0 {
            let r = self
                .r_factor
                .as_ref()
                .ok_or(LikelihoodError::MissingTriangularFactor { n_missing: self.n_missing })?;
            for i in 0..self.n_missing {
                ldet += 2.0 * r[(i, i)].abs().ln();
            }
        }
        let ll = LikelihoodValue::new(self.n, ldet, self.ssq)?;

        let covariance = OnceLock::new();
        if let Some(c) = self.covariance {
            let _ = covariance.set(c);
        }
        Ok(ConcentratedLikelihood {
            ll,
            n_missing: self.n_missing,
            residuals: self.residuals,
            coefficients,
            r_factor: self.r_factor,
            covariance,
        })
    }
}

/// Immutable GLS estimation outcome with significance statistics.
#[derive(Debug, Clone)]
pub struct ConcentratedLikelihood {
    ll: LikelihoodValue,
    n_missing: usize,
    residuals: Option<Array1<f64>>,
    coefficients: Array1<f64>,
    r_factor: Option<Array2<f64>>,
    covariance: OnceLock<Array2<f64>>,
}

impl ConcentratedLikelihood {
    /// Underlying likelihood record (corrected log-determinant included).
    pub fn likelihood(&self) -> &LikelihoodValue {
        &self.ll
    }

    /// Concentrated Gaussian log-likelihood.
    pub fn log_likelihood(&self) -> f64 {
        self.ll.log_likelihood()
    }

    /// Determinantal scale factor.
    pub fn factor(&self) -> f64 {
        self.ll.factor()
    }

    /// Sum of squared standardized errors.
    pub fn ssq(&self) -> f64 {
        self.ll.ssq()
    }

    /// Corrected log-determinant.
    pub fn log_determinant(&self) -> f64 {
        self.ll.log_determinant()
    }

    /// Effective sample size.
    pub fn n(&self) -> usize {
        self.ll.n()
    }

    /// Number of missing observations.
    pub fn n_missing(&self) -> usize {
        self.n_missing
    }

    /// Number of real regressors.
    pub fn nx(&self) -> usize {
        self.coefficients.len() - self.n_missing
    }

    /// Residual degrees of freedom `n − nx`.
    pub fn degrees_of_freedom(&self) -> usize {
        self.ll.n().saturating_sub(self.nx())
    }

    /// Coefficients of the real regressors (missing block excluded).
    pub fn coefficients(&self) -> ArrayView1<f64> {
        self.coefficients.slice(s![self.n_missing..])
    }

    /// Interpolation estimates of the missing observations (the leading
    /// `n_missing` coefficients).
    pub fn missing_estimates(&self) -> ArrayView1<f64> {
        self.coefficients.slice(s![..self.n_missing])
    }

    /// Standardized residual series, when the estimator retained it.
    pub fn residuals(&self) -> Option<ArrayView1<f64>> {
        self.residuals.as_ref().map(|r| r.view())
    }

    /// Unscaled covariance of the real regressors.
    ///
    /// Computed once as `R⁻¹·R⁻ᵀ`, restricted to the non-missing block, and
    /// memoized. When neither an `R` factor nor an explicit covariance was
    /// supplied the result is the empty 0×0 matrix. Concurrent first calls
    /// may recompute the same value redundantly; the memo is set exactly
    /// once and never observed partially written.
    ///
    /// # Errors
    /// - [`LikelihoodError::SingularTriangularFactor`] when `R` carries a
    ///   zero diagonal entry.
    pub fn unscaled_covariance(&self) -> LikResult<ArrayView2<f64>> {
        if let Some(cached) = self.covariance.get() {
            return Ok(cached.view());
        }
        let computed = self.compute_covariance()?;
        Ok(self.covariance.get_or_init(|| computed).view())
    }

    fn compute_covariance(&self) -> LikResult<Array2<f64>> {
        match self.r_factor.as_ref() {
            None => Ok(Array2::zeros((0, 0))),
            Some(r) => {
                let full = symmetric_inverse_product(r.view())?;
                if self.n_missing == 0 {
                    Ok(full)
                } else {
                    Ok(full.slice(s![self.n_missing.., self.n_missing..]).to_owned())
                }
            }
        }
    }

    /// Standardized statistic of the i-th real regressor.
    ///
    /// Degrees of freedom: `n − nx − nhp` when `unbiased`, else `n`.
    ///
    /// Edge behavior, preserved literally:
    /// - a diagonal covariance entry of exactly zero (or no covariance
    ///   information at all) yields `NaN` — no information;
    /// - a coefficient of exactly zero yields `0`, even when the variance
    ///   entry is informative.
    ///
    /// A zero degrees-of-freedom count also yields `NaN`.
    pub fn tstat(&self, i: usize, nhp: usize, unbiased: bool) -> LikResult<f64> {
        let cov = self.unscaled_covariance()?;
        let variance = if i < cov.nrows() { cov[(i, i)] } else { 0.0 };
        if variance == 0.0 {
            return Ok(f64::NAN);
        }
        let b = self.coefficients()[i];
        if b == 0.0 {
            return Ok(0.0);
        }
        let df = if unbiased {
            self.ll.n().saturating_sub(self.nx() + nhp)
        } else {
            self.ll.n()
        };
        if df == 0 {
            return Ok(f64::NAN);
        }
        Ok(b / (variance * self.ll.ssq() / df as f64).sqrt())
    }

    /// Standardized statistics of all real regressors.
    pub fn tstats(&self, nhp: usize, unbiased: bool) -> LikResult<Array1<f64>> {
        let nx = self.nx();
        let mut out = Array1::zeros(nx);
        for i in 0..nx {
            out[i] = self.tstat(i, nhp, unbiased)?;
        }
        Ok(out)
    }

    /// Produce a rescaled copy; the receiver is untouched.
    ///
    /// `ssq` is divided by `y_factor²` and residuals by `y_factor`. Without
    /// `x_factor` the coefficients are divided by `y_factor` only and the
    /// covariance/`R` factor are carried over unchanged. With `x_factor`
    /// (one entry per coefficient, missing block included) coefficient `i`
    /// is divided by `x_factor[i]·y_factor`, the memoized covariance is
    /// congruently divided by the outer product of the real-block factors,
    /// and the `R` columns are multiplied by the factors.
    ///
    /// # Errors
    /// - [`LikelihoodError::DimensionMismatch`] if `x_factor.len()` differs
    ///   from the full coefficient length.
    pub fn rescale(&self, y_factor: f64, x_factor: Option<&[f64]>) -> LikResult<Self> {
        if y_factor == 1.0 && x_factor.is_none() {
            return Ok(self.clone());
        }
        if let Some(xs) = x_factor {
            if xs.len() != self.coefficients.len() {
                return Err(LikelihoodError::DimensionMismatch {
                    expected: self.coefficients.len(),
                    found: xs.len(),
                });
            }
        }

        let ssq = self.ll.ssq() / (y_factor * y_factor);
        let residuals = self.residuals.as_ref().map(|r| r.mapv(|v| v / y_factor));
        let coefficients = match x_factor {
            None => self.coefficients.mapv(|b| b / y_factor),
            Some(xs) => Array1::from_iter(
                self.coefficients.iter().zip(xs.iter()).map(|(b, x)| b / (x * y_factor)),
            ),
        };
        let r_factor = match (self.r_factor.as_ref(), x_factor) {
            (Some(r), Some(xs)) => {
                let mut scaled = r.clone();
                for j in 0..scaled.ncols() {
                    for i in 0..scaled.nrows() {
                        scaled[(i, j)] *= xs[j];
                    }
                }
                Some(scaled)
            }
            (r, _) => r.cloned(),
        };
        let covariance = OnceLock::new();
        if let Some(cached) = self.covariance.get() {
            let rescaled = match x_factor {
                None => cached.clone(),
                Some(xs) => {
                    let real = &xs[self.n_missing..];
                    let mut c = cached.clone();
                    for i in 0..c.nrows() {
                        for j in 0..c.ncols() {
                            c[(i, j)] /= real[i] * real[j];
                        }
                    }
                    c
                }
            };
            let _ = covariance.set(rescaled);
        }

        Ok(Self {
            ll: LikelihoodValue::unchecked(self.ll.n(), self.ll.log_determinant(), ssq),
            n_missing: self.n_missing,
            residuals,
            coefficients,
            r_factor,
            covariance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn plain_builder() -> ConcentratedLikelihoodBuilder {
        ConcentratedLikelihoodBuilder::new()
            .sample_size(20)
            .log_determinant(0.5)
            .ssq(10.0)
            .coefficients(array![1.5, -2.0])
            .r_factor(array![[2.0, 1.0], [0.0, 4.0]])
    }

    #[test]
    // Purpose
    // -------
    // Verify that with no missing values the log-determinant is stored
    // exactly as supplied.
    //
    // Given
    // -----
    // - A builder with ldet = 0.5 and n_missing = 0.
    //
    // Expect
    // ------
    // - log_determinant() == 0.5 exactly.
    fn log_determinant_uncorrected_without_missing() {
        let cl = plain_builder().build().expect("valid builder");
        assert_eq!(cl.log_determinant(), 0.5);
        assert_eq!(cl.n_missing(), 0);
        assert_eq!(cl.nx(), 2);
    }

    #[test]
    // Purpose
    // -------
    // Verify the missing-value correction against a synthetic R factor.
    //
    // Given
    // -----
    // - n_missing = 2, ldet = 0.5, R diagonal entries 2 and 4 in the
    //   missing block.
    //
    // Expect
    // ------
    // - log_determinant() = 0.5 + 2·(ln 2 + ln 4).
    fn log_determinant_corrected_for_missing_block() {
        let cl = ConcentratedLikelihoodBuilder::new()
            .sample_size(20)
            .missing_count(2)
            .log_determinant(0.5)
            .ssq(10.0)
            .coefficients(array![0.3, 0.7, 1.5])
            .r_factor(array![[2.0, 1.0, 0.5], [0.0, 4.0, 0.2], [0.0, 0.0, 3.0]])
            .build()
            .expect("valid builder with R factor");
        let expected = 0.5 + 2.0 * (2.0_f64.ln() + 4.0_f64.ln());
        assert!((cl.log_determinant() - expected).abs() < 1e-12);
        assert_eq!(cl.nx(), 1);
        assert_eq!(cl.missing_estimates().len(), 2);
        assert_eq!(cl.coefficients().len(), 1);
    }

    #[test]
    // Purpose
    // -------
    // Confirm that declaring missing values without a triangular factor
    // fails fast at build time.
    //
    // Given
    // -----
    // - n_missing = 1 and no R factor.
    //
    // Expect
    // ------
    // - `MissingTriangularFactor { n_missing: 1 }`.
    fn build_fails_without_r_factor_when_missing_declared() {
        let err = ConcentratedLikelihoodBuilder::new()
            .sample_size(20)
            .missing_count(1)
            .ssq(10.0)
            .coefficients(array![0.3, 1.5])
            .build()
            .unwrap_err();
        assert!(matches!(err, LikelihoodError::MissingTriangularFactor { n_missing: 1 }));
    }

    #[test]
    // Purpose
    // -------
    // Verify that the memoized covariance equals R⁻¹·R⁻ᵀ and that absent
    // factor information yields the empty matrix.
    //
    // Given
    // -----
    // - R = diag(2, 4), and a second likelihood with neither R nor an
    //   explicit covariance.
    //
    // Expect
    // ------
    // - diag(1/4, 1/16) for the former; a 0×0 matrix for the latter.
    fn unscaled_covariance_from_factor_and_empty_fallback() {
        let cl = ConcentratedLikelihoodBuilder::new()
            .sample_size(20)
            .ssq(10.0)
            .coefficients(array![1.5, -2.0])
            .r_factor(array![[2.0, 0.0], [0.0, 4.0]])
            .build()
            .expect("valid builder");
        let cov = cl.unscaled_covariance().expect("invertible factor");
        assert!((cov[(0, 0)] - 0.25).abs() < 1e-12);
        assert!((cov[(1, 1)] - 0.0625).abs() < 1e-12);
        // repeated access returns the memoized value
        let again = cl.unscaled_covariance().expect("memoized");
        assert_eq!(again[(0, 0)], cov[(0, 0)]);

        let bare = ConcentratedLikelihoodBuilder::new()
            .sample_size(20)
            .ssq(10.0)
            .build()
            .expect("bare builder");
        assert_eq!(bare.unscaled_covariance().expect("empty fallback").dim(), (0, 0));
    }

    #[test]
    // Purpose
    // -------
    // Preserve the literal t-statistic edge behavior: NaN for a zero
    // variance entry, exact 0 for a zero coefficient.
    //
    // Given
    // -----
    // - An explicit covariance diag(0, 1) with coefficients [1, 0, 3].
    //   (first entry has no information, second is estimated as zero).
    //
    // Expect
    // ------
    // - tstat(0) is NaN, tstat(1) is exactly 0, tstat(2) is finite nonzero.
    fn tstat_preserves_nan_and_zero_edge_cases() {
        let cl = ConcentratedLikelihoodBuilder::new()
            .sample_size(30)
            .ssq(27.0)
            .coefficients(array![1.0, 0.0, 3.0])
            .unscaled_covariance(array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
            .build()
            .expect("valid builder");
        assert!(cl.tstat(0, 0, true).expect("covariance present").is_nan());
        assert_eq!(cl.tstat(1, 0, true).expect("covariance present"), 0.0);
        // df = 30 − 3 = 27, stderr = sqrt(1·27/27) = 1, t = 3.
        assert!((cl.tstat(2, 0, true).expect("covariance present") - 3.0).abs() < 1e-12);
        // biased variant uses df = n = 30.
        let biased = cl.tstat(2, 0, false).expect("covariance present");
        assert!((biased - 3.0 / (27.0 / 30.0_f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify that identity rescaling is a no-op on ssq, residuals, and
    // coefficients.
    //
    // Given
    // -----
    // - rescale(1, None) on a likelihood with residuals.
    //
    // Expect
    // ------
    // - All stored values numerically unchanged.
    fn rescale_identity_is_noop() {
        let cl = plain_builder().residuals(array![0.1, -0.2, 0.3]).build().expect("valid builder");
        let same = cl.rescale(1.0, None).expect("identity rescale");
        assert_eq!(same.ssq(), cl.ssq());
        assert_eq!(same.coefficients()[0], cl.coefficients()[0]);
        assert_eq!(
            same.residuals().expect("kept")[1],
            cl.residuals().expect("kept")[1]
        );
    }

    #[test]
    // Purpose
    // -------
    // Check y-only and (y, x) rescaling arithmetic, including the
    // congruent covariance rescale.
    //
    // Given
    // -----
    // - y_factor = 2; then additionally x_factor = [4, 5].
    //
    // Expect
    // ------
    // - ssq/4, residuals/2, coefficients/2 for y-only.
    // - coefficients[i]/(x[i]·2) and covariance[i][j]/(x[i]·x[j]) with x.
    fn rescale_applies_y_and_x_factors() {
        let cl = plain_builder().residuals(array![0.4]).build().expect("valid builder");
        let cov0 = cl.unscaled_covariance().expect("factor present").to_owned();

        let y_only = cl.rescale(2.0, None).expect("y-only rescale");
        assert!((y_only.ssq() - 2.5).abs() < 1e-12);
        assert!((y_only.residuals().expect("kept")[0] - 0.2).abs() < 1e-12);
        assert!((y_only.coefficients()[0] - 0.75).abs() < 1e-12);

        let xs = [4.0, 5.0];
        let both = cl.rescale(2.0, Some(&xs)).expect("full rescale");
        assert!((both.coefficients()[0] - 1.5 / 8.0).abs() < 1e-12);
        assert!((both.coefficients()[1] - (-2.0) / 10.0).abs() < 1e-12);
        let cov1 = both.unscaled_covariance().expect("rescaled covariance");
        assert!((cov1[(0, 0)] - cov0[(0, 0)] / 16.0).abs() < 1e-12);
        assert!((cov1[(1, 1)] - cov0[(1, 1)] / 25.0).abs() < 1e-12);
        assert!((cov1[(0, 1)] - cov0[(0, 1)] / 20.0).abs() < 1e-12);
    }
}
