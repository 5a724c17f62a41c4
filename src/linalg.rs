//! Triangular-factor kernels required by the likelihood core.
//!
//! This is deliberately not a general linear-algebra library: it implements
//! only the three contracts the concentrated-likelihood machinery relies on —
//! a tolerance-aware lower Cholesky factorization, forward substitution
//! against that factor, and the symmetric product `R⁻¹·R⁻ᵀ` of an
//! upper-triangular inverse. The dense triangular inverse is bridged through
//! `nalgebra`, with `ndarray` used for all public signatures.
//!
//! ## Failure modes
//! - A pivot at or below [`CHOLESKY_TOL`] marks the covariance block as
//!   ill-conditioned and surfaces as [`LikelihoodError::CholeskyFailure`].
//! - A zero diagonal entry in an upper-triangular factor surfaces as
//!   [`LikelihoodError::SingularTriangularFactor`].

use crate::likelihood::errors::{LikResult, LikelihoodError};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Pivot tolerance used when factorizing innovation covariance blocks.
pub const CHOLESKY_TOL: f64 = 1e-9;

/// Factorize a symmetric positive-definite matrix into its lower Cholesky
/// factor `L` with `V = L·Lᵀ`.
///
/// Only the lower triangle of `cov` is read. A pivot `d ≤ tol` aborts the
/// factorization: the block is treated as ill-conditioned rather than
/// silently deflated, and the error is expected to propagate up to the
/// detection-loop boundary.
///
/// # Inputs
/// - `cov`: symmetric matrix, lower triangle authoritative.
/// - `tol`: strictly positive pivot tolerance (callers pass [`CHOLESKY_TOL`]).
///
/// # Errors
/// - [`LikelihoodError::NotSquare`] for non-square input.
/// - [`LikelihoodError::CholeskyFailure`] when a pivot falls at or below `tol`.
pub fn cholesky_lower(cov: ArrayView2<f64>, tol: f64) -> LikResult<Array2<f64>> {
    let (rows, cols) = cov.dim();
    if rows != cols {
        return Err(LikelihoodError::NotSquare { rows, cols });
    }
    let n = rows;
    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut d = cov[(j, j)];
        for k in 0..j {
            d -= l[(j, k)] * l[(j, k)];
        }
        if d <= tol {
            return Err(LikelihoodError::CholeskyFailure { index: j, pivot: d });
        }
        let pivot = d.sqrt();
        l[(j, j)] = pivot;
        for i in (j + 1)..n {
            let mut s = cov[(i, j)];
            for k in 0..j {
                s -= l[(i, k)] * l[(j, k)];
            }
            l[(i, j)] = s / pivot;
        }
    }
    Ok(l)
}

/// Solve `L·z = b` by forward substitution, where `L` is lower triangular
/// with strictly positive diagonal (as produced by [`cholesky_lower`]).
///
/// # Errors
/// - [`LikelihoodError::DimensionMismatch`] if `b.len() != L.nrows()`.
pub fn solve_lower(l: ArrayView2<f64>, b: ArrayView1<f64>) -> LikResult<Array1<f64>> {
    let n = l.nrows();
    if b.len() != n {
        return Err(LikelihoodError::DimensionMismatch { expected: n, found: b.len() });
    }
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut s = b[i];
        for k in 0..i {
            s -= l[(i, k)] * z[k];
        }
        z[i] = s / l[(i, i)];
    }
    Ok(z)
}

/// Compute the symmetric product `R⁻¹·R⁻ᵀ` for an upper-triangular `R`.
///
/// This is the unscaled regression covariance implied by the `R` factor of a
/// QR decomposition: `(RᵀR)⁻¹ = R⁻¹·R⁻ᵀ`. The inverse is obtained through a
/// `nalgebra` triangular solve against the identity, mirroring the
/// ndarray↔nalgebra bridge used elsewhere for dense decompositions.
///
/// An empty (0×0) input yields an empty output.
///
/// # Errors
/// - [`LikelihoodError::NotSquare`] for non-square input.
/// - [`LikelihoodError::SingularTriangularFactor`] when `R` has a zero
///   diagonal entry.
pub fn symmetric_inverse_product(r: ArrayView2<f64>) -> LikResult<Array2<f64>> {
    let (rows, cols) = r.dim();
    if rows != cols {
        return Err(LikelihoodError::NotSquare { rows, cols });
    }
    let k = rows;
    if k == 0 {
        return Ok(Array2::<f64>::zeros((0, 0)));
    }
    let r_nalg = fill_dmatrix(r);
    let inverse = r_nalg
        .solve_upper_triangular(&DMatrix::<f64>::identity(k, k))
        .ok_or(LikelihoodError::SingularTriangularFactor { order: k })?;
    let product = &inverse * inverse.transpose();
    let mut out = Array2::<f64>::zeros((k, k));
    for i in 0..k {
        for j in 0..k {
            out[(i, j)] = product[(i, j)];
        }
    }
    Ok(out)
}

/// Copy an `ndarray` matrix into a freshly allocated `nalgebra::DMatrix`.
fn fill_dmatrix(m: ArrayView2<f64>) -> DMatrix<f64> {
    let (rows, cols) = m.dim();
    let mut out = DMatrix::<f64>::zeros(rows, cols);
    for i in 0..rows {
        for j in 0..cols {
            out[(i, j)] = m[(i, j)];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Verify that `cholesky_lower` reproduces the textbook factor of a small
    // SPD matrix and that `L·Lᵀ` reconstructs the input.
    //
    // Given
    // -----
    // - The 2×2 SPD matrix [[4, 2], [2, 3]].
    //
    // Expect
    // ------
    // - L = [[2, 0], [1, sqrt(2)]] up to 1e-12.
    fn cholesky_lower_matches_analytic_factor() {
        let v = array![[4.0, 2.0], [2.0, 3.0]];
        let l = cholesky_lower(v.view(), CHOLESKY_TOL).expect("SPD matrix should factorize");
        assert!((l[(0, 0)] - 2.0).abs() < 1e-12);
        assert!((l[(1, 0)] - 1.0).abs() < 1e-12);
        assert!((l[(1, 1)] - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(l[(0, 1)], 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Confirm that a rank-deficient block is rejected with the pivot index.
    //
    // Given
    // -----
    // - A singular matrix whose second pivot collapses to zero.
    //
    // Expect
    // ------
    // - `CholeskyFailure` at index 1.
    fn cholesky_lower_rejects_rank_deficient_block() {
        let v = array![[1.0, 1.0], [1.0, 1.0]];
        let err = cholesky_lower(v.view(), CHOLESKY_TOL).unwrap_err();
        match err {
            LikelihoodError::CholeskyFailure { index, .. } => assert_eq!(index, 1),
            other => panic!("expected CholeskyFailure, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Check forward substitution against a hand-solved system.
    //
    // Given
    // -----
    // - L = [[2, 0], [1, 1]] and b = [4, 5].
    //
    // Expect
    // ------
    // - z = [2, 3].
    fn solve_lower_matches_hand_solution() {
        let l = array![[2.0, 0.0], [1.0, 1.0]];
        let b = array![4.0, 5.0];
        let z = solve_lower(l.view(), b.view()).expect("conformable system");
        assert!((z[0] - 2.0).abs() < 1e-12);
        assert!((z[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify that `symmetric_inverse_product` equals `(RᵀR)⁻¹` on a
    // diagonal factor, where the inverse is analytic.
    //
    // Given
    // -----
    // - R = diag(2, 4).
    //
    // Expect
    // ------
    // - Output diag(1/4, 1/16), off-diagonals zero.
    fn symmetric_inverse_product_diagonal_factor() {
        let r = array![[2.0, 0.0], [0.0, 4.0]];
        let c = symmetric_inverse_product(r.view()).expect("invertible factor");
        assert!((c[(0, 0)] - 0.25).abs() < 1e-12);
        assert!((c[(1, 1)] - 0.0625).abs() < 1e-12);
        assert!(c[(0, 1)].abs() < 1e-12);
        assert!(c[(1, 0)].abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Confirm the empty-factor convention and the singular-factor error.
    //
    // Given
    // -----
    // - A 0×0 factor, and a factor with a zero diagonal entry.
    //
    // Expect
    // ------
    // - Empty output for the former; `SingularTriangularFactor` for the latter.
    fn symmetric_inverse_product_edge_cases() {
        let empty = Array2::<f64>::zeros((0, 0));
        let c = symmetric_inverse_product(empty.view()).expect("empty factor is allowed");
        assert_eq!(c.dim(), (0, 0));

        let singular = array![[1.0, 1.0], [0.0, 0.0]];
        let err = symmetric_inverse_product(singular.view()).unwrap_err();
        assert!(matches!(err, LikelihoodError::SingularTriangularFactor { order: 2 }));
    }
}
