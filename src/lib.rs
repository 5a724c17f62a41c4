//! regarima_outliers — outlier detection for regression models with ARMA
//! errors.
//!
//! Purpose
//! -------
//! Serve as the crate root for the numerical building blocks of automatic
//! outlier handling in seasonal-adjustment pipelines: concentrated
//! Gaussian likelihood evaluation (missing values included), incremental
//! residual accumulation for innovation-based filters, and the stepwise
//! significance-driven outlier search.
//!
//! Key behaviors
//! -------------
//! - Re-export the core modules (`likelihood`, `outliers`, `linalg`) as the
//!   public crate surface.
//! - Keep the heavy estimation machinery (ARMA parameter optimization,
//!   Kalman-style filtering) behind the trait seam in
//!   [`outliers::traits`]; this crate consumes estimations, it does not
//!   produce them.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical failure modes surface as typed errors
//!   ([`likelihood::LikelihoodError`], [`outliers::OutlierError`]); panics
//!   are reserved for caller bugs documented per function.
//! - The detection loop is single-threaded; the only shared state is the
//!   memoized covariance inside [`likelihood::ConcentratedLikelihood`],
//!   which is safe under concurrent readers.
//!
//! Conventions
//! -----------
//! - Vectors and matrices are `ndarray` types throughout; `nalgebra` is
//!   used internally for triangular solves.
//! - Observability goes through the `log` facade (`debug` for the search
//!   trace, `warn` at the failure boundary).
//!
//! Downstream usage
//! ----------------
//! - Estimation engines implement [`outliers::RegressionModel`],
//!   [`outliers::OutlierEstimator`], and [`outliers::CandidateScanner`] and
//!   hand the loop an initial model; results come back as the final model,
//!   its [`likelihood::ConcentratedLikelihood`], and the accepted outliers.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules; the
//!   `tests/` suite drives the whole pipeline through an OLS estimation
//!   harness with planted outliers.

pub mod likelihood;
pub mod linalg;
pub mod outliers;
