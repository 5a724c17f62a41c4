//! likelihood — concentrated-likelihood value objects and accumulation.
//!
//! Purpose
//! -------
//! Provide the numerically careful likelihood layer the outlier-detection
//! loop is built on: an immutable likelihood record, an incremental
//! residual/log-determinant accumulator fed by an external filtering
//! process, and the concentrated likelihood of a GLS regression with its
//! missing-value log-determinant correction and significance statistics.
//!
//! Key behaviors
//! -------------
//! - [`LikelihoodValue`]: leaf record {n, log-determinant, ssq} with the
//!   derived concentrated log-likelihood and determinantal factor.
//! - [`ResidualAccumulator`]: folds scalar or correlated-block innovation
//!   contributions, skipping degenerate observations and keeping the
//!   determinant as a range-safe mantissa/exponent product.
//! - [`ConcentratedLikelihood`]: builder-constructed, immutable GLS outcome
//!   with lazily memoized unscaled covariance, t-statistics, and pure
//!   rescaling.
//!
//! Conventions
//! -----------
//! - All vectors and matrices are `ndarray` types; triangular kernels live
//!   in [`crate::linalg`].
//! - Fallible operations return [`LikResult`]; numerical breakdown
//!   (ill-conditioned blocks, singular factors) is reported as
//!   [`LikelihoodError`] values, never panics.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the correction arithmetic, the t-statistic edge
//!   behavior, rescaling, and accumulator range safety; the integration
//!   suite exercises the layer through a full OLS estimation harness.

pub mod accumulator;
pub mod concentrated;
pub mod errors;
pub mod value;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::accumulator::{DeterminantAccumulator, ResidualAccumulator};
pub use self::concentrated::{ConcentratedLikelihood, ConcentratedLikelihoodBuilder};
pub use self::errors::{LikResult, LikelihoodError};
pub use self::value::LikelihoodValue;
