//! Consumed capabilities of the detection loop.
//!
//! The loop orchestrates three external collaborators, expressed as traits:
//! the regression model value it extends and shrinks, the re-estimator that
//! refits the model after structural changes, and the candidate scanner
//! that evaluates admissible (position, type) pairs. Full ARMA parameter
//! optimization and the broader identification pipeline live behind these
//! seams and are out of scope here.

use crate::{
    likelihood::concentrated::ConcentratedLikelihood,
    outliers::{errors::OutlierResult, factories::OutlierFactory},
};
use ndarray::Array1;

/// Immutable regression-model value with rebuild operations.
///
/// The detection loop never mutates a model in place; adding or removing a
/// regressor column produces a new value.
pub trait RegressionModel: Clone {
    /// Number of observations in the series.
    fn observation_count(&self) -> usize;

    /// Number of regressor columns currently in the design (mean included
    /// when present).
    fn regressor_count(&self) -> usize;

    /// Whether the design carries a mean/constant term.
    fn has_mean(&self) -> bool;

    /// Rebuild with `column` appended as the last regressor.
    fn with_added_column(&self, column: Array1<f64>) -> Self;

    /// Rebuild with the regressor at `index` removed.
    fn with_removed_column(&self, index: usize) -> Self;
}

/// Result of one estimation pass: the (possibly re-parameterized) model and
/// its concentrated likelihood.
#[derive(Debug, Clone)]
pub struct Estimation<M> {
    pub model: M,
    pub likelihood: ConcentratedLikelihood,
}

/// Re-estimation capability consumed by the detection loop.
///
/// The loop distinguishes three cost tiers:
/// - [`OutlierEstimator::full_estimate`] — a full estimation from scratch,
///   used for the initial model and the final verification sweep;
/// - [`OutlierEstimator::warm_optimize`] — a warm-started re-optimization
///   after one column was appended;
/// - [`OutlierEstimator::concentrated_likelihood`] — a direct likelihood
///   evaluation at the current parameters, cheap enough for the backward
///   passes where only one column was dropped.
pub trait OutlierEstimator<M: RegressionModel> {
    fn full_estimate(&mut self, model: &M) -> OutlierResult<Estimation<M>>;

    fn warm_optimize(&mut self, model: &M) -> OutlierResult<Estimation<M>>;

    fn concentrated_likelihood(&mut self, model: &M) -> OutlierResult<ConcentratedLikelihood>;
}

/// Candidate scanner over admissible (position, type) pairs.
///
/// Type indices refer to the factory list the loop registers through
/// [`CandidateScanner::set_factories`]; excluded pairs must never be
/// reported by a subsequent [`CandidateScanner::scan`].
pub trait CandidateScanner<M: RegressionModel> {
    /// Size the scanner for a series of `n` observations.
    fn prepare(&mut self, n: usize);

    /// Restrict scanning to anchor positions in `[start, end)`.
    fn set_bounds(&mut self, start: usize, end: usize);

    /// Register the outlier shapes; type indices follow list order.
    fn set_factories(&mut self, factories: &[OutlierFactory]);

    /// Bar a (position, type) pair from future scans.
    fn exclude(&mut self, position: usize, type_index: usize);

    /// Re-admit a previously excluded pair.
    fn allow(&mut self, position: usize, type_index: usize);

    /// Evaluate all admissible pairs against `model`; `false` when nothing
    /// was scannable.
    fn scan(&mut self, model: &M) -> bool;

    /// Extreme standardized statistic of the last scan (signed).
    fn max_statistic(&self) -> f64;

    /// Anchor position of the extreme statistic.
    fn max_position(&self) -> usize;

    /// Type index of the extreme statistic.
    fn max_type(&self) -> usize;
}
