//! Iterative forward/backward outlier selection.
//!
//! Purpose
//! -------
//! Given an initial regression model with ARMA errors, find and retain only
//! statistically significant outlier regressors, or report failure. One
//! round adds the best-scanning candidate, re-optimizes, and then verifies
//! the accepted set backwards, dropping the weakest regressor while it
//! falls below the acceptance threshold.
//!
//! Key behaviors
//! -------------
//! - Bounded search: at most [`MAX_ROUNDS`] rounds and [`MAX_OUTLIERS`]
//!   accepted outliers, the sole termination guarantee for pathological
//!   inputs.
//! - Oscillation guard: removing the same candidate in two consecutive
//!   backward steps ends the search instead of cycling between two
//!   mutually dependent candidates.
//! - Exclusion bookkeeping: every accepted pair is barred from future
//!   scans; a removed pair is re-admitted so it may re-enter later.
//! - Final verification: after the main loop one more backward sweep runs
//!   with full re-estimation (not the cheaper in-loop recompute) and
//!   without the oscillation short-circuit, so the returned model carries
//!   no sub-threshold outlier.
//! - Failure boundary: any numerical failure inside the loop is caught
//!   exactly once in [`OutlierDetection::process`] and converted into a
//!   `false` return; no partial outlier set is meaningful on failure.
//!
//! Concurrency
//! -----------
//! Single-threaded and non-reentrant: all search state (accepted list,
//! cached t-statistics, round counter) is exclusively owned for the
//! duration of one `process()` call.

use crate::outliers::{
    critical_value::{
        AsymptoticResolver, CriticalValueResolver, CriticalValueState, check_bounds,
    },
    errors::{OutlierError, OutlierResult},
    factories::{OutlierFactory, default_factories},
    traits::{CandidateScanner, OutlierEstimator, RegressionModel},
};

/// Hard cap on the number of forward rounds.
pub const MAX_ROUNDS: usize = 100;

/// Hard cap on the number of accepted outliers.
pub const MAX_OUTLIERS: usize = 50;

/// One accepted or candidate outlier: a regressor shape anchored at a time
/// index. `type_index` refers to the configured factory list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutlierCandidate {
    pub position: usize,
    pub type_index: usize,
}

/// Synchronous observer invoked on each acceptance or removal.
pub type OutlierHook = Box<dyn FnMut(&OutlierCandidate)>;

/// Stepwise outlier-detection driver over a model `M`, an estimator `E`,
/// and a candidate scanner `S`.
pub struct OutlierDetection<M, E, S>
where
    M: RegressionModel,
    E: OutlierEstimator<M>,
    S: CandidateScanner<M>,
{
    estimator: E,
    scanner: S,
    factories: Vec<OutlierFactory>,
    bounds: Option<(usize, usize)>,
    base_override: Option<f64>,
    selectivity: i32,
    nhp: usize,
    resolver: Box<dyn CriticalValueResolver>,
    cv: Option<CriticalValueState>,
    on_addition: Option<OutlierHook>,
    on_removal: Option<OutlierHook>,

    // ---- Search state, exclusively owned by one process() call ----
    model: Option<M>,
    likelihood: Option<crate::likelihood::concentrated::ConcentratedLikelihood>,
    outliers: Vec<OutlierCandidate>,
    tstats: Vec<f64>,
    fixed_regressors: usize,
    round: usize,
    last_removed: Option<OutlierCandidate>,
    exit: bool,
}

impl<M, E, S> OutlierDetection<M, E, S>
where
    M: RegressionModel,
    E: OutlierEstimator<M>,
    S: CandidateScanner<M>,
{
    /// Build a driver with the default factory set, full-sample bounds, the
    /// asymptotic critical-value resolver, and selectivity 0.
    pub fn new(estimator: E, scanner: S) -> Self {
        Self {
            estimator,
            scanner,
            factories: default_factories(),
            bounds: None,
            base_override: None,
            selectivity: 0,
            nhp: 0,
            resolver: Box::new(AsymptoticResolver),
            cv: None,
            on_addition: None,
            on_removal: None,
            model: None,
            likelihood: None,
            outliers: Vec::new(),
            tstats: Vec::new(),
            fixed_regressors: 0,
            round: 0,
            last_removed: None,
            exit: false,
        }
    }

    /// Configure the search: outlier shapes, scan bounds (half-open, over
    /// anchor positions), an optional explicit critical value, and the
    /// selectivity level. Resets any previously resolved threshold.
    pub fn configure(
        &mut self, factories: Vec<OutlierFactory>, bounds: (usize, usize),
        critical_value: Option<f64>, selectivity: i32,
    ) {
        self.factories = factories;
        self.bounds = Some(bounds);
        self.base_override = critical_value;
        self.selectivity = selectivity;
        self.cv = None;
    }

    /// Number of free ARMA hyper-parameters, used in the degrees of freedom
    /// of the cached t-statistics.
    pub fn set_hyper_parameter_count(&mut self, nhp: usize) {
        self.nhp = nhp;
    }

    /// Replace the default base-value resolver.
    pub fn set_critical_value_resolver(&mut self, resolver: Box<dyn CriticalValueResolver>) {
        self.resolver = resolver;
    }

    /// Observer fired synchronously on each acceptance; side channel only.
    pub fn on_addition(&mut self, hook: OutlierHook) {
        self.on_addition = Some(hook);
    }

    /// Observer fired synchronously on each removal; side channel only.
    pub fn on_removal(&mut self, hook: OutlierHook) {
        self.on_removal = Some(hook);
    }

    /// Run the detection on `initial`. Returns `true` on success; the final
    /// model, likelihood, and accepted outliers are retrievable afterwards.
    /// Any numerical failure inside the loop is converted into `false`.
    pub fn process(&mut self, initial: M) -> bool {
        match self.run(initial) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("outlier detection aborted: {err}");
                false
            }
        }
    }

    /// Lower the acceptance threshold by one geometric step.
    ///
    /// Returns `false` once the schedule has bottomed out at the minimum
    /// critical value.
    pub fn reduce_selectivity(&mut self) -> bool {
        match self.cv.as_mut() {
            Some(state) => {
                let reduced = state.reduce();
                if reduced {
                    self.selectivity = state.selectivity();
                }
                reduced
            }
            None => {
                self.selectivity -= 1;
                true
            }
        }
    }

    /// Final model value, once `process()` succeeded.
    pub fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }

    /// Final concentrated likelihood, once `process()` succeeded.
    pub fn likelihood(&self) -> Option<&crate::likelihood::concentrated::ConcentratedLikelihood> {
        self.likelihood.as_ref()
    }

    /// Accepted outliers, in acceptance order.
    pub fn outliers(&self) -> &[OutlierCandidate] {
        &self.outliers
    }

    /// Cached t-statistics of the accepted outlier regressors, aligned with
    /// [`OutlierDetection::outliers`].
    pub fn outlier_tstats(&self) -> &[f64] {
        &self.tstats
    }

    /// Currently resolved acceptance threshold, if any.
    pub fn critical_value(&self) -> Option<f64> {
        self.cv.map(|state| state.current())
    }

    /// Rounds consumed by the last `process()` call.
    pub fn rounds(&self) -> usize {
        self.round
    }

    // ---- Algorithm ---------------------------------------------------------

    fn run(&mut self, initial: M) -> OutlierResult<()> {
        self.reset_state();
        if self.factories.is_empty() {
            return Err(OutlierError::NoFactoriesConfigured);
        }
        let n = initial.observation_count();
        let (start, end) = self.bounds.unwrap_or((0, n));
        check_bounds(start, end)?;
        self.fixed_regressors = initial.regressor_count();

        self.scanner.prepare(n);
        self.scanner.set_bounds(start, end);
        self.scanner.set_factories(&self.factories);

        let estimated = self.estimator.full_estimate(&initial)?;
        self.model = Some(estimated.model);
        self.likelihood = Some(estimated.likelihood);

        if self.cv.is_none() {
            let base = self.base_override.unwrap_or_else(|| self.resolver.base_value(n));
            self.cv = Some(CriticalValueState::new(base, self.selectivity));
        }
        let curcv = self.cv.map(|state| state.current()).unwrap_or(f64::INFINITY);

        self.iterate(curcv)?;
        self.final_verification(curcv)
    }

    fn iterate(&mut self, curcv: f64) -> OutlierResult<()> {
        while self.round < MAX_ROUNDS && self.outliers.len() < MAX_OUTLIERS && !self.exit {
            self.round += 1;
            let found = {
                let model = self.model.as_ref().expect("model estimated before iteration");
                self.scanner.scan(model)
            };
            if !found {
                break;
            }
            let statistic = self.scanner.max_statistic();
            if statistic.abs() < curcv {
                // converged: nothing left above threshold
                break;
            }
            let candidate = OutlierCandidate {
                position: self.scanner.max_position(),
                type_index: self.scanner.max_type(),
            };
            log::debug!(
                "round {}: candidate {}@{} with |t|={:.3} against cv={:.3}",
                self.round,
                self.factory(candidate.type_index)?.code(),
                candidate.position,
                statistic.abs(),
                curcv
            );
            self.add_outlier(candidate)?;
            self.verify_backward(curcv)?;
        }
        Ok(())
    }

    /// Backward verification: while the weakest accepted outlier falls
    /// below the threshold, drop it, recompute the likelihood directly
    /// (one column removed; no re-optimization), and check again. Sets the
    /// exit flag when the same candidate is removed twice in a row.
    fn verify_backward(&mut self, curcv: f64) -> OutlierResult<()> {
        loop {
            let Some((weakest, statistic)) = self.weakest_outlier() else {
                return Ok(());
            };
            if statistic >= curcv {
                return Ok(());
            }
            let removed = self.drop_outlier(weakest)?;
            let reduced = self.model.take().expect("model present during backward pass");
            let likelihood = self.estimator.concentrated_likelihood(&reduced)?;
            self.model = Some(reduced);
            self.likelihood = Some(likelihood);
            self.refresh_tstats()?;
            if self.last_removed == Some(removed) {
                log::debug!(
                    "oscillation: {}@{} removed twice in a row, ending search",
                    self.factory(removed.type_index)?.code(),
                    removed.position
                );
                self.exit = true;
                return Ok(());
            }
            self.last_removed = Some(removed);
        }
    }

    /// Final sweep over the accepted set with full re-estimation and no
    /// oscillation short-circuit: guarantees the returned model has no
    /// remaining sub-threshold outlier.
    fn final_verification(&mut self, curcv: f64) -> OutlierResult<()> {
        loop {
            let Some((weakest, statistic)) = self.weakest_outlier() else {
                return Ok(());
            };
            if statistic >= curcv {
                return Ok(());
            }
            self.drop_outlier(weakest)?;
            let reduced = self.model.take().expect("model present during final sweep");
            let estimated = self.estimator.full_estimate(&reduced)?;
            self.model = Some(estimated.model);
            self.likelihood = Some(estimated.likelihood);
            self.refresh_tstats()?;
        }
    }

    /// Materialize the winning candidate's column, extend the model, bar
    /// the pair from future scans, warm-re-optimize, and refresh the cached
    /// t-statistics.
    fn add_outlier(&mut self, candidate: OutlierCandidate) -> OutlierResult<()> {
        let model = self.model.take().expect("model estimated before addition");
        let column = self
            .factory(candidate.type_index)?
            .column(model.observation_count(), candidate.position);
        let extended = model.with_added_column(column);
        self.scanner.exclude(candidate.position, candidate.type_index);
        let estimated = self.estimator.warm_optimize(&extended)?;
        self.model = Some(estimated.model);
        self.likelihood = Some(estimated.likelihood);
        self.outliers.push(candidate);
        self.refresh_tstats()?;
        if let Some(hook) = self.on_addition.as_mut() {
            hook(&candidate);
        }
        Ok(())
    }

    /// Remove the accepted outlier at list index `index` from the model and
    /// the search state, re-admitting its pair for future scans. The caller
    /// re-estimates afterwards.
    fn drop_outlier(&mut self, index: usize) -> OutlierResult<OutlierCandidate> {
        let candidate = self.outliers.remove(index);
        let model = self.model.take().expect("model present during removal");
        let reduced = model.with_removed_column(self.fixed_regressors + index);
        self.model = Some(reduced);
        self.scanner.allow(candidate.position, candidate.type_index);
        log::debug!(
            "dropping {}@{}: below threshold",
            self.factory(candidate.type_index)?.code(),
            candidate.position
        );
        if let Some(hook) = self.on_removal.as_mut() {
            hook(&candidate);
        }
        Ok(candidate)
    }

    /// Recompute the cached t-statistics of the accepted outlier
    /// regressors from the current likelihood.
    fn refresh_tstats(&mut self) -> OutlierResult<()> {
        let likelihood = self.likelihood.as_ref().expect("likelihood present after estimation");
        self.tstats.clear();
        for index in 0..self.outliers.len() {
            let coefficient = self.fixed_regressors + index;
            self.tstats.push(likelihood.tstat(coefficient, self.nhp, true)?);
        }
        Ok(())
    }

    /// Index and |t| of the weakest accepted outlier; a NaN statistic (no
    /// information) counts as zero so the regressor is dropped rather than
    /// pinned.
    fn weakest_outlier(&self) -> Option<(usize, f64)> {
        let mut weakest: Option<(usize, f64)> = None;
        for (index, t) in self.tstats.iter().enumerate() {
            let magnitude = if t.is_nan() { 0.0 } else { t.abs() };
            match weakest {
                Some((_, current)) if magnitude >= current => {}
                _ => weakest = Some((index, magnitude)),
            }
        }
        weakest
    }

    fn factory(&self, type_index: usize) -> OutlierResult<&OutlierFactory> {
        self.factories.get(type_index).ok_or(OutlierError::UnknownOutlierType {
            type_index,
            registered: self.factories.len(),
        })
    }

    fn reset_state(&mut self) {
        self.model = None;
        self.likelihood = None;
        self.outliers.clear();
        self.tstats.clear();
        self.fixed_regressors = 0;
        self.round = 0;
        self.last_removed = None;
        self.exit = false;
    }
}
