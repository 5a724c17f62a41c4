//! Critical-value scheduling for outlier acceptance.
//!
//! A candidate outlier is accepted when its standardized statistic exceeds
//! the current threshold. The threshold starts from a base value — either an
//! explicit override or an asymptotic, slowly growing function of the sample
//! size — and shrinks geometrically per unit of negative selectivity,
//! floored at [`MIN_CRITICAL_VALUE`].

use crate::outliers::errors::{OutlierError, OutlierResult};

/// Hard floor for the acceptance threshold, in standardized-statistic units.
pub const MIN_CRITICAL_VALUE: f64 = 2.0;

/// Geometric shrinkage per unit of negative selectivity.
pub const REDUCTION_FACTOR: f64 = 0.12;

/// Supplies the base threshold as a function of the effective sample size.
pub trait CriticalValueResolver {
    fn base_value(&self, sample_size: usize) -> f64;
}

/// Default ln(n)-based resolver.
///
/// The threshold grows slowly with the sample size, matching the asymptotic
/// schedules used by automatic model-identification pipelines (≈ 3.3 at
/// n = 120, ≈ 3.9 at n = 400). Floored at [`MIN_CRITICAL_VALUE`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AsymptoticResolver;

impl CriticalValueResolver for AsymptoticResolver {
    fn base_value(&self, sample_size: usize) -> f64 {
        if sample_size == 0 {
            return MIN_CRITICAL_VALUE;
        }
        (0.7748 + 0.52425 * (sample_size as f64).ln()).max(MIN_CRITICAL_VALUE)
    }
}

/// Resolved threshold state: base value, selectivity level, and the derived
/// current threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalValueState {
    base: f64,
    selectivity: i32,
    current: f64,
}

impl CriticalValueState {
    /// Derive the current threshold from a base value and selectivity level.
    ///
    /// `current = max(MIN, base · (1 − pc)^max(0, −selectivity))`.
    pub fn new(base: f64, selectivity: i32) -> Self {
        let steps = (-selectivity).max(0);
        let current = (base * (1.0 - REDUCTION_FACTOR).powi(steps)).max(MIN_CRITICAL_VALUE);
        Self { base, selectivity, current }
    }

    /// Current acceptance threshold.
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Current selectivity level.
    pub fn selectivity(&self) -> i32 {
        self.selectivity
    }

    /// Base value the schedule started from.
    pub fn base(&self) -> f64 {
        self.base
    }

    /// Lower the threshold by one geometric step.
    ///
    /// Decrements the selectivity level and shrinks the current threshold by
    /// one more factor of `(1 − pc)`, floored at [`MIN_CRITICAL_VALUE`].
    /// Returns `false` once the floor has been reached (no further reduction
    /// is possible).
    pub fn reduce(&mut self) -> bool {
        if self.current <= MIN_CRITICAL_VALUE {
            return false;
        }
        self.selectivity -= 1;
        self.current = (self.current * (1.0 - REDUCTION_FACTOR)).max(MIN_CRITICAL_VALUE);
        true
    }
}

/// Validate scan bounds: a half-open window `[start, end)` over positions.
pub(crate) fn check_bounds(start: usize, end: usize) -> OutlierResult<()> {
    if start >= end {
        return Err(OutlierError::InvalidBounds { start, end });
    }
    Ok(())
}
