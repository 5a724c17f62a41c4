//! outliers — automatic detection of significant outlier regressors.
//!
//! Purpose
//! -------
//! Implement the stepwise forward/backward search that extends a regression
//! model with ARMA errors by outlier regressors (additive spikes, level
//! shifts, transitory changes, seasonal anomalies) and retains only those
//! whose standardized statistic survives the sample-size-dependent
//! acceptance threshold.
//!
//! Key behaviors
//! -------------
//! - [`OutlierDetection`]: the bounded iterative loop with its oscillation
//!   guard, exclusion bookkeeping, and final full-re-estimation sweep.
//! - [`OutlierFactory`]: shape generators and the conventional presets.
//! - [`CriticalValueState`] / [`AsymptoticResolver`]: the geometric
//!   threshold schedule with its ln(n)-based default base value.
//! - Traits at the estimation seam ([`RegressionModel`],
//!   [`OutlierEstimator`], [`CandidateScanner`]) so the loop stays agnostic
//!   of the concrete ARMA machinery.
//!
//! Conventions
//! -----------
//! - Outlier types are addressed by their index in the configured factory
//!   list; accepted outliers are appended after the model's fixed
//!   regressors, in acceptance order.
//! - Fallible operations return [`OutlierResult`]; `process()` converts any
//!   failure into a `false` return at the public boundary.
//!
//! Testing notes
//! -------------
//! - The loop is unit-tested against scripted estimators and scanners
//!   (control flow, caps, hooks); the integration suite runs it end to end
//!   over an OLS estimation harness.

pub mod critical_value;
pub mod detection;
pub mod errors;
pub mod factories;
pub mod traits;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::critical_value::{
    AsymptoticResolver, CriticalValueResolver, CriticalValueState, MIN_CRITICAL_VALUE,
    REDUCTION_FACTOR,
};
pub use self::detection::{MAX_OUTLIERS, MAX_ROUNDS, OutlierCandidate, OutlierDetection};
pub use self::errors::{OutlierError, OutlierResult};
pub use self::factories::{
    OutlierFactory, TRANSITORY_DECAY, all_factories, default_factories, periodic_factories,
};
pub use self::traits::{CandidateScanner, Estimation, OutlierEstimator, RegressionModel};
