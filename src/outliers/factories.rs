//! Outlier regressor shapes and factory presets.
//!
//! Each factory materializes the regression column of one parametric outlier
//! shape anchored at a time index: a one-time spike (AO), a permanent step
//! (LS), a decaying transient (TC), or a recurring seasonal anomaly (SO).
//! The detection loop indexes shapes by their position in the configured
//! factory list; presets mirror the conventional sets.

use ndarray::Array1;

/// Decay rate of the transitory-change shape in the "all" preset.
pub const TRANSITORY_DECAY: f64 = 0.7;

/// Generator for one outlier regressor shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlierFactory {
    /// One-time spike: 1 at the anchor, 0 elsewhere.
    Additive,
    /// Permanent step change. The zero-ended variant is −1 strictly before
    /// the anchor and 0 from the anchor on, so the column vanishes at the
    /// end of the sample; the plain variant is the usual 0/1 step.
    LevelShift { zero_ended: bool },
    /// Decaying transient: `decay^(t − anchor)` from the anchor on.
    TransitoryChange { decay: f64 },
    /// Recurring seasonal anomaly at the given period: from the anchor on,
    /// 1 on indices congruent to the anchor and −1/(period − 1) elsewhere,
    /// so a full cycle sums to zero. Requires `period ≥ 2`.
    Periodic { period: usize },
}

impl OutlierFactory {
    /// Conventional two-letter code of the shape.
    pub fn code(&self) -> &'static str {
        match self {
            OutlierFactory::Additive => "AO",
            OutlierFactory::LevelShift { .. } => "LS",
            OutlierFactory::TransitoryChange { .. } => "TC",
            OutlierFactory::Periodic { .. } => "SO",
        }
    }

    /// Materialize the regressor column of length `length` anchored at
    /// `position`.
    ///
    /// # Panics
    /// - For `Periodic` with `period < 2`; factories are configuration
    ///   values, so this is a caller error and fails loudly.
    pub fn column(&self, length: usize, position: usize) -> Array1<f64> {
        let mut column = Array1::<f64>::zeros(length);
        match *self {
            OutlierFactory::Additive => {
                if position < length {
                    column[position] = 1.0;
                }
            }
            OutlierFactory::LevelShift { zero_ended } => {
                if zero_ended {
                    for t in 0..position.min(length) {
                        column[t] = -1.0;
                    }
                } else {
                    for t in position..length {
                        column[t] = 1.0;
                    }
                }
            }
            OutlierFactory::TransitoryChange { decay } => {
                let mut value = 1.0;
                for t in position..length {
                    column[t] = value;
                    value *= decay;
                }
            }
            OutlierFactory::Periodic { period } => {
                assert!(period >= 2, "periodic outlier requires period >= 2");
                let off = -1.0 / (period as f64 - 1.0);
                for t in position..length {
                    column[t] = if (t - position) % period == 0 { 1.0 } else { off };
                }
            }
        }
        column
    }
}

/// Default factory set: additive outlier and zero-ended level shift.
pub fn default_factories() -> Vec<OutlierFactory> {
    vec![OutlierFactory::Additive, OutlierFactory::LevelShift { zero_ended: true }]
}

/// Extended set: the default plus a transitory change with decay
/// [`TRANSITORY_DECAY`].
pub fn all_factories() -> Vec<OutlierFactory> {
    let mut factories = default_factories();
    factories.push(OutlierFactory::TransitoryChange { decay: TRANSITORY_DECAY });
    factories
}

/// Periodic set: the extended set plus a seasonal outlier at `period`.
///
/// # Panics
/// - When `period < 2`.
pub fn periodic_factories(period: usize) -> Vec<OutlierFactory> {
    assert!(period >= 2, "periodic outlier requires period >= 2");
    let mut factories = all_factories();
    factories.push(OutlierFactory::Periodic { period });
    factories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Verify the additive and zero-ended level-shift column shapes.
    //
    // Given
    // -----
    // - Length 6, anchor 3.
    //
    // Expect
    // ------
    // - AO: [0, 0, 0, 1, 0, 0].
    // - Zero-ended LS: [−1, −1, −1, 0, 0, 0].
    // - Plain LS: [0, 0, 0, 1, 1, 1].
    fn additive_and_level_shift_shapes() {
        let ao = OutlierFactory::Additive.column(6, 3);
        assert_eq!(ao.to_vec(), vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let ls = OutlierFactory::LevelShift { zero_ended: true }.column(6, 3);
        assert_eq!(ls.to_vec(), vec![-1.0, -1.0, -1.0, 0.0, 0.0, 0.0]);
        let step = OutlierFactory::LevelShift { zero_ended: false }.column(6, 3);
        assert_eq!(step.to_vec(), vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    // Purpose
    // -------
    // Verify the transitory-change decay profile and the zero prefix.
    //
    // Given
    // -----
    // - Length 5, anchor 2, decay 0.7.
    //
    // Expect
    // ------
    // - [0, 0, 1, 0.7, 0.49].
    fn transitory_change_decays_from_anchor() {
        let tc = OutlierFactory::TransitoryChange { decay: TRANSITORY_DECAY }.column(5, 2);
        assert_eq!(tc[0], 0.0);
        assert_eq!(tc[1], 0.0);
        assert!((tc[2] - 1.0).abs() < 1e-12);
        assert!((tc[3] - 0.7).abs() < 1e-12);
        assert!((tc[4] - 0.49).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify that the periodic shape sums to zero over each full cycle.
    //
    // Given
    // -----
    // - Length 9, anchor 1, period 4.
    //
    // Expect
    // ------
    // - 1 at indices 1, 5; −1/3 at the other post-anchor indices; the
    //   first full cycle sums to zero.
    fn periodic_shape_balances_each_cycle() {
        let so = OutlierFactory::Periodic { period: 4 }.column(9, 1);
        assert_eq!(so[0], 0.0);
        assert!((so[1] - 1.0).abs() < 1e-12);
        assert!((so[5] - 1.0).abs() < 1e-12);
        let off = -1.0 / 3.0;
        for t in [2, 3, 4, 6, 7, 8] {
            assert!((so[t] - off).abs() < 1e-12);
        }
        let cycle: f64 = (1..5).map(|t| so[t]).sum();
        assert!(cycle.abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Check preset composition and type ordering, which the detection loop
    // relies on for type indices.
    //
    // Given
    // -----
    // - The default, "all", and periodic presets.
    //
    // Expect
    // ------
    // - [AO, LS], [AO, LS, TC], [AO, LS, TC, SO] with TC decay 0.7.
    fn presets_compose_in_order() {
        let default = default_factories();
        assert_eq!(default.len(), 2);
        assert_eq!(default[0].code(), "AO");
        assert_eq!(default[1].code(), "LS");

        let all = all_factories();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2], OutlierFactory::TransitoryChange { decay: 0.7 });

        let periodic = periodic_factories(12);
        assert_eq!(periodic.len(), 4);
        assert_eq!(periodic[3], OutlierFactory::Periodic { period: 12 });
    }
}
