//! Signal snapshots and the composite regime score.
//!
//! The five input signals are a fixed schema: adding a sixth is a
//! deliberate schema change, not a runtime registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Weight of the URF composite risk signal in the regime score.
pub const WEIGHT_URF: f64 = 0.30;
/// Weight of the MSE meta-instability signal.
pub const WEIGHT_MSE: f64 = 0.25;
/// Weight of the predictive collapse risk signal.
pub const WEIGHT_PREDICTIVE: f64 = 0.20;
/// Weight of the cross-source consistency gap signal.
pub const WEIGHT_GAP: f64 = 0.15;
/// Weight of the inverted CSI continuity index.
pub const WEIGHT_CSI: f64 = 0.10;

/// The fixed set of input signals the governor consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Composite content-risk score.
    UrfCompositeRisk,
    /// Meta-instability measurement.
    MseMetaInstability,
    /// Predictive-collapse estimate.
    PredictiveCollapseRisk,
    /// Cross-source consistency gap.
    ConsistencyGap,
    /// Continuity index (higher is healthier).
    CsiContinuityIndex,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::UrfCompositeRisk => "urf_composite_risk",
            SignalKind::MseMetaInstability => "mse_meta_instability",
            SignalKind::PredictiveCollapseRisk => "predictive_collapse_risk",
            SignalKind::ConsistencyGap => "consistency_gap",
            SignalKind::CsiContinuityIndex => "csi_continuity_index",
        };
        f.write_str(name)
    }
}

/// Errors raised by signal validation.
///
/// Out-of-range inputs are a producer contract violation and are never
/// clamped silently.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    /// A signal value fell outside `[0, 1]` or was not finite.
    #[error("signal {signal} out of range: {value}")]
    OutOfRange { signal: SignalKind, value: f64 },
}

/// One timestamped reading of the five input signals.
///
/// All values are expected in `[0, 1]`; see [`SignalSnapshot::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    /// Wall-clock time the reading was produced (display only).
    pub taken_at: DateTime<Utc>,

    /// Composite content-risk score.
    pub urf_composite_risk: f64,

    /// Meta-instability measurement.
    pub mse_meta_instability: f64,

    /// Predictive-collapse estimate.
    pub predictive_collapse_risk: f64,

    /// Cross-source consistency gap.
    pub consistency_gap: f64,

    /// Continuity index; higher values indicate healthier continuity.
    pub csi_continuity_index: f64,
}

impl SignalSnapshot {
    /// Snapshot with every signal at its calm extreme, stamped now.
    pub fn quiescent() -> Self {
        Self {
            taken_at: Utc::now(),
            urf_composite_risk: 0.0,
            mse_meta_instability: 0.0,
            predictive_collapse_risk: 0.0,
            consistency_gap: 0.0,
            csi_continuity_index: 1.0,
        }
    }

    /// Check every signal against the `[0, 1]` contract.
    ///
    /// Returns the first violating signal; values are never clamped.
    pub fn validate(&self) -> Result<(), SignalError> {
        for (signal, value) in self.readings() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(SignalError::OutOfRange { signal, value });
            }
        }
        Ok(())
    }

    /// The five readings, paired with their signal kind.
    pub fn readings(&self) -> [(SignalKind, f64); 5] {
        [
            (SignalKind::UrfCompositeRisk, self.urf_composite_risk),
            (SignalKind::MseMetaInstability, self.mse_meta_instability),
            (
                SignalKind::PredictiveCollapseRisk,
                self.predictive_collapse_risk,
            ),
            (SignalKind::ConsistencyGap, self.consistency_gap),
            (SignalKind::CsiContinuityIndex, self.csi_continuity_index),
        ]
    }
}

/// Weighted composite score derived from a [`SignalSnapshot`].
///
/// In-range inputs always produce a score in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct RegimeScore(f64);

impl RegimeScore {
    /// Compute the canonical weighted score, validating inputs first.
    pub fn from_snapshot(snapshot: &SignalSnapshot) -> Result<Self, SignalError> {
        snapshot.validate()?;
        let score = WEIGHT_URF * snapshot.urf_composite_risk
            + WEIGHT_MSE * snapshot.mse_meta_instability
            + WEIGHT_PREDICTIVE * snapshot.predictive_collapse_risk
            + WEIGHT_GAP * snapshot.consistency_gap
            + WEIGHT_CSI * (1.0 - snapshot.csi_continuity_index);
        Ok(Self(score.clamp(0.0, 1.0)))
    }

    /// Wrap an already-computed score. Intended for tests and replay.
    pub fn from_value(value: f64) -> Self {
        Self(value)
    }

    /// The raw score value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for RegimeScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn snapshot(urf: f64, mse: f64, pred: f64, gap: f64, csi: f64) -> SignalSnapshot {
        SignalSnapshot {
            taken_at: Utc::now(),
            urf_composite_risk: urf,
            mse_meta_instability: mse,
            predictive_collapse_risk: pred,
            consistency_gap: gap,
            csi_continuity_index: csi,
        }
    }

    #[test]
    fn calm_snapshot_scores_low() {
        let score = RegimeScore::from_snapshot(&snapshot(0.12, 0.02, 0.08, 0.04, 0.96)).unwrap();
        assert!((score.value() - 0.067).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_signal_is_rejected_not_clamped() {
        let err = RegimeScore::from_snapshot(&snapshot(1.2, 0.0, 0.0, 0.0, 1.0)).unwrap_err();
        assert_eq!(
            err,
            SignalError::OutOfRange {
                signal: SignalKind::UrfCompositeRisk,
                value: 1.2,
            }
        );
    }

    #[test]
    fn nan_signal_is_rejected() {
        let result = RegimeScore::from_snapshot(&snapshot(0.1, f64::NAN, 0.1, 0.1, 0.9));
        assert!(result.is_err());
    }

    #[test]
    fn low_continuity_raises_the_score() {
        let healthy = RegimeScore::from_snapshot(&snapshot(0.2, 0.2, 0.2, 0.2, 1.0)).unwrap();
        let broken = RegimeScore::from_snapshot(&snapshot(0.2, 0.2, 0.2, 0.2, 0.0)).unwrap();
        assert!(broken.value() > healthy.value());
    }

    proptest! {
        #[test]
        fn in_range_inputs_stay_in_unit_interval(
            urf in 0.0f64..=1.0,
            mse in 0.0f64..=1.0,
            pred in 0.0f64..=1.0,
            gap in 0.0f64..=1.0,
            csi in 0.0f64..=1.0,
        ) {
            let score = RegimeScore::from_snapshot(&snapshot(urf, mse, pred, gap, csi)).unwrap();
            prop_assert!((0.0..=1.0).contains(&score.value()));
        }
    }
}
